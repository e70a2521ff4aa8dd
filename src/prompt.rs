//! Prompt construction for mockup generation.
//!
//! `build_prompt` is a pure function of the scene description and the
//! background-removal flag. The instruction payload always carries the same
//! five policy blocks in the same order: product preservation, scene
//! handling, angle/composition, photographic realism, and the no-people
//! restriction.

/// Build the instruction payload sent alongside the product image.
///
/// Specific free-text descriptions are followed verbatim as the dominant
/// directive; short generic category descriptions fall back to the
/// product-aware environment map embedded in block 2. Camera-angle text in
/// the description is honored by block 3.
pub fn build_prompt(scene_description: &str, remove_background: bool) -> String {
    let background_policy = if remove_background {
        "- Only remove the background cleanly with perfect edge preservation."
    } else {
        "- Keep the product exactly as photographed; do not remove or repaint its background edges."
    };

    format!(
        r#"ROLE: Senior Commercial Product Photographer & Art Director for Global Brands.

TASK: Generate an ultra-realistic product mockup by compositing the INPUT PRODUCT into the SCENE described below.

INPUT DATA:
- Image: User provided product photo.
- Target Scene Context: "{scene_description}"

====================================================
1. PRODUCT PRESERVATION (CRITICAL)
====================================================
The uploaded product must remain 100% unchanged:
- No altering or redrawing of shape, geometry, colors, logo, labels, or textures.
- No warping, melting, stretching, repainting, or reinterpretation.
{background_policy}

The product in the output must be IDENTICAL to the uploaded image.

====================================================
2. SCENE & CONTEXT HANDLING
====================================================
INSTRUCTION: If the "Target Scene Context" above is a specific user description (e.g. "Christmas theme", "Neon city"), strictly follow that theme/mood.
If it is a generic preset or category description, use INTELLIGENT PRODUCT-AWARE SELECTION:

- Tech -> premium studio, modern desk, neon edges, minimal clean setups
- Cosmetics -> marble counter, bathroom shelf, pastel soft-light backgrounds
- Supplements -> gym shelf, clean white studio, lifestyle health settings
- Food/drink -> kitchen surface, wooden table, bright daylight
- Home decor -> interior lifestyle scenes, soft sunlight, warm tones
- Fashion/accessories -> minimal lifestyle, gradient backgrounds, faceless model torsos

Never place the product in an unrelated environment.

====================================================
3. ANGLE & COMPOSITION
====================================================
The prompt may include specific camera angle instructions (e.g., "Front view", "Top down").
- ADHERE to these angle instructions strictly to create variety across the batch.
- Ensure the composition follows professional photography standards (Rule of Thirds, Balance).

====================================================
4. REAL PHOTOGRAPHY REQUIREMENTS
====================================================
All outputs must look like REAL camera photographs using:
- Sony A7R IV / Canon EOS R5 look
- 50mm or 85mm commercial lenses
- Soft diffused studio lighting
- Perfect color accuracy
- Natural shadows under the product
- Subtle realistic reflections
- Correct perspective and geometry
- High-resolution, noise-free, crisp images

Avoid: AI artifacts, Warped logos, Unrealistic reflections, Over/under-exposure.

====================================================
5. NO FACES, NO PEOPLE, NO CELEBRITIES
====================================================
Strictly prohibit: Human faces, Identifiable individuals, Celebrity likeness.
Allowed: Faceless mannequins, Hands-only holding the product, Torso silhouettes without identity.

OUTPUT: A single, high-resolution, photorealistic JPEG/PNG representation.
"#
    )
}
