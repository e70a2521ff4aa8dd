//! Scene requests and their sources.
//!
//! A scene comes either from the preset catalog or is synthesized from a
//! user-supplied theme crossed with one of the fixed camera-angle
//! variations. The job id encodes enough to reconstruct either variant
//! deterministically, which is what makes single-item retry possible after
//! the original batch state is gone.

use serde::{Deserialize, Serialize};

use crate::catalog::{preset_by_id, VARIATION_PROMPTS};

const CUSTOM_ID_PREFIX: &str = "custom-var-";

/// Immutable description of one requested scene variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRequest {
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub prompt_text: String,
}

/// Where a scene request came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneSource {
    /// A catalog preset, identified by its catalog id.
    Preset(String),
    /// One angle variant of a free-text theme.
    CustomVariant { base_text: String, angle_index: usize },
}

impl SceneSource {
    /// The job id this source produces. Stable across retries.
    pub fn job_id(&self) -> String {
        match self {
            SceneSource::Preset(id) => id.clone(),
            SceneSource::CustomVariant { angle_index, .. } => {
                format!("{CUSTOM_ID_PREFIX}{angle_index}")
            }
        }
    }

    /// Reconstruct a source from a job id alone.
    ///
    /// Custom-variant ids carry their angle index; the theme text must be
    /// supplied by the owning batch. Returns `None` for ids that name no
    /// preset and no valid variant index.
    pub fn from_job_id(job_id: &str, custom_theme: Option<&str>) -> Option<Self> {
        if let Some(index_text) = job_id.strip_prefix(CUSTOM_ID_PREFIX) {
            let angle_index: usize = index_text.parse().ok()?;
            if angle_index >= VARIATION_PROMPTS.len() {
                return None;
            }
            let base_text = custom_theme?.trim();
            if base_text.is_empty() {
                return None;
            }
            return Some(SceneSource::CustomVariant {
                base_text: base_text.to_string(),
                angle_index,
            });
        }
        preset_by_id(job_id).map(|scene| SceneSource::Preset(scene.id.to_string()))
    }

    /// Materialize the scene request this source describes.
    pub fn resolve(&self) -> Option<SceneRequest> {
        match self {
            SceneSource::Preset(id) => preset_by_id(id).map(|scene| SceneRequest {
                id: scene.id.to_string(),
                display_name: scene.name.to_string(),
                category: scene.category.to_string(),
                prompt_text: scene.prompt.to_string(),
            }),
            SceneSource::CustomVariant {
                base_text,
                angle_index,
            } => {
                let variation = VARIATION_PROMPTS.get(*angle_index)?;
                Some(SceneRequest {
                    id: self.job_id(),
                    display_name: format!("Custom Var {}", angle_index + 1),
                    category: "Custom".to_string(),
                    prompt_text: format!("{}. Camera/Angle: {}", base_text.trim(), variation),
                })
            }
        }
    }
}

/// Expand a custom theme into the full set of angle variants, in order.
pub fn custom_variants(theme: &str) -> Vec<SceneRequest> {
    (0..VARIATION_PROMPTS.len())
        .filter_map(|angle_index| {
            SceneSource::CustomVariant {
                base_text: theme.to_string(),
                angle_index,
            }
            .resolve()
        })
        .collect()
}
