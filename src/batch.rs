//! Batch sessions.
//!
//! One session corresponds to one "Generate" action: a fixed, ordered set
//! of scene requests, the shared background-removal flag, and the batch
//! token that guards store updates. A new session fully replaces the
//! previous one; nothing is carried across batches.

use crate::catalog::{preset_by_id, MAX_BATCH_SIZE, PRESET_SCENES};
use crate::error::GenerationError;
use crate::scene::{custom_variants, SceneRequest, SceneSource};
use crate::store::BatchToken;

/// What the user asked to generate.
#[derive(Debug, Clone)]
pub enum BatchSelection {
    /// Chosen preset scene ids. Expanded in catalog order.
    Presets(Vec<String>),
    /// Free-text theme. Always expands to the full set of angle variants.
    Custom(String),
}

/// One generate action: requests, shared flags, and the guarding token.
#[derive(Debug)]
pub struct BatchSession {
    token: BatchToken,
    requests: Vec<SceneRequest>,
    remove_background: bool,
    custom_theme: Option<String>,
}

impl BatchSession {
    pub fn new(
        selection: BatchSelection,
        remove_background: bool,
    ) -> Result<Self, GenerationError> {
        let (requests, custom_theme) = match selection {
            BatchSelection::Presets(ids) => {
                for id in &ids {
                    if preset_by_id(id).is_none() {
                        return Err(GenerationError::Configuration(format!(
                            "unknown scene id: {id}"
                        )));
                    }
                }
                // Catalog order, regardless of selection order.
                let requests: Vec<SceneRequest> = PRESET_SCENES
                    .iter()
                    .filter(|scene| ids.iter().any(|id| id == scene.id))
                    .filter_map(|scene| SceneSource::Preset(scene.id.to_string()).resolve())
                    .collect();
                (requests, None)
            }
            BatchSelection::Custom(theme) => {
                let theme = theme.trim().to_string();
                if theme.is_empty() {
                    return Err(GenerationError::Configuration(
                        "custom theme text is empty".to_string(),
                    ));
                }
                let requests = custom_variants(&theme);
                (requests, Some(theme))
            }
        };

        if requests.is_empty() {
            return Err(GenerationError::Configuration(
                "batch contains no scenes".to_string(),
            ));
        }
        if requests.len() > MAX_BATCH_SIZE {
            return Err(GenerationError::Configuration(format!(
                "batch of {} scenes exceeds the limit of {MAX_BATCH_SIZE}",
                requests.len()
            )));
        }

        Ok(Self {
            token: BatchToken::next(),
            requests,
            remove_background,
            custom_theme,
        })
    }

    pub fn token(&self) -> BatchToken {
        self.token
    }

    pub fn requests(&self) -> &[SceneRequest] {
        &self.requests
    }

    pub fn remove_background(&self) -> bool {
        self.remove_background
    }

    pub fn custom_theme(&self) -> Option<&str> {
        self.custom_theme.as_deref()
    }

    /// Rebuild the scene request for a job id, for single-item retry.
    /// Works from the id alone plus the session's stored theme text.
    pub fn reconstruct_scene(&self, job_id: &str) -> Option<SceneRequest> {
        SceneSource::from_job_id(job_id, self.custom_theme())?.resolve()
    }
}
