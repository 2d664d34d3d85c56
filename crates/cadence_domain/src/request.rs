use derive_setters::Setters;
use serde::{Deserialize, Serialize};

use crate::{Analysis, DialogueTurn, Descriptors};

/// Inputs for one dialogue exchange: the detected musical features plus the
/// conversation so far (oldest turn first).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Setters)]
#[setters(into, strip_option)]
pub struct DialogueRequest {
    pub emotion: String,
    pub chord: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptors: Option<Descriptors>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<DialogueTurn>,
}

impl DialogueRequest {
    pub fn new(emotion: impl Into<String>, chord: impl Into<String>) -> Self {
        Self { emotion: emotion.into(), chord: chord.into(), ..Default::default() }
    }
}

impl From<&Analysis> for DialogueRequest {
    /// Missing chord and emotion fall back to their display labels; a missing
    /// key stays absent so the prompt omits the key line.
    fn from(analysis: &Analysis) -> Self {
        DialogueRequest {
            emotion: analysis.emotion_label().to_string(),
            chord: analysis.chord_label().to_string(),
            key: analysis.key.as_ref().map(|key| key.label.clone()),
            descriptors: analysis.descriptors.clone(),
            history: Vec::new(),
        }
    }
}
