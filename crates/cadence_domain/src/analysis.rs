use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Descriptors;

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const UNDETERMINED_LABEL: &str = "Undetermined";

/// A single labelled prediction (chord or key).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmotionPrediction {
    pub label: String,
    pub confidence: f64,
    #[serde(default)]
    pub probabilities: BTreeMap<String, f64>,
}

/// A chord detected at a point in time, in seconds from the start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    pub time_secs: f64,
    pub chord: String,
}

/// Musical features produced by the analysis pipeline for one submission.
///
/// Every field is optional because the pipeline may fail to detect any of
/// them; the accessors fall back to display labels.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub chord: Option<Prediction>,
    #[serde(default)]
    pub key: Option<Prediction>,
    #[serde(default)]
    pub emotion: Option<EmotionPrediction>,
    #[serde(default)]
    pub descriptors: Option<Descriptors>,
    #[serde(default)]
    pub chord_sequence: Vec<ChordEvent>,
}

impl Analysis {
    pub fn chord_label(&self) -> &str {
        self.chord.as_ref().map_or(UNKNOWN_LABEL, |p| p.label.as_str())
    }

    pub fn key_label(&self) -> &str {
        self.key.as_ref().map_or(UNKNOWN_LABEL, |p| p.label.as_str())
    }

    pub fn emotion_label(&self) -> &str {
        self.emotion
            .as_ref()
            .map_or(UNDETERMINED_LABEL, |p| p.label.as_str())
    }

    /// Renders the chord progression as `0.0s C, 2.5s G`.
    pub fn progression(&self) -> Option<String> {
        if self.chord_sequence.is_empty() {
            return None;
        }
        Some(
            self.chord_sequence
                .iter()
                .map(|event| format!("{:.1}s {}", event.time_secs, event.chord))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}
