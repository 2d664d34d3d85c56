use cadence_domain::{DialogueRequest, DialogueTurn, Descriptors};
use derive_setters::Setters;

const PREAMBLE: &str = "You are the in-game for an interactive music-driven emotion responder, analyses all chord progressions and given the response of the whole song.";
const REACT_INSTRUCTION: &str = "Craft a reacting to the player's latest key.";
const DESCRIPTORS_HEADER: &str = "Audio descriptors:";
const NO_DESCRIPTORS: &str = "- No detailed descriptors";
const DIALOGUE_HEADER: &str = "Previous dialogue (most recent last):";
const CLOSING_INSTRUCTION: &str = "Respond with empathetic, emotionally supportive words, as if from a deeply attentive partner. (min 2 sentences).";

/// Renders the dialogue prompt sent to the inference service.
///
/// Rendering is pure and deterministic: identical inputs always produce the
/// same text. Sections appear in a fixed order: preamble, reacting
/// instruction, key line, predicted emotion, descriptor block, previous
/// dialogue and the closing instruction.
#[derive(Clone, Debug, Default, Setters)]
#[setters(into)]
pub struct PromptBuilder {
    /// Emit the key line twice, the first time unconditionally with `None`
    /// standing in for a missing key. Only needed to reproduce prompts
    /// recorded from older builds byte for byte.
    legacy_key_line: bool,
}

impl PromptBuilder {
    /// Builds the prompt text.
    ///
    /// The chord label is part of the contract but the template addresses
    /// the song as a whole, so it is not interpolated.
    pub fn build(
        &self,
        emotion: &str,
        _chord: &str,
        key: Option<&str>,
        descriptors: Option<&Descriptors>,
        history: Option<&[DialogueTurn]>,
    ) -> String {
        let key = key.filter(|key| !key.is_empty());

        let mut lines: Vec<String> = vec![PREAMBLE.to_string(), REACT_INSTRUCTION.to_string()];

        if self.legacy_key_line {
            lines.push(format!("Detected key: {}.", key.unwrap_or("None")));
        }
        if let Some(key) = key {
            lines.push(format!("Detected key: {key}."));
        }

        lines.push(format!("Predicted emotion: {emotion}."));
        lines.push(DESCRIPTORS_HEADER.to_string());
        lines.push(descriptor_block(descriptors));
        lines.push(DIALOGUE_HEADER.to_string());
        lines.push(dialogue_block(history.unwrap_or_default()));
        lines.push(CLOSING_INSTRUCTION.to_string());

        lines.join("\n")
    }

    pub fn build_request(&self, request: &DialogueRequest) -> String {
        self.build(
            &request.emotion,
            &request.chord,
            request.key.as_deref(),
            request.descriptors.as_ref(),
            Some(&request.history),
        )
    }
}

/// Builds the prompt with the default [`PromptBuilder`].
pub fn build_prompt(
    emotion: &str,
    chord: &str,
    key: Option<&str>,
    descriptors: Option<&Descriptors>,
    history: Option<&[DialogueTurn]>,
) -> String {
    PromptBuilder::default().build(emotion, chord, key, descriptors, history)
}

fn descriptor_block(descriptors: Option<&Descriptors>) -> String {
    match descriptors.filter(|descriptors| !descriptors.is_empty()) {
        Some(descriptors) => descriptors
            .iter()
            .map(|(name, value)| format!("- {name}: {value}"))
            .collect::<Vec<_>>()
            .join("\n"),
        None => NO_DESCRIPTORS.to_string(),
    }
}

// An empty history renders as an empty block, not a placeholder.
fn dialogue_block(history: &[DialogueTurn]) -> String {
    history
        .iter()
        .map(|turn| {
            format!(
                "{}: {}",
                title_case(turn.role().as_str()),
                turn.content()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Upper-cases every letter that follows a non-letter and lower-cases the
/// rest. Only letter case changes: `player2` stays `Player2`, `gameMaster`
/// becomes `Gamemaster`, `dj_bot` becomes `Dj_Bot`.
fn title_case(text: &str) -> String {
    let mut previous_is_letter = false;
    text.chars()
        .flat_map(|c| {
            let letter = c.is_alphabetic();
            let cased: Vec<char> = if letter && previous_is_letter {
                c.to_lowercase().collect()
            } else {
                c.to_uppercase().collect()
            };
            previous_is_letter = letter;
            cased
        })
        .collect()
}
