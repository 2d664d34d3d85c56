use std::sync::Arc;

use anyhow::Result;
use cadence_domain::{Analysis, DialogueRequest, DialogueService, DialogueTurn};
use tokio::sync::Mutex;
use tracing::info;

/// An in-process conversation with the responder.
///
/// Every analysed submission produces one assistant turn, which is appended
/// to the history and fed back into the next prompt. History lives only as
/// long as the session.
pub struct Session<S> {
    service: Arc<S>,
    history: Mutex<Vec<DialogueTurn>>,
    history_limit: Option<usize>,
}

impl<S: DialogueService> Session<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service, history: Mutex::new(Vec::new()), history_limit: None }
    }

    /// Only the most recent `limit` turns are sent with each prompt.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Generates the reply to an analysed submission and records it.
    ///
    /// The prompt carries the history as it was when the call started; the
    /// lock is not held while the service answers, so turns pushed meanwhile
    /// land before the reply. A failed exchange leaves the history untouched.
    pub async fn respond(&self, analysis: &Analysis) -> Result<DialogueTurn> {
        let window = {
            let history = self.history.lock().await;
            let start = match self.history_limit {
                Some(limit) => history.len().saturating_sub(limit),
                None => 0,
            };
            history[start..].to_vec()
        };
        let request = DialogueRequest::from(analysis).history(window);

        let turn = self.service.generate(&request).await?;

        let mut history = self.history.lock().await;
        history.push(turn.clone());
        info!(
            chord = analysis.chord_label(),
            emotion = analysis.emotion_label(),
            turns = history.len(),
            "Recorded dialogue turn"
        );

        Ok(turn)
    }

    /// Records a turn that did not come from the service, e.g. a player line.
    pub async fn push(&self, turn: DialogueTurn) {
        self.history.lock().await.push(turn);
    }

    pub async fn history(&self) -> Vec<DialogueTurn> {
        self.history.lock().await.clone()
    }

    pub async fn reset(&self) {
        self.history.lock().await.clear();
    }
}
