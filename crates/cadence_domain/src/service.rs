use crate::{DialogueRequest, DialogueTurn};

/// Produces the next in-character turn for a set of musical features.
#[async_trait::async_trait]
pub trait DialogueService: Send + Sync {
    async fn generate(&self, request: &DialogueRequest) -> anyhow::Result<DialogueTurn>;
}
