use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Speaker tag attached to a [`DialogueTurn`].
///
/// The set is open: tags other than the well-known ones are kept verbatim in
/// [`Role::Other`] so history produced elsewhere round-trips unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize, fake::Dummy)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[display("system")]
    System,
    #[display("user")]
    User,
    #[display("assistant")]
    Assistant,
    #[display("{_0}")]
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(tag) => tag,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Other(tag) => tag,
            role => role.as_str().to_string(),
        }
    }
}

/// A single utterance in the conversation.
///
/// Turns are immutable once created; the fields are only reachable through
/// accessors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, fake::Dummy)]
pub struct DialogueTurn {
    role: Role,
    content: String,
}

impl DialogueTurn {
    pub fn new(role: impl Into<Role>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
