use std::time::Duration;

use cadence_domain::ModelId;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const GENERATE_PATH: &str = "/api/generate";

/// Connection settings of the inference service, fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
    base_url: String,
    model: ModelId,
    timeout: Duration,
}

impl ProviderConfig {
    /// Trailing `/` are stripped from `base_url` so the endpoint path can be
    /// appended directly.
    pub fn new(base_url: impl AsRef<str>, model: impl Into<ModelId>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &ModelId {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full URL of the generation endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{GENERATE_PATH}", self.base_url)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT)
    }
}
