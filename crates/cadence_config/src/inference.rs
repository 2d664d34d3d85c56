use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ENV_PREFIX: &str = "OLLAMA";

/// Where the inference service lives and which model it should run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Setters)]
#[setters(into)]
pub struct InferenceConfig {
    /// Base address of the service, e.g. `http://localhost:11434`.
    pub host: String,
    /// Model identifier passed with every request.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl InferenceConfig {
    /// Loads the configuration from, in increasing order of precedence:
    /// 1. the defaults embedded from `env.json`
    /// 2. the optional file at `path` (format picked from its extension)
    /// 3. `OLLAMA_`-prefixed environment variables (`OLLAMA_HOST`,
    ///    `OLLAMA_MODEL`, `OLLAMA_TIMEOUT`)
    ///
    /// A `.env` file in the working directory, when present, is loaded into
    /// the process environment first.
    ///
    /// # Errors
    /// Returns an error when the file cannot be parsed or a value has the
    /// wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        if let Ok(dotenv) = dotenvy::dotenv() {
            debug!(path = %dotenv.display(), "Loaded .env file");
        }
        Self::from_sources(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn from_sources(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        const DEFAULT_CONFIG: &str = include_str!("../env.json");

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            DEFAULT_CONFIG,
            config::FileFormat::Json,
        ));

        if let Some(path) = path {
            debug!(path = %path.display(), "Reading inference config file");
            builder = builder.add_source(config::File::from(PathBuf::from(path)).required(true));
        }

        builder
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
