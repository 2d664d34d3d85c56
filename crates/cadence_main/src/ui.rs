use std::sync::Arc;

use anyhow::{Context as _, Result};
use cadence_app::Session;
use cadence_config::InferenceConfig;
use cadence_domain::{Analysis, DialogueRequest, DialogueService, DialogueTurn};
use cadence_prompt::PromptBuilder;
use cadence_provider::{OllamaClient, ProviderConfig};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, warn};

use crate::{Cli, Command, ReplyArgs};

pub struct UI {
    cli: Cli,
    client: OllamaClient,
}

impl UI {
    /// Resolves the configuration (file, environment, then flags) and
    /// prepares the inference client.
    pub fn init(cli: Cli) -> Result<Self> {
        let config = InferenceConfig::load(cli.config.as_deref())
            .context("Failed to load inference configuration")?;
        let provider = provider_config(&cli, config);
        debug!(endpoint = %provider.endpoint(), model = %provider.model(), "Resolved inference endpoint");

        let client = OllamaClient::new(provider)?
            .with_prompt_builder(PromptBuilder::default().legacy_key_line(cli.legacy_key_line));

        Ok(Self { cli, client })
    }

    pub async fn run(self) -> Result<()> {
        match &self.cli.command {
            Command::Reply(args) => self.reply(args).await,
            Command::Session { history_limit } => self.session(*history_limit).await,
        }
    }

    async fn reply(&self, args: &ReplyArgs) -> Result<()> {
        let analysis = match &args.analysis {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read analysis {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse analysis {}", path.display()))?
            }
            None => Analysis::default(),
        };
        let request = request_for(&analysis, args);

        if args.print_prompt {
            println!("{}", self.client.prompt_builder().build_request(&request));
            return Ok(());
        }

        println!("{}", summary(&analysis, &request));
        let turn = self.client.generate(&request).await?;
        print_turn(&turn);
        Ok(())
    }

    async fn session(&self, history_limit: Option<usize>) -> Result<()> {
        let session = Session::new(Arc::new(self.client.clone()));
        let session = match history_limit {
            Some(limit) => session.history_limit(limit),
            None => session,
        };

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let analysis: Analysis = match serde_json::from_str(line) {
                Ok(analysis) => analysis,
                Err(e) => {
                    warn!(error = %e, "Skipping line that is not an analysis document");
                    continue;
                }
            };

            println!("{}", summary(&analysis, &DialogueRequest::from(&analysis)));
            match session.respond(&analysis).await {
                Ok(turn) => print_turn(&turn),
                Err(e) => error!(error = ?e, "Dialogue exchange failed"),
            }
        }

        Ok(())
    }
}

/// Flags take precedence over the configuration sources.
fn provider_config(cli: &Cli, config: InferenceConfig) -> ProviderConfig {
    let host = cli.host.clone().unwrap_or(config.host);
    let model = cli.model.clone().unwrap_or(config.model);
    let timeout = cli.timeout.unwrap_or(config.timeout);
    ProviderConfig::new(host, model, std::time::Duration::from_secs(timeout))
}

fn request_for(analysis: &Analysis, args: &ReplyArgs) -> DialogueRequest {
    let mut request = DialogueRequest::from(analysis);
    if let Some(emotion) = &args.emotion {
        request.emotion = emotion.clone();
    }
    if let Some(chord) = &args.chord {
        request.chord = chord.clone();
    }
    if let Some(key) = &args.key {
        request.key = Some(key.clone());
    }
    if let Some(descriptors) = args.descriptors() {
        request.descriptors = Some(descriptors);
    }
    request
}

fn summary(analysis: &Analysis, request: &DialogueRequest) -> String {
    let emotion = match &analysis.emotion {
        Some(emotion) if emotion.label == request.emotion => {
            format!("{} ({:.2})", request.emotion, emotion.confidence)
        }
        _ => request.emotion.clone(),
    };
    let mut summary = format!(
        "{} {}  {} {}  {} {}",
        "Chord".bold(),
        request.chord,
        "Key".bold(),
        request.key.as_deref().unwrap_or(cadence_domain::UNKNOWN_LABEL),
        "Emotion".bold(),
        emotion
    );
    if let Some(progression) = analysis.progression() {
        summary.push_str(&format!("\n{} {}", "Progression".bold(), progression));
    }
    summary
}

fn print_turn(turn: &DialogueTurn) {
    println!("{}", turn.content().green());
}
