use std::path::PathBuf;

use anyhow::{Context as _, Result};
use cadence_domain::{DescriptorValue, Descriptors};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version = env!("CARGO_PKG_VERSION"), about = "Talk back to the music you play")]
pub struct Cli {
    /// Configuration file (TOML or JSON) with `host`, `model` and `timeout`.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Base address of the inference service. Overrides config and
    /// `OLLAMA_HOST`.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Model to generate with. Overrides config and `OLLAMA_MODEL`.
    #[arg(long, short = 'm', global = true)]
    pub model: Option<String>,

    /// Request timeout in seconds. Overrides config and `OLLAMA_TIMEOUT`.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Repeat the key line the way prompts from older builds did.
    #[arg(long, global = true, default_value_t = false)]
    pub legacy_key_line: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a single reply for one set of musical features.
    Reply(ReplyArgs),

    /// Read analysis documents (one JSON object per line) from stdin and
    /// reply to each, carrying the conversation forward.
    Session {
        /// Send only the most recent N turns with each prompt.
        #[arg(long)]
        history_limit: Option<usize>,
    },
}

#[derive(Args, Debug)]
pub struct ReplyArgs {
    /// Analysis document produced by the audio pipeline. Flags below
    /// override its labels.
    #[arg(long, short = 'a')]
    pub analysis: Option<PathBuf>,

    /// Detected emotion label.
    #[arg(long, short = 'e')]
    pub emotion: Option<String>,

    /// Detected chord label.
    #[arg(long)]
    pub chord: Option<String>,

    /// Detected key label.
    #[arg(long, short = 'k')]
    pub key: Option<String>,

    /// Audio descriptor as `name=value`; may be repeated.
    #[arg(long = "descriptor", short = 'd', value_parser = parse_descriptor)]
    pub descriptors: Vec<(String, DescriptorValue)>,

    /// Print the rendered prompt instead of calling the service.
    #[arg(long, default_value_t = false)]
    pub print_prompt: bool,
}

impl ReplyArgs {
    pub fn descriptors(&self) -> Option<Descriptors> {
        if self.descriptors.is_empty() {
            return None;
        }
        Some(self.descriptors.iter().cloned().collect())
    }
}

/// Parses `name=value`; numeric values become numbers, anything else text.
pub fn parse_descriptor(raw: &str) -> Result<(String, DescriptorValue)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("Descriptor '{raw}' must look like name=value"))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Descriptor '{raw}' has an empty name");
    }
    let Ok(value) = value.trim().parse::<DescriptorValue>();
    Ok((name.to_string(), value))
}
