//! Chat with a large language model from the terminal.

#[macro_use]
extern crate tracing;

use std::future::pending;
use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use llm_chat::{ProviderConfig, ProviderKind, Repl};
use tokio::io::BufReader;

#[derive(Debug, Parser)]
#[command(
    name = "llm-chat",
    version,
    about = "Chat with a large language model from the terminal"
)]
struct Args {
    /// Provider to talk to: openai, gemini, ollama or openrouter.
    #[arg(
        long,
        env = "LLM_CHAT_PROVIDER",
        default_value_t = ProviderKind::OpenAI
    )]
    provider: ProviderKind,

    /// Model identifier, or one of the provider's aliases.
    #[arg(long, env = "LLM_CHAT_MODEL")]
    model: Option<String>,

    /// Base URL of the provider's API.
    #[arg(long, env = "LLM_CHAT_BASE_URL")]
    base_url: Option<String>,

    /// Sampling temperature.
    #[arg(long, env = "LLM_CHAT_TEMPERATURE")]
    temperature: Option<f32>,

    /// Nucleus sampling threshold.
    #[arg(long, env = "LLM_CHAT_TOP_P")]
    top_p: Option<f32>,

    /// Top-k sampling cutoff (Gemini and Ollama).
    #[arg(long, env = "LLM_CHAT_TOP_K")]
    top_k: Option<u32>,

    /// Upper bound on the reply length, in tokens.
    #[arg(long, env = "LLM_CHAT_MAX_TOKENS")]
    max_tokens: Option<u32>,

    /// System turn the conversation starts with. Pass an empty string to
    /// start without one.
    #[arg(long, env = "LLM_CHAT_SYSTEM_PROMPT")]
    system_prompt: Option<String>,

    /// Stream the reply as it is generated (OpenAI and OpenRouter).
    #[arg(long, env = "LLM_CHAT_STREAM")]
    stream: bool,
}

impl Args {
    fn into_config(self) -> ProviderConfig {
        let mut config = ProviderConfig::from_env(self.provider);
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(base_url) = self.base_url {
            config.endpoint = base_url;
        }
        let sampling = &mut config.sampling;
        sampling.temperature = self.temperature.or(sampling.temperature);
        sampling.top_p = self.top_p.or(sampling.top_p);
        sampling.top_k = self.top_k.or(sampling.top_k);
        sampling.max_tokens = self.max_tokens.or(sampling.max_tokens);
        if let Some(prompt) = self.system_prompt {
            config.system_prompt =
                (!prompt.trim().is_empty()).then_some(prompt);
        }
        config.stream = self.stream;
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is fine, the variables may be set already.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Args::parse().into_config();
    debug!("starting with {config:?}");

    let client = match config.connect() {
        Ok(client) => client,
        Err(err) => {
            println!("Error: {err}");
            if let Some(hint) = err.hint() {
                println!("{hint}");
            }
            return ExitCode::FAILURE;
        }
    };
    if !config.check_connection().await {
        warn!("cannot reach {} at {}", config.kind, config.endpoint);
        println!(
            "Warning: cannot connect to {} at {}. Please ensure it is running.",
            config.kind.display_name(),
            config.endpoint
        );
    }

    let terminal = io::stdout().is_terminal();
    let input = BufReader::new(tokio::io::stdin());
    let mut repl = Repl::new(client, config.kind, input, io::stdout())
        .with_terminal(terminal)
        .with_interrupt(ctrl_c());
    if let Err(err) = repl.run().await {
        error!("terminal i/o failed: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // Without a handler the default action still ends the process.
        warn!("cannot listen for Ctrl+C: {err}");
        pending::<()>().await;
    }
}
