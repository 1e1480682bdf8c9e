//! wasm-eval CLI entry point.
//!
//! Runs a single `EVALWASM` invocation and prints the reply the way
//! `redis-cli` would.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use wasm_eval_command::EvalWasm;
use wasm_eval_common::{ArgumentPolicy, ConfigFile, ExportPolicy, LoggingConfig};

/// Evaluate a WebAssembly text script with an integer argument.
#[derive(Debug, Parser)]
#[command(name = "wasm-eval", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "WASM_EVAL_CONFIG")]
    config: Option<PathBuf>,

    /// Treat SCRIPT as WAT source text instead of a file path.
    #[arg(short = 'e', long)]
    inline: bool,

    /// Name of the export to call.
    #[arg(long, conflicts_with = "first_export")]
    export: Option<String>,

    /// Call the first export the module declares.
    #[arg(long)]
    first_export: bool,

    /// Call the export without the integer argument.
    #[arg(long)]
    ignore_arg: bool,

    /// Path to a `.wat` file, or the source itself with `--inline`.
    script: String,

    /// Remaining command arguments, normally a single integer.
    #[arg(allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<ConfigFile> {
        let mut config = match &self.config {
            Some(path) => ConfigFile::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => ConfigFile::default(),
        };

        let eval = &mut config.runtime.eval;
        if let Some(name) = &self.export {
            eval.export = ExportPolicy::Named(name.clone());
        }
        if self.first_export {
            eval.export = ExportPolicy::First;
        }
        if self.ignore_arg {
            eval.argument = ArgumentPolicy::Ignore;
        }

        Ok(config)
    }

    fn script_source(&self) -> anyhow::Result<Bytes> {
        if self.inline {
            return Ok(Bytes::copy_from_slice(self.script.as_bytes()));
        }

        let source = std::fs::read(&self.script)
            .with_context(|| format!("Failed to read script {}", self.script))?;
        Ok(Bytes::from(source))
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let (json, plain) = if logging.json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    init_tracing(&config.logging);

    info!(export = %config.runtime.eval.export, "Starting wasm-eval");
    debug!(config = ?config.runtime, "Configuration loaded");

    let mut argv = vec![Bytes::from_static(b"EVALWASM"), cli.script_source()?];
    argv.extend(cli.args.into_iter().map(Bytes::from));

    let command = Arc::new(EvalWasm::new(config.runtime));
    let reply = command.handle_async(argv).await;

    println!("{reply}");

    Ok(if reply.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
