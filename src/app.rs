//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - runs the HTTP inference service (`serve`)
//! - drives the clients (`form`, `predict`)
//! - runs the local pipeline for diagnostics (`explain`)

use clap::Parser;

use crate::cli::{Command, ExplainArgs, PredictArgs, ServeArgs};
use crate::client::ApiClient;
use crate::error::AppError;

pub mod pipeline;

use pipeline::ModelContext;

/// Entry point for the `housing` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `housing` and `housing --api-url X` behave like `housing form ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Serve(args) => handle_serve(args),
        Command::Form(args) => crate::tui::run(args),
        Command::Predict(args) => handle_predict(args),
        Command::Explain(args) => handle_explain(args),
    }
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    crate::telemetry::init(&args.log.log_level, args.log.json_logs)?;

    // Load before the runtime starts: a bad artifact degrades, it never aborts.
    let ctx = ModelContext::load(&args.artifacts.paths());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(4, format!("Failed to start async runtime: {e}")))?;

    runtime.block_on(crate::server::serve(args.bind, ctx))
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    crate::telemetry::init(&args.log.log_level, args.log.json_logs)?;

    let raw = args.observation.to_observation();
    let client = ApiClient::new(&args.client.api_url, args.client.timeout())?;
    let result = client.predict(&raw)?;

    if args.json {
        let body = serde_json::to_string_pretty(&result)
            .map_err(|e| AppError::new(4, format!("Failed to encode response: {e}")))?;
        println!("{body}");
    } else {
        print!("{}", crate::report::format_prediction(&raw, &result));
    }
    Ok(())
}

fn handle_explain(args: ExplainArgs) -> Result<(), AppError> {
    crate::telemetry::init(&args.log.log_level, args.log.json_logs)?;

    let paths = args.artifacts.paths();
    let ctx = ModelContext::load(&paths);
    if let pipeline::ServiceState::Degraded { reason } = ctx.state() {
        return Err(AppError::new(2, format!("Cannot explain without models: {reason}")));
    }

    let raw = args.observation.to_observation();
    let run = ctx
        .run(&raw)
        .map_err(|e| AppError::new(3, e.to_string()))?;

    println!("model: {}", paths.model.display());
    println!("clusters: {}", paths.clusters.display());
    println!();
    print!("{}", crate::report::format_features(&run.features));
    println!();
    print!("{}", crate::report::format_prediction(&raw, &run.result));
    println!("raw model output (x100k): {}", run.price_100k);
    Ok(())
}

/// Rewrite argv so `housing` defaults to `housing form`.
///
/// Rules:
/// - `housing`                          -> `housing form`
/// - `housing --api-url URL ...`        -> `housing form --api-url URL ...`
/// - `housing --help/--version/-h`      -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("form".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "serve" | "form" | "predict" | "explain");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "form flags".
    if arg1.starts_with('-') {
        argv.insert(1, "form".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
