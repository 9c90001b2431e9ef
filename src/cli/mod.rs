//! Command-line parsing for the housing price service and its clients.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the inference code.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::domain::RawObservation;
use crate::io::artifact::ArtifactPaths;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "housing", version, about = "California housing price estimator (service + form client)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP inference service (`POST /predict`, `GET /health`).
    Serve(ServeArgs),
    /// Launch the interactive form that calls the inference service.
    ///
    /// This is the default when `housing` is run without a subcommand.
    Form(ClientArgs),
    /// Send a single prediction request and print the result.
    Predict(PredictArgs),
    /// Load the artifacts locally and show derived features + prediction (no HTTP).
    Explain(ExplainArgs),
}

/// Where the model artifacts live.
#[derive(Debug, Args, Clone)]
pub struct ArtifactArgs {
    /// Regression pipeline artifact (JSON).
    #[arg(long, env = "HOUSING_MODEL_PATH", default_value = "artifacts/housing_pipeline.json")]
    pub model: PathBuf,

    /// Geo-clustering artifact (JSON).
    #[arg(long, env = "HOUSING_CLUSTERS_PATH", default_value = "artifacts/kmeans_geo.json")]
    pub clusters: PathBuf,
}

impl ArtifactArgs {
    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.model.clone(),
            clusters: self.clusters.clone(),
        }
    }
}

/// Logging options (`RUST_LOG` overrides `--log-level`).
#[derive(Debug, Args, Clone)]
pub struct LogArgs {
    /// Log filter, e.g. `info` or `housing_price=debug`.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "HOUSING_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Options shared by the HTTP clients.
#[derive(Debug, Args, Clone)]
pub struct ClientArgs {
    /// Base URL of the inference service.
    #[arg(long, env = "HOUSING_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Request timeout (seconds).
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl ClientArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Raw attributes; anything omitted falls back to the form defaults.
#[derive(Debug, Args, Clone, Default)]
pub struct ObservationArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub house_age: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub ave_rooms: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub ave_bedrms: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub population: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub ave_occup: Option<f64>,
    /// Median income in units of 100k.
    #[arg(long, allow_negative_numbers = true)]
    pub med_inc: Option<f64>,
}

impl ObservationArgs {
    pub fn to_observation(&self) -> RawObservation {
        let d = crate::tui::form::default_observation();
        RawObservation {
            longitude: self.longitude.unwrap_or(d.longitude),
            latitude: self.latitude.unwrap_or(d.latitude),
            house_age: self.house_age.unwrap_or(d.house_age),
            ave_rooms: self.ave_rooms.unwrap_or(d.ave_rooms),
            ave_bedrms: self.ave_bedrms.unwrap_or(d.ave_bedrms),
            population: self.population.unwrap_or(d.population),
            ave_occup: self.ave_occup.unwrap_or(d.ave_occup),
            med_inc: self.med_inc.unwrap_or(d.med_inc),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    #[command(flatten)]
    pub observation: ObservationArgs,

    /// Print the raw JSON response instead of the text report.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ExplainArgs {
    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    #[command(flatten)]
    pub observation: ObservationArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_accepts_negative_coordinates() {
        let cli = Cli::parse_from(["housing", "predict", "--longitude", "-122.25", "--med-inc", "8.3"]);
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        let raw = args.observation.to_observation();
        assert_eq!(raw.longitude, -122.25);
        assert_eq!(raw.med_inc, 8.3);
        // Untouched fields keep the form defaults.
        assert_eq!(raw.latitude, 34.0);
        assert_eq!(raw.ave_rooms, 5.5);
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::parse_from(["housing", "serve", "--bind", "0.0.0.0:9000"]);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind.port(), 9000);
        assert_eq!(args.log.log_level, "info");
    }
}
