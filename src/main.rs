//! CLI entry point for the RobotEvents team report tool.
//!
//! Provides subcommands for writing the per-team CSV report for an event and
//! for inspecting an event before reporting on it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use robotevents_report::fetch::{BasicClient, BearerToken};
use robotevents_report::infra::robotevents::{DEFAULT_BASE_URL, RobotEventsClient};
use robotevents_report::output::{default_path, print_pretty, write_report};
use robotevents_report::services::event_api::{EventApi, RoundFilter};
use robotevents_report::{
    ApiError, AwardFormat, ReportOptions, Scope, TOKEN_ENV_VAR, build_report,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "robotevents_report")]
#[command(about = "Per-team summary reports for RobotEvents competitions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the per-team CSV report for an event
    Report {
        /// Event SKU, e.g. RE-V5RC-24-7329
        #[arg(value_name = "SKU")]
        sku: String,

        /// CSV file to write (default: teams-<SKU>-data.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Count records from the event only, or each team's whole season
        #[arg(short, long, value_enum, default_value_t = Scope::Event)]
        scope: Scope,

        /// Maximum number of teams fetched concurrently in season scope
        #[arg(short, long, default_value_t = 5)]
        concurrency: usize,

        /// Only count qualification matches towards the win/loss/tie record
        #[arg(long, default_value_t = false)]
        qualifications_only: bool,

        /// Keep program qualifiers such as "(VRC/VEXU/VAIRC)" in award names
        #[arg(long, default_value_t = false)]
        keep_award_qualifiers: bool,

        /// Text placed between award names in the Team Awards column
        #[arg(long, default_value = "\n")]
        award_separator: String,

        /// RobotEvents API base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        api_url: String,
    },
    /// Show an event's name, season, divisions and roster size
    ShowEvent {
        /// Event SKU, e.g. RE-V5RC-24-7329
        #[arg(value_name = "SKU")]
        sku: String,

        /// RobotEvents API base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/robotevents_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("robotevents_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG_JSON").unwrap_or_else(|_| EnvFilter::new("debug")),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            sku,
            output,
            scope,
            concurrency,
            qualifications_only,
            keep_award_qualifiers,
            award_separator,
            api_url,
        } => {
            let options = ReportOptions {
                scope,
                rounds: if qualifications_only {
                    RoundFilter::QualificationsOnly
                } else {
                    RoundFilter::Competitive
                },
                awards: AwardFormat {
                    separator: award_separator,
                    strip_qualifier: !keep_award_qualifiers,
                },
                concurrency,
            };
            let output = output.unwrap_or_else(|| default_path(&sku));
            report(&sku, &output, &api_url, &options).await
        }
        Commands::ShowEvent { sku, api_url } => show_event(&sku, &api_url).await,
    };

    if let Err(e) = &result {
        if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_auth) {
            error!(
                env_var = TOKEN_ENV_VAR,
                "Authentication failed; check the access token"
            );
        }
    }

    result
}

/// Builds the API client from the token in the environment.
fn api_client(api_url: &str) -> Result<RobotEventsClient<BearerToken<BasicClient>>> {
    let token = std::env::var(TOKEN_ENV_VAR).unwrap_or_default();
    let http = BearerToken::new(BasicClient::new()?, &token)?;
    Ok(RobotEventsClient::new(http, api_url))
}

#[tracing::instrument(skip_all, fields(sku = %sku, output = %output.display()))]
async fn report(sku: &str, output: &Path, api_url: &str, options: &ReportOptions) -> Result<()> {
    let api = Arc::new(api_client(api_url)?);

    let report = build_report(api, sku, options).await?;
    for summary in &report.summaries {
        print_pretty(summary);
    }

    write_report(output, &report.summaries)
        .with_context(|| format!("Failed to write report for {sku}"))?;

    info!(
        event = %report.event.name,
        teams = report.summaries.len(),
        output = %output.display(),
        "Report complete"
    );
    Ok(())
}

async fn show_event(sku: &str, api_url: &str) -> Result<()> {
    let api = api_client(api_url)?;

    let event = api
        .find_event(sku)
        .await
        .with_context(|| format!("Failed to look up event {sku}"))?;
    let teams = api
        .event_teams(&event)
        .await
        .context("Failed to fetch team list")?;

    info!(
        event_id = event.id,
        sku = %event.sku,
        name = %event.name,
        season = %event.season_name,
        season_id = event.season_id,
        start = ?event.start,
        teams = teams.len(),
        "Event"
    );

    for division in &event.divisions {
        info!(division_id = division.id, name = %division.name, "Division");
    }

    Ok(())
}
