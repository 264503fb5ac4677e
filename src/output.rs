//! CSV report writing.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::stats::TeamSummary;
use csv::{QuoteStyle, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};

pub const HEADER: [&str; 10] = [
    "Team ID",
    "Team Name",
    "Organization",
    "Wins",
    "Losses",
    "Ties",
    "Driver Skills",
    "Auton Skills",
    "Skills Total",
    "Team Awards",
];

/// Default report file name for an event SKU.
pub fn default_path(sku: &str) -> PathBuf {
    PathBuf::from(format!("teams-{sku}-data.csv"))
}

/// Logs a summary row using Rust's debug pretty-print format.
pub fn print_pretty(summary: &TeamSummary) {
    debug!("{:#?}", summary);
}

/// Writes the header and one row per summary, every field quoted.
///
/// Rows go to a `.part` file next to `path` which is renamed over `path`
/// once complete.
pub fn write_report(path: &Path, summaries: &[TeamSummary]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);

    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .from_path(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;

        writer.write_record(HEADER)?;
        for summary in summaries {
            writer.serialize(summary)?;
        }
        writer.flush()?;
    }

    fs::rename(&tmp, path).with_context(|| format!("Failed to move report to {}", path.display()))?;
    info!(path = %path.display(), rows = summaries.len(), "Report written");
    Ok(())
}
