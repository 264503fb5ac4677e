//! Builds per-team summary reports for a robotics event from the RobotEvents API.

pub mod error;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod parser;
pub mod report;
pub mod services;
pub mod stats;

pub use error::ApiError;
pub use report::{Report, ReportOptions, Scope, build_report};
pub use stats::{AwardFormat, TeamSummary};

/// Environment variable holding the RobotEvents API access token.
pub const TOKEN_ENV_VAR: &str = "ROBOTEVENTS_TOKEN";
