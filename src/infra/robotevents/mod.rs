//! RobotEvents API v2 client.

mod client;

pub use client::{DEFAULT_BASE_URL, RobotEventsClient};
