//! Trait and types for pulling competition data for one event.

use chrono::{DateTime, FixedOffset};

use crate::error::Result;

/// A division of an event. Matches are listed per division.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Division {
    pub id: u64,
    pub name: String,
}

/// An event resolved from its SKU (e.g. `RE-V5RC-24-7329`).
#[derive(Debug, Clone)]
pub struct Event {
    pub id: u64,
    pub sku: String,
    pub name: String,
    pub season_id: u64,
    pub season_name: String,
    pub start: Option<DateTime<FixedOffset>>,
    pub divisions: Vec<Division>,
}

/// A registered team.
///
/// `id` is the API's numeric key used to join the other record sets;
/// `number` is the public team number (`393V`) shown in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: u64,
    pub number: String,
    pub name: String,
    pub organization: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

/// One team's result in one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub team_id: u64,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillsKind {
    Driver,
    Autonomous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillsRun {
    pub team_id: u64,
    pub kind: SkillsKind,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Award {
    pub team_id: u64,
    pub name: String,
}

/// Which matches count towards the win/loss/tie record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoundFilter {
    /// Everything except practice matches.
    #[default]
    Competitive,
    /// Qualification matches only.
    QualificationsOnly,
}

/// Abstraction over the competition data provider (RobotEvents).
#[async_trait::async_trait]
pub trait EventApi: Send + Sync {
    /// Resolves an event SKU. An unknown SKU is [`ApiError::NotFound`](crate::error::ApiError::NotFound).
    async fn find_event(&self, sku: &str) -> Result<Event>;

    /// Teams registered for the event, in the provider's order.
    async fn event_teams(&self, event: &Event) -> Result<Vec<Team>>;

    /// Match results from every division of the event.
    async fn event_matches(&self, event: &Event, rounds: RoundFilter) -> Result<Vec<MatchResult>>;

    async fn event_skills(&self, event: &Event) -> Result<Vec<SkillsRun>>;

    async fn event_awards(&self, event: &Event) -> Result<Vec<Award>>;

    /// A team's match results across a whole season.
    async fn team_matches(
        &self,
        team_id: u64,
        season_id: u64,
        rounds: RoundFilter,
    ) -> Result<Vec<MatchResult>>;

    async fn team_skills(&self, team_id: u64, season_id: u64) -> Result<Vec<SkillsRun>>;

    async fn team_awards(&self, team_id: u64, season_id: u64) -> Result<Vec<Award>>;
}
