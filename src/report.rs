//! Ties fetching and aggregation together for one event.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{Instrument, info};

use crate::services::event_api::{
    Award, Event, EventApi, MatchResult, RoundFilter, SkillsRun, Team,
};
use crate::stats::{AwardFormat, TeamSummary, aggregate};

/// Where match, skills and award records come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Scope {
    /// Only what happened at the event itself.
    #[default]
    Event,
    /// Each team's history over the event's whole season.
    Season,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub scope: Scope,
    pub rounds: RoundFilter,
    pub awards: AwardFormat,
    /// Upper bound on concurrent per-team fetches in season scope.
    pub concurrency: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            scope: Scope::default(),
            rounds: RoundFilter::default(),
            awards: AwardFormat::default(),
            concurrency: 5,
        }
    }
}

#[derive(Debug)]
pub struct Report {
    pub event: Event,
    pub summaries: Vec<TeamSummary>,
}

#[derive(Default)]
struct Records {
    matches: Vec<MatchResult>,
    skills: Vec<SkillsRun>,
    awards: Vec<Award>,
}

/// Resolves `sku`, fetches the roster and records for the chosen scope, and
/// aggregates them into one summary per roster team.
#[tracing::instrument(skip(api, options), fields(scope = ?options.scope))]
pub async fn build_report<A>(api: Arc<A>, sku: &str, options: &ReportOptions) -> Result<Report>
where
    A: EventApi + 'static,
{
    let event = api
        .find_event(sku)
        .await
        .with_context(|| format!("Failed to look up event {sku}"))?;

    let roster = api
        .event_teams(&event)
        .await
        .context("Failed to fetch team list")?;
    info!(event = %event.name, teams = roster.len(), "Roster fetched");

    let records = match options.scope {
        Scope::Event => event_records(api.as_ref(), &event, options.rounds).await?,
        Scope::Season => season_records(api, &event, &roster, options).await?,
    };

    info!(
        matches = records.matches.len(),
        skills = records.skills.len(),
        awards = records.awards.len(),
        "Records fetched"
    );

    let summaries = aggregate(
        &roster,
        &records.matches,
        &records.skills,
        &records.awards,
        &options.awards,
    );

    Ok(Report { event, summaries })
}

async fn event_records<A: EventApi>(
    api: &A,
    event: &Event,
    rounds: RoundFilter,
) -> Result<Records> {
    let matches = api
        .event_matches(event, rounds)
        .await
        .context("Failed to fetch event matches")?;
    let skills = api
        .event_skills(event)
        .await
        .context("Failed to fetch event skills")?;
    let awards = api
        .event_awards(event)
        .await
        .context("Failed to fetch event awards")?;

    Ok(Records {
        matches,
        skills,
        awards,
    })
}

/// Fetches every roster team's season history, at most
/// `options.concurrency` teams at a time. The first failure aborts the run.
async fn season_records<A>(
    api: Arc<A>,
    event: &Event,
    roster: &[Team],
    options: &ReportOptions,
) -> Result<Records>
where
    A: EventApi + 'static,
{
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let season_id = event.season_id;
    let rounds = options.rounds;

    let mut tasks = Vec::with_capacity(roster.len());

    for team in roster {
        let api = api.clone();
        let sem = semaphore.clone();
        let team_id = team.id;
        let span = tracing::info_span!("team_history", team = %team.number, team_id);

        let task = tokio::spawn(
            async move {
                let _permit = sem.acquire_owned().await?;

                let matches = api.team_matches(team_id, season_id, rounds).await?;
                let skills = api.team_skills(team_id, season_id).await?;
                let awards = api.team_awards(team_id, season_id).await?;

                anyhow::Ok(Records {
                    matches,
                    skills,
                    awards,
                })
            }
            .instrument(span),
        );

        tasks.push((team.number.clone(), task));
    }

    let mut all = Records::default();
    for (number, task) in tasks {
        let records = task
            .await
            .with_context(|| format!("Task for team {number} panicked"))?
            .with_context(|| format!("Failed to fetch season history for team {number}"))?;

        all.matches.extend(records.matches);
        all.skills.extend(records.skills);
        all.awards.extend(records.awards);
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, Result as ApiResult};
    use crate::services::event_api::{Outcome, SkillsKind};
    use async_trait::async_trait;

    /// Serves a fixed three-team event. Season award lookups fail for
    /// `failing_team`.
    #[derive(Default)]
    struct FakeApi {
        failing_team: Option<u64>,
    }

    fn event() -> Event {
        Event {
            id: 10,
            sku: "RE-TEST-1".to_string(),
            name: "Test Invitational".to_string(),
            season_id: 190,
            season_name: "High Stakes".to_string(),
            start: None,
            divisions: vec![],
        }
    }

    fn team(id: u64, number: &str) -> Team {
        Team {
            id,
            number: number.to_string(),
            name: String::new(),
            organization: String::new(),
        }
    }

    #[async_trait]
    impl EventApi for FakeApi {
        async fn find_event(&self, sku: &str) -> ApiResult<Event> {
            if sku == "RE-TEST-1" {
                Ok(event())
            } else {
                Err(ApiError::NotFound(format!("event {sku}")))
            }
        }

        async fn event_teams(&self, _event: &Event) -> ApiResult<Vec<Team>> {
            Ok(vec![team(1, "1A"), team(2, "2B"), team(3, "3C")])
        }

        async fn event_matches(
            &self,
            _event: &Event,
            _rounds: RoundFilter,
        ) -> ApiResult<Vec<MatchResult>> {
            Ok(vec![
                MatchResult {
                    team_id: 1,
                    outcome: Outcome::Win,
                },
                MatchResult {
                    team_id: 2,
                    outcome: Outcome::Loss,
                },
            ])
        }

        async fn event_skills(&self, _event: &Event) -> ApiResult<Vec<SkillsRun>> {
            Ok(vec![SkillsRun {
                team_id: 2,
                kind: SkillsKind::Driver,
                score: 40,
            }])
        }

        async fn event_awards(&self, _event: &Event) -> ApiResult<Vec<Award>> {
            Ok(vec![])
        }

        async fn team_matches(
            &self,
            team_id: u64,
            season_id: u64,
            _rounds: RoundFilter,
        ) -> ApiResult<Vec<MatchResult>> {
            assert_eq!(season_id, 190);
            // team N has N wins this season
            Ok((0..team_id)
                .map(|_| MatchResult {
                    team_id,
                    outcome: Outcome::Win,
                })
                .collect())
        }

        async fn team_skills(&self, team_id: u64, _season_id: u64) -> ApiResult<Vec<SkillsRun>> {
            Ok(vec![SkillsRun {
                team_id,
                kind: SkillsKind::Autonomous,
                score: team_id as u32 * 10,
            }])
        }

        async fn team_awards(&self, team_id: u64, _season_id: u64) -> ApiResult<Vec<Award>> {
            if self.failing_team == Some(team_id) {
                Err(ApiError::NotFound(format!("team {team_id} awards")))
            } else {
                Ok(vec![Award {
                    team_id,
                    name: "Think Award (VRC/VEXU/VAIRC)".to_string(),
                }])
            }
        }
    }

    #[tokio::test]
    async fn test_event_scope() {
        let api = Arc::new(FakeApi::default());
        let report = build_report(api, "RE-TEST-1", &ReportOptions::default())
            .await
            .unwrap();

        assert_eq!(report.event.id, 10);
        let rows = &report.summaries;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].wins, 1);
        assert_eq!(rows[1].losses, 1);
        assert_eq!(rows[1].skills_total, 40);
        assert_eq!((rows[2].wins, rows[2].losses, rows[2].ties), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_season_scope_keeps_roster_order() {
        let options = ReportOptions {
            scope: Scope::Season,
            concurrency: 2,
            ..Default::default()
        };

        let report = build_report(Arc::new(FakeApi::default()), "RE-TEST-1", &options)
            .await
            .unwrap();

        let rows = &report.summaries;
        let ids: Vec<_> = rows.iter().map(|r| r.team_id.as_str()).collect();
        assert_eq!(ids, vec!["1A", "2B", "3C"]);
        assert_eq!(rows[2].wins, 3);
        assert_eq!(rows[1].auton_skills, 20);
        assert_eq!(rows[0].team_awards, "Think Award");
    }

    #[tokio::test]
    async fn test_season_scope_failure_aborts() {
        let options = ReportOptions {
            scope: Scope::Season,
            ..Default::default()
        };

        let api = FakeApi {
            failing_team: Some(3),
        };
        let err = build_report(Arc::new(api), "RE-TEST-1", &options)
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("team 3C"));
    }

    #[tokio::test]
    async fn test_unknown_event() {
        let api = Arc::new(FakeApi::default());
        let err = build_report(api, "RE-NOPE", &ReportOptions::default())
            .await
            .unwrap_err();

        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert!(matches!(api_err, ApiError::NotFound(_)));
    }
}
