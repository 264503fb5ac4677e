use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::fetch::{HttpClient, RetryPolicy, fetch_all_pages};
use crate::parser::{
    ApiAward, ApiEvent, ApiMatch, ApiSkill, ApiTeam, awards_for_team, awards_from_winners,
    match_results_from, skills_runs_from,
};
use crate::services::event_api::{
    Award, Event, EventApi, MatchResult, RoundFilter, SkillsRun, Team,
};

pub const DEFAULT_BASE_URL: &str = "https://www.robotevents.com/api/v2";

/// [`EventApi`] backed by the RobotEvents v2 REST API.
///
/// `C` is normally a [`BearerToken`](crate::fetch::BearerToken) around a
/// [`BasicClient`](crate::fetch::BasicClient).
pub struct RobotEventsClient<C> {
    http: C,
    base_url: String,
    retry: RetryPolicy,
}

impl<C: HttpClient> RobotEventsClient<C> {
    pub fn new(http: C, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = self.url(path, query)?;
        fetch_all_pages(&self.http, &url, &self.retry).await
    }
}

fn season_query(season_id: u64) -> [(&'static str, String); 1] {
    [("season[]", season_id.to_string())]
}

#[async_trait]
impl<C: HttpClient> EventApi for RobotEventsClient<C> {
    async fn find_event(&self, sku: &str) -> Result<Event> {
        let events: Vec<ApiEvent> = self.list("/events", &[("sku[]", sku.to_string())]).await?;

        let event = events
            .into_iter()
            .find(|e| e.sku.eq_ignore_ascii_case(sku))
            .ok_or_else(|| ApiError::NotFound(format!("event {sku}")))?;

        info!(event_id = event.id, sku, "Event resolved");
        Ok(event.into())
    }

    async fn event_teams(&self, event: &Event) -> Result<Vec<Team>> {
        let teams: Vec<ApiTeam> = self
            .list(&format!("/events/{}/teams", event.id), &[])
            .await?;
        Ok(teams.into_iter().map(Team::from).collect())
    }

    async fn event_matches(&self, event: &Event, rounds: RoundFilter) -> Result<Vec<MatchResult>> {
        let mut results = Vec::new();

        for division in &event.divisions {
            let matches: Vec<ApiMatch> = self
                .list(
                    &format!("/events/{}/divisions/{}/matches", event.id, division.id),
                    &[],
                )
                .await?;
            debug!(division = %division.name, matches = matches.len(), "Division matches fetched");
            results.extend(match_results_from(&matches, rounds));
        }

        Ok(results)
    }

    async fn event_skills(&self, event: &Event) -> Result<Vec<SkillsRun>> {
        let skills: Vec<ApiSkill> = self
            .list(&format!("/events/{}/skills", event.id), &[])
            .await?;
        Ok(skills_runs_from(&skills))
    }

    async fn event_awards(&self, event: &Event) -> Result<Vec<Award>> {
        let awards: Vec<ApiAward> = self
            .list(&format!("/events/{}/awards", event.id), &[])
            .await?;
        Ok(awards_from_winners(&awards))
    }

    async fn team_matches(
        &self,
        team_id: u64,
        season_id: u64,
        rounds: RoundFilter,
    ) -> Result<Vec<MatchResult>> {
        let matches: Vec<ApiMatch> = self
            .list(
                &format!("/teams/{team_id}/matches"),
                &season_query(season_id),
            )
            .await?;
        // results cover partners and opponents too
        Ok(match_results_from(&matches, rounds)
            .into_iter()
            .filter(|r| r.team_id == team_id)
            .collect())
    }

    async fn team_skills(&self, team_id: u64, season_id: u64) -> Result<Vec<SkillsRun>> {
        let skills: Vec<ApiSkill> = self
            .list(&format!("/teams/{team_id}/skills"), &season_query(season_id))
            .await?;
        Ok(skills_runs_from(&skills)
            .into_iter()
            .filter(|r| r.team_id == team_id)
            .collect())
    }

    async fn team_awards(&self, team_id: u64, season_id: u64) -> Result<Vec<Award>> {
        let awards: Vec<ApiAward> = self
            .list(&format!("/teams/{team_id}/awards"), &season_query(season_id))
            .await?;
        Ok(awards_for_team(&awards, team_id))
    }
}
