//! JSON decoding for RobotEvents API v2 payloads.
//!
//! Wire types mirror the API's field names and stay private to the fetch
//! path; the `*_from` helpers turn them into the domain records in
//! [`crate::services::event_api`].

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::services::event_api::{
    Award, Division, Event, MatchResult, Outcome, RoundFilter, SkillsKind, SkillsRun, Team,
};

const PRACTICE_ROUND: u32 = 1;
const QUALIFICATION_ROUND: u32 = 2;

/// One page of a paginated list endpoint.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: PageMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub last_page: u32,
    #[serde(default)]
    pub next_page_url: Option<String>,
}

impl PageMeta {
    pub fn has_next(&self) -> bool {
        match self.next_page_url {
            None => false,
            Some(_) => self.last_page == 0 || self.current_page < self.last_page,
        }
    }
}

/// Decodes a page envelope (`{"data": [...], "meta": {...}}`) from raw bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON for a `Page<T>`.
pub fn parse_page<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<Page<T>> {
    serde_json::from_slice(bytes)
}

#[derive(Debug, Deserialize)]
pub struct IdRef {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiDivision {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiEvent {
    pub id: u64,
    pub sku: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start: Option<DateTime<FixedOffset>>,
    pub season: IdRef,
    #[serde(default)]
    pub divisions: Vec<ApiDivision>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTeam {
    pub id: u64,
    pub number: String,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMatch {
    #[serde(default)]
    pub round: u32,
    #[serde(default)]
    pub scored: bool,
    #[serde(default)]
    pub alliances: Vec<ApiAlliance>,
}

#[derive(Debug, Deserialize)]
pub struct ApiAlliance {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub teams: Vec<ApiAllianceTeam>,
}

#[derive(Debug, Deserialize)]
pub struct ApiAllianceTeam {
    #[serde(default)]
    pub team: Option<IdRef>,
    #[serde(default)]
    pub sitting: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApiSkill {
    pub team: IdRef,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub score: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiAward {
    pub title: String,
    #[serde(default, rename = "teamWinners")]
    pub team_winners: Vec<ApiTeamWinner>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTeamWinner {
    #[serde(default)]
    pub team: Option<IdRef>,
}

impl From<ApiEvent> for Event {
    fn from(e: ApiEvent) -> Self {
        Event {
            id: e.id,
            sku: e.sku,
            name: e.name.unwrap_or_default(),
            season_id: e.season.id,
            season_name: e.season.name.unwrap_or_default(),
            start: e.start,
            divisions: e
                .divisions
                .into_iter()
                .map(|d| Division {
                    id: d.id,
                    name: d.name.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

impl From<ApiTeam> for Team {
    fn from(t: ApiTeam) -> Self {
        Team {
            id: t.id,
            number: t.number,
            name: t.team_name.unwrap_or_default(),
            organization: t.organization.unwrap_or_default(),
        }
    }
}

/// Expands scored matches into one [`MatchResult`] per playing team.
///
/// Unscored and practice matches are dropped, as are matches with a single
/// alliance since there is nobody to win or lose against. Sitting teams do
/// not get a result.
pub fn match_results_from(matches: &[ApiMatch], rounds: RoundFilter) -> Vec<MatchResult> {
    let mut out = Vec::new();

    for m in matches {
        if !m.scored || m.round == PRACTICE_ROUND {
            continue;
        }
        if rounds == RoundFilter::QualificationsOnly && m.round != QUALIFICATION_ROUND {
            continue;
        }
        if m.alliances.len() < 2 {
            continue;
        }

        for (i, alliance) in m.alliances.iter().enumerate() {
            let own = alliance.score.unwrap_or(0);
            let best_opponent = m
                .alliances
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, a)| a.score.unwrap_or(0))
                .max()
                .unwrap_or(0);

            let outcome = match own.cmp(&best_opponent) {
                std::cmp::Ordering::Greater => Outcome::Win,
                std::cmp::Ordering::Less => Outcome::Loss,
                std::cmp::Ordering::Equal => Outcome::Tie,
            };

            for slot in &alliance.teams {
                if slot.sitting {
                    continue;
                }
                if let Some(team) = &slot.team {
                    out.push(MatchResult {
                        team_id: team.id,
                        outcome,
                    });
                }
            }
        }
    }

    out
}

/// Maps skills records to runs. `programming` is the API's name for autonomous.
pub fn skills_runs_from(records: &[ApiSkill]) -> Vec<SkillsRun> {
    records
        .iter()
        .filter_map(|r| {
            let kind = match r.kind.as_str() {
                "driver" => SkillsKind::Driver,
                "programming" => SkillsKind::Autonomous,
                other => {
                    debug!(team_id = r.team.id, kind = other, "Skipping skills record");
                    return None;
                }
            };
            let score = u32::try_from(r.score.unwrap_or(0)).unwrap_or(0);
            Some(SkillsRun {
                team_id: r.team.id,
                kind,
                score,
            })
        })
        .collect()
}

/// One [`Award`] per team listed as a winner. Used for event-wide award lists.
pub fn awards_from_winners(records: &[ApiAward]) -> Vec<Award> {
    records
        .iter()
        .flat_map(|award| {
            award
                .team_winners
                .iter()
                .filter_map(|w| w.team.as_ref())
                .map(|team| Award {
                    team_id: team.id,
                    name: award.title.clone(),
                })
        })
        .collect()
}

/// Attributes every award to `team_id`. Used for a single team's award history,
/// where partner teams on the same award are not of interest.
pub fn awards_for_team(records: &[ApiAward], team_id: u64) -> Vec<Award> {
    records
        .iter()
        .map(|award| Award {
            team_id,
            name: award.title.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_matches(json: &str) -> Vec<ApiMatch> {
        parse_page::<ApiMatch>(json.as_bytes()).unwrap().data
    }

    fn alliance(color: &str, score: i64, teams: &[u64]) -> String {
        let teams: Vec<String> = teams
            .iter()
            .map(|id| format!(r#"{{"team": {{"id": {id}, "name": "T{id}"}}, "sitting": false}}"#))
            .collect();
        format!(
            r#"{{"color": "{color}", "score": {score}, "teams": [{}]}}"#,
            teams.join(",")
        )
    }

    fn page_of(items: &[String]) -> String {
        format!(
            r#"{{"meta": {{"current_page": 1, "last_page": 1, "next_page_url": null}}, "data": [{}]}}"#,
            items.join(",")
        )
    }

    fn scored_match(round: u32, red: (i64, &[u64]), blue: (i64, &[u64])) -> String {
        format!(
            r#"{{"round": {round}, "scored": true, "alliances": [{}, {}]}}"#,
            alliance("red", red.0, red.1),
            alliance("blue", blue.0, blue.1)
        )
    }

    #[test]
    fn test_parse_page_meta() {
        let page: Page<ApiTeam> = parse_page(
            br#"{"meta": {"current_page": 1, "last_page": 3, "next_page_url": "https://x/?page=2"},
                 "data": [{"id": 7, "number": "393V", "team_name": "Venom", "organization": null}]}"#,
        )
        .unwrap();

        assert!(page.meta.has_next());
        assert_eq!(page.data.len(), 1);

        let team: Team = page.data.into_iter().next().unwrap().into();
        assert_eq!(team.number, "393V");
        assert_eq!(team.name, "Venom");
        assert_eq!(team.organization, "");
    }

    #[test]
    fn test_parse_page_invalid_json() {
        assert!(parse_page::<ApiTeam>(b"<html>").is_err());
    }

    #[test]
    fn test_last_page_has_no_next() {
        let meta = PageMeta {
            current_page: 2,
            last_page: 2,
            next_page_url: None,
        };
        assert!(!meta.has_next());
    }

    #[test]
    fn test_match_outcomes_win_loss() {
        let matches = parse_matches(&page_of(&[scored_match(2, (30, &[1, 2]), (12, &[3, 4]))]));
        let results = match_results_from(&matches, RoundFilter::Competitive);

        assert_eq!(results.len(), 4);
        assert!(
            results
                .iter()
                .filter(|r| r.team_id <= 2)
                .all(|r| r.outcome == Outcome::Win)
        );
        assert!(
            results
                .iter()
                .filter(|r| r.team_id >= 3)
                .all(|r| r.outcome == Outcome::Loss)
        );
    }

    #[test]
    fn test_match_outcome_tie() {
        let matches = parse_matches(&page_of(&[scored_match(2, (20, &[1]), (20, &[2]))]));
        let results = match_results_from(&matches, RoundFilter::Competitive);

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.outcome == Outcome::Tie));
    }

    #[test]
    fn test_practice_and_unscored_matches_skipped() {
        let unscored = r#"{"round": 2, "scored": false, "alliances": []}"#.to_string();
        let matches = parse_matches(&page_of(&[
            scored_match(1, (10, &[1]), (5, &[2])),
            unscored,
        ]));

        assert!(match_results_from(&matches, RoundFilter::Competitive).is_empty());
    }

    #[test]
    fn test_qualifications_only_filter() {
        let matches = parse_matches(&page_of(&[
            scored_match(2, (10, &[1]), (5, &[2])),
            scored_match(5, (10, &[1]), (5, &[2])),
        ]));

        assert_eq!(match_results_from(&matches, RoundFilter::Competitive).len(), 4);
        assert_eq!(
            match_results_from(&matches, RoundFilter::QualificationsOnly).len(),
            2
        );
    }

    #[test]
    fn test_single_alliance_and_sitting_teams() {
        let cooperative = format!(
            r#"{{"round": 2, "scored": true, "alliances": [{}]}}"#,
            alliance("blue", 40, &[1, 2])
        );
        let with_sitter = r#"{"round": 2, "scored": true, "alliances": [
            {"color": "red", "score": 8, "teams": [{"team": {"id": 1}, "sitting": true}, {"team": {"id": 2}, "sitting": false}]},
            {"color": "blue", "score": 3, "teams": [{"team": {"id": 3}, "sitting": false}]}]}"#
            .to_string();

        let matches = parse_matches(&page_of(&[cooperative, with_sitter]));
        let results = match_results_from(&matches, RoundFilter::Competitive);

        assert_eq!(
            results,
            vec![
                MatchResult {
                    team_id: 2,
                    outcome: Outcome::Win
                },
                MatchResult {
                    team_id: 3,
                    outcome: Outcome::Loss
                },
            ]
        );
    }

    #[test]
    fn test_skills_types() {
        let page: Page<ApiSkill> = parse_page(
            br#"{"data": [
                {"team": {"id": 1}, "type": "driver", "score": 42},
                {"team": {"id": 1}, "type": "programming", "score": 17},
                {"team": {"id": 1}, "type": "package", "score": 59},
                {"team": {"id": 2}, "type": "driver", "score": null}
            ]}"#,
        )
        .unwrap();

        let runs = skills_runs_from(&page.data);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].kind, SkillsKind::Driver);
        assert_eq!(runs[1].kind, SkillsKind::Autonomous);
        assert_eq!(runs[1].score, 17);
        assert_eq!(runs[2].score, 0);
    }

    #[test]
    fn test_awards_from_winners_and_for_team() {
        let page: Page<ApiAward> = parse_page(
            br#"{"data": [
                {"title": "Tournament Champions (VRC/VEXU/VAIRC)",
                 "teamWinners": [{"team": {"id": 1}}, {"team": {"id": 2}}]},
                {"title": "Excellence Award (VRC/VEXU/VAIRC)", "teamWinners": []}
            ]}"#,
        )
        .unwrap();

        let by_winner = awards_from_winners(&page.data);
        assert_eq!(by_winner.len(), 2);
        assert_eq!(by_winner[1].team_id, 2);

        let mine = awards_for_team(&page.data, 9);
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|a| a.team_id == 9));
        assert_eq!(mine[1].name, "Excellence Award (VRC/VEXU/VAIRC)");
    }
}
