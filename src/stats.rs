use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::services::event_api::{Award, MatchResult, Outcome, SkillsKind, SkillsRun, Team};

/// One report row.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummary {
    pub team_id: String,
    pub team_name: String,
    pub organization: String,

    // match record
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,

    // best skills scores
    pub driver_skills: u32,
    pub auton_skills: u32,
    pub skills_total: u32,

    pub team_awards: String,
}

/// How award titles are rendered into the `Team Awards` cell.
#[derive(Debug, Clone)]
pub struct AwardFormat {
    pub separator: String,
    /// Drop a trailing program qualifier such as `(VRC/VEXU/VAIRC)`.
    pub strip_qualifier: bool,
}

impl Default for AwardFormat {
    fn default() -> Self {
        Self {
            separator: "\n".to_string(),
            strip_qualifier: true,
        }
    }
}

impl AwardFormat {
    pub fn title<'a>(&self, raw: &'a str) -> &'a str {
        let raw = raw.trim();
        if !self.strip_qualifier {
            return raw;
        }
        let Some(inner) = raw.strip_suffix(')') else {
            return raw;
        };
        match inner.rfind('(') {
            Some(open) if open > 0 && is_program_list(&inner[open + 1..]) => {
                raw[..open].trim_end()
            }
            _ => raw,
        }
    }
}

/// `VRC`, `VRC/VEXU/VAIRC` and the like: slash-separated program codes.
fn is_program_list(s: &str) -> bool {
    s.split('/').all(|code| {
        !code.is_empty()
            && code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    })
}

#[derive(Debug, Default)]
struct Record {
    wins: u32,
    losses: u32,
    ties: u32,
}

#[derive(Debug, Default)]
struct BestSkills {
    driver: u32,
    auton: u32,
}

impl TeamSummary {
    fn from_team(team: &Team) -> Self {
        TeamSummary {
            team_id: team.number.clone(),
            team_name: team.name.clone(),
            organization: team.organization.clone(),
            ..Default::default()
        }
    }
}

/// Joins the roster with match, skills and award records into one row per team.
///
/// Rows follow roster order. A team listed twice in the roster is reported
/// once, at its first position. Records for teams outside the roster are
/// ignored, and a roster team with no records gets zero counts and an empty
/// awards cell.
pub fn aggregate(
    roster: &[Team],
    matches: &[MatchResult],
    skills: &[SkillsRun],
    awards: &[Award],
    format: &AwardFormat,
) -> Vec<TeamSummary> {
    let mut records: HashMap<u64, Record> = HashMap::new();
    for m in matches {
        let r = records.entry(m.team_id).or_default();
        match m.outcome {
            Outcome::Win => r.wins += 1,
            Outcome::Loss => r.losses += 1,
            Outcome::Tie => r.ties += 1,
        }
    }

    let mut best: HashMap<u64, BestSkills> = HashMap::new();
    for run in skills {
        let b = best.entry(run.team_id).or_default();
        let slot = match run.kind {
            SkillsKind::Driver => &mut b.driver,
            SkillsKind::Autonomous => &mut b.auton,
        };
        *slot = (*slot).max(run.score);
    }

    let mut titles: HashMap<u64, Vec<&str>> = HashMap::new();
    for award in awards {
        titles
            .entry(award.team_id)
            .or_default()
            .push(format.title(&award.name));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(roster.len());

    for team in roster {
        if !seen.insert(team.id) {
            continue;
        }

        let mut s = TeamSummary::from_team(team);

        if let Some(r) = records.get(&team.id) {
            s.wins = r.wins;
            s.losses = r.losses;
            s.ties = r.ties;
        }

        if let Some(b) = best.get(&team.id) {
            s.driver_skills = b.driver;
            s.auton_skills = b.auton;
            s.skills_total = b.driver + b.auton;
        }

        if let Some(t) = titles.get(&team.id) {
            s.team_awards = t.join(&format.separator);
        }

        out.push(s);
    }

    out
}
