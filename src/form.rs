//! Team form: match records, half-time tallies, league baselines, and parsing of the summary text
//! that providers publish alongside their fixtures.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::MalformedInput;
use crate::scoregrid::Side;

/// Used in place of a league average that is missing, zero or non-finite.
pub const DEFAULT_BASELINE: f64 = 1.0;

static TEAM_SUMMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"近(\d+)场战绩(\d+)胜(\d+)平(\d+)负进(\d+)球失(\d+)球").unwrap());

static HEAD_TO_HEAD_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"双方近(\d+)次交战，([^，]+?)(\d+)胜(\d+)平(\d+)负，进(\d+)球，失(\d+)球，大球(\d+)次，小球(\d+)次")
        .unwrap()
});

/// Goals scored and conceded in the first halves of a team's matches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfTimeRecord {
    pub matches: u16,
    pub goals_for: u16,
    pub goals_against: u16,
}
impl HalfTimeRecord {
    /// Tallies half-time scorelines, each written `home:away` and paired with the side the team
    /// played on. Scorelines that do not parse, or that would overflow the running totals, are
    /// skipped.
    pub fn tally<'a>(scores: impl IntoIterator<Item = (&'a str, Side)>) -> Self {
        let mut record = Self::default();
        for (score, side) in scores {
            let Ok((home, away)) = parse_half_score(score) else {
                continue;
            };
            let (scored, conceded) = match side {
                Side::Home => (home, away),
                Side::Away => (away, home),
            };
            match record.add(scored, conceded) {
                Some(updated) => record = updated,
                None => warn!("skipping half-time score '{score}': totals would overflow"),
            }
        }
        record
    }

    fn add(&self, scored: u16, conceded: u16) -> Option<Self> {
        Some(Self {
            matches: self.matches.checked_add(1)?,
            goals_for: self.goals_for.checked_add(scored)?,
            goals_against: self.goals_against.checked_add(conceded)?,
        })
    }

    pub fn avg_goals_for(&self) -> Option<f64> {
        average(self.goals_for, self.matches)
    }

    pub fn avg_goals_against(&self) -> Option<f64> {
        average(self.goals_against, self.matches)
    }
}

fn parse_half_score(score: &str) -> Result<(u16, u16), MalformedInput> {
    let malformed = || MalformedInput::Summary(score.to_string());
    let (home, away) = score.split_once(':').ok_or_else(malformed)?;
    let home = home.trim().parse().map_err(|_| malformed())?;
    let away = away.trim().parse().map_err(|_| malformed())?;
    Ok((home, away))
}

fn average(total: u16, matches: u16) -> Option<f64> {
    if matches == 0 {
        None
    } else {
        Some(total as f64 / matches as f64)
    }
}

fn rate(count: u16, matches: u16) -> f64 {
    average(count, matches).unwrap_or_default()
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRecord {
    pub matches: u16,
    pub wins: u16,
    pub draws: u16,
    pub losses: u16,
    pub goals_for: u16,
    pub goals_against: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_time: Option<HalfTimeRecord>,

    /// Matches that went over the goal line; reported only for head-to-head history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overs: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unders: Option<u16>,
}
impl FormRecord {
    pub fn new(
        matches: u16,
        wins: u16,
        draws: u16,
        losses: u16,
        goals_for: u16,
        goals_against: u16,
    ) -> Self {
        Self {
            matches,
            wins,
            draws,
            losses,
            goals_for,
            goals_against,
            half_time: None,
            overs: None,
            unders: None,
        }
    }

    pub fn with_half_time(mut self, half_time: HalfTimeRecord) -> Self {
        self.half_time = Some(half_time);
        self
    }

    pub fn validate(&self) -> Result<(), MalformedInput> {
        if self.wins as u32 + self.draws as u32 + self.losses as u32 != self.matches as u32 {
            return Err(MalformedInput::Record {
                matches: self.matches,
                wins: self.wins,
                draws: self.draws,
                losses: self.losses,
            });
        }
        Ok(())
    }

    /// A record contributes to an estimate only if it is consistent and covers at least one match.
    pub fn is_usable(&self) -> bool {
        self.matches > 0 && self.validate().is_ok()
    }

    pub fn avg_goals_for(&self) -> Option<f64> {
        average(self.goals_for, self.matches)
    }

    pub fn avg_goals_against(&self) -> Option<f64> {
        average(self.goals_against, self.matches)
    }

    pub fn win_rate(&self) -> f64 {
        rate(self.wins, self.matches)
    }

    pub fn draw_rate(&self) -> f64 {
        rate(self.draws, self.matches)
    }

    pub fn loss_rate(&self) -> f64 {
        rate(self.losses, self.matches)
    }

    pub fn over_rate(&self) -> Option<f64> {
        average(self.overs?, self.matches)
    }

    pub fn under_rate(&self) -> Option<f64> {
        average(self.unders?, self.matches)
    }

    /// Parses a team summary such as `近10场战绩6胜2平2负进18球失9球`.
    pub fn parse_summary(text: &str) -> Result<Self, MalformedInput> {
        let captures = TEAM_SUMMARY
            .captures(text)
            .ok_or_else(|| MalformedInput::Summary(text.to_string()))?;
        let field = |index| capture_u16(&captures, index, text);
        let record = Self::new(field(1)?, field(2)?, field(3)?, field(4)?, field(5)?, field(6)?);
        record.validate()?;
        Ok(record)
    }
}

fn capture_u16(captures: &regex::Captures, index: usize, text: &str) -> Result<u16, MalformedInput> {
    captures
        .get(index)
        .and_then(|matched| matched.as_str().parse().ok())
        .ok_or_else(|| MalformedInput::Summary(text.to_string()))
}

/// Head-to-head history, reported from the point of view of one of the two teams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub dominant: String,
    pub record: FormRecord,
}
impl HeadToHead {
    /// Parses a summary such as `双方近6次交战，拉齐奥4胜0平2负，进12球，失7球，大球4次，小球2次`.
    pub fn parse_summary(text: &str) -> Result<Self, MalformedInput> {
        let captures = HEAD_TO_HEAD_SUMMARY
            .captures(text)
            .ok_or_else(|| MalformedInput::Summary(text.to_string()))?;
        let field = |index| capture_u16(&captures, index, text);
        let mut record = FormRecord::new(field(1)?, field(3)?, field(4)?, field(5)?, field(6)?, field(7)?);
        record.overs = Some(field(8)?);
        record.unders = Some(field(9)?);
        record.validate()?;
        Ok(Self {
            dominant: captures[2].to_string(),
            record,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormPair {
    pub home: FormRecord,
    pub away: FormRecord,
}
impl FormPair {
    pub fn is_usable(&self) -> bool {
        self.home.is_usable() && self.away.is_usable()
    }

    pub fn get(&self, side: Side) -> &FormRecord {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

/// League-wide average goals per match scored by home and by away sides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeagueBaseline {
    pub home_goals: f64,
    pub away_goals: f64,
}
impl LeagueBaseline {
    pub fn for_side(baseline: Option<&LeagueBaseline>, side: Side) -> f64 {
        let goals = match (baseline, side) {
            (Some(baseline), Side::Home) => baseline.home_goals,
            (Some(baseline), Side::Away) => baseline.away_goals,
            (None, _) => DEFAULT_BASELINE,
        };
        if goals.is_finite() && goals > 0.0 {
            goals
        } else {
            DEFAULT_BASELINE
        }
    }
}
