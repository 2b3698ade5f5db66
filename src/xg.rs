//! Expected-goals estimation: per-source attack/defence products normalised by the league
//! baseline, blended under a weight schedule chosen by which sources are available.

use ordinalizer::Ordinal;
use serde::{Deserialize, Serialize};
use strum::EnumCount;
use strum_macros::{Display, EnumCount, EnumIter};
use tracing::debug;

use crate::error::InsufficientData;
use crate::form::{FormPair, FormRecord, HalfTimeRecord, LeagueBaseline};
use crate::scoregrid::Side;

/// Share of the full-time goal rate attributed to the first half. Assumes goals are spread
/// uniformly across both halves.
pub const HALF_TIME_SPLIT_RATIO: f64 = 0.5;

#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Ordinal, EnumCount, EnumIter, Display,
)]
pub enum Source {
    #[strum(serialize = "home/away")]
    HomeAway,

    #[strum(serialize = "recent")]
    Recent,

    #[strum(serialize = "head-to-head")]
    HeadToHead,
}

/// Blend weights keyed by data availability.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, EnumIter, Display)]
pub enum Schedule {
    Full,
    NoHeadToHead,
    NoHomeAway,
    NoRecent,
    HomeAwayOnly,
    RecentOnly,
    HeadToHeadOnly,
}
impl Schedule {
    /// Weights indexed by [Source] ordinal.
    pub fn weights(&self) -> [f64; Source::COUNT] {
        match self {
            Schedule::Full => [0.5, 0.3, 0.2],
            Schedule::NoHeadToHead => [0.65, 0.35, 0.0],
            Schedule::NoHomeAway => [0.0, 0.6, 0.4],
            Schedule::NoRecent => [5.0 / 7.0, 0.0, 2.0 / 7.0],
            Schedule::HomeAwayOnly => [1.0, 0.0, 0.0],
            Schedule::RecentOnly => [0.0, 1.0, 0.0],
            Schedule::HeadToHeadOnly => [0.0, 0.0, 1.0],
        }
    }

    pub fn weight(&self, source: Source) -> f64 {
        self.weights()[source.ordinal()]
    }

    pub fn select(home_away: bool, recent: bool, head_to_head: bool) -> Option<Self> {
        match (home_away, recent, head_to_head) {
            (true, true, true) => Some(Schedule::Full),
            (true, true, false) => Some(Schedule::NoHeadToHead),
            (false, true, true) => Some(Schedule::NoHomeAway),
            (true, false, true) => Some(Schedule::NoRecent),
            (true, false, false) => Some(Schedule::HomeAwayOnly),
            (false, true, false) => Some(Schedule::RecentOnly),
            (false, false, true) => Some(Schedule::HeadToHeadOnly),
            (false, false, false) => None,
        }
    }
}

/// A non-negative, finite goal rate per side.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalRates {
    pub home: f64,
    pub away: f64,
}
impl GoalRates {
    pub fn new(home: f64, away: f64) -> Self {
        Self {
            home: sanitise(home),
            away: sanitise(away),
        }
    }

    pub fn get(&self, side: Side) -> f64 {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.home * factor, self.away * factor)
    }
}

fn sanitise(rate: f64) -> f64 {
    if rate.is_finite() {
        f64::max(0.0, rate)
    } else {
        0.0
    }
}

/// One source's rates and the weight they carry in the blend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub source: Source,
    pub weight: f64,
    pub rates: GoalRates,
}
impl Contribution {
    pub fn weighted(&self) -> GoalRates {
        self.rates.scaled(self.weight)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalRateEstimate {
    pub full_time: GoalRates,

    /// Full-time rates scaled by [HALF_TIME_SPLIT_RATIO].
    pub half_time: GoalRates,

    /// Derived from recorded first-half goals, when both sides' recent records carry them.
    pub recorded_half_time: Option<GoalRates>,

    pub schedule: Schedule,
    pub breakdown: Vec<Contribution>,
}
impl GoalRateEstimate {
    pub fn sources(&self) -> impl Iterator<Item = Source> + '_ {
        self.breakdown.iter().map(|contribution| contribution.source)
    }
}

/// Attack of one side against the defence of the other, normalised by the league average for
/// the attacking side's venue.
pub fn source_rates(pair: &FormPair, baseline: Option<&LeagueBaseline>) -> Option<GoalRates> {
    if !pair.is_usable() {
        return None;
    }
    let rate = |attacking: &FormRecord, defending: &FormRecord, side| {
        Some(
            attacking.avg_goals_for()? * defending.avg_goals_against()?
                / LeagueBaseline::for_side(baseline, side),
        )
    };
    Some(GoalRates::new(
        rate(&pair.home, &pair.away, Side::Home)?,
        rate(&pair.away, &pair.home, Side::Away)?,
    ))
}

/// Head-to-head history is reported from one side only, so its combined average for plus
/// average against is applied to both sides alike.
pub fn head_to_head_rates(record: &FormRecord) -> Option<GoalRates> {
    if !record.is_usable() {
        return None;
    }
    let combined = record.avg_goals_for()? + record.avg_goals_against()?;
    Some(GoalRates::new(combined, combined))
}

/// The attack/defence product over first-half records, against a halved baseline.
pub fn recorded_half_time_rates(
    home: &HalfTimeRecord,
    away: &HalfTimeRecord,
    baseline: Option<&LeagueBaseline>,
) -> Option<GoalRates> {
    let rate = |attacking: &HalfTimeRecord, defending: &HalfTimeRecord, side| {
        Some(
            attacking.avg_goals_for()? * defending.avg_goals_against()?
                / (LeagueBaseline::for_side(baseline, side) * HALF_TIME_SPLIT_RATIO),
        )
    };
    Some(GoalRates::new(
        rate(home, away, Side::Home)?,
        rate(away, home, Side::Away)?,
    ))
}

pub fn estimate(
    recent: &FormPair,
    home_away: Option<&FormPair>,
    head_to_head: Option<&FormRecord>,
    baseline: Option<&LeagueBaseline>,
) -> Result<GoalRateEstimate, InsufficientData> {
    let from_home_away = home_away.and_then(|pair| source_rates(pair, baseline));
    let from_recent = source_rates(recent, baseline);
    let from_head_to_head = head_to_head.and_then(head_to_head_rates);

    let schedule = Schedule::select(
        from_home_away.is_some(),
        from_recent.is_some(),
        from_head_to_head.is_some(),
    )
    .ok_or(InsufficientData)?;
    debug!("selected {schedule} weight schedule");

    let breakdown: Vec<_> = [
        (Source::HomeAway, from_home_away),
        (Source::Recent, from_recent),
        (Source::HeadToHead, from_head_to_head),
    ]
    .into_iter()
    .filter_map(|(source, rates)| {
        rates.map(|rates| Contribution {
            source,
            weight: schedule.weight(source),
            rates,
        })
    })
    .collect();

    let (mut home, mut away) = (0.0, 0.0);
    for contribution in &breakdown {
        let weighted = contribution.weighted();
        home += weighted.home;
        away += weighted.away;
    }
    let full_time = GoalRates::new(home, away);
    let half_time = full_time.scaled(HALF_TIME_SPLIT_RATIO);

    let recorded_half_time = match (&recent.home.half_time, &recent.away.half_time) {
        (Some(home), Some(away)) => recorded_half_time_rates(home, away, baseline),
        _ => None,
    };

    Ok(GoalRateEstimate {
        full_time,
        half_time,
        recorded_half_time,
        schedule,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probs::SliceExt;
    use assert_float_eq::*;
    use strum::IntoEnumIterator;

    fn baseline() -> LeagueBaseline {
        LeagueBaseline {
            home_goals: 1.5,
            away_goals: 1.2,
        }
    }

    fn recent() -> FormPair {
        FormPair {
            home: FormRecord::new(10, 6, 2, 2, 18, 9),
            away: FormRecord::new(10, 3, 3, 4, 12, 15),
        }
    }

    fn home_away() -> FormPair {
        FormPair {
            home: FormRecord::new(5, 4, 1, 0, 12, 3),
            away: FormRecord::new(5, 1, 1, 3, 4, 10),
        }
    }

    fn head_to_head() -> FormRecord {
        FormRecord::new(6, 4, 0, 2, 12, 7)
    }

    #[test]
    fn schedules_sum_to_one() {
        for schedule in Schedule::iter() {
            assert_float_absolute_eq!(1.0, schedule.weights().sum(), 1e-12);
        }
    }

    #[test]
    fn per_source_rates() {
        let recent = source_rates(&recent(), Some(&baseline())).unwrap();
        assert_float_absolute_eq!(1.8, recent.home, 1e-12);
        assert_float_absolute_eq!(0.9, recent.away, 1e-12);

        let home_away = source_rates(&home_away(), Some(&baseline())).unwrap();
        assert_float_absolute_eq!(3.2, home_away.home, 1e-12);
        assert_float_absolute_eq!(0.4, home_away.away, 1e-12);

        let head_to_head = head_to_head_rates(&head_to_head()).unwrap();
        assert_float_absolute_eq!(3.16667, head_to_head.home, 1e-5);
        assert_eq!(head_to_head.home, head_to_head.away);
    }

    #[test]
    fn missing_baseline_defaults_to_one() {
        let rates = source_rates(&recent(), None).unwrap();
        assert_float_absolute_eq!(2.7, rates.home, 1e-12);
        assert_float_absolute_eq!(1.08, rates.away, 1e-12);
    }

    #[test]
    fn full_blend() {
        let estimate =
            estimate(&recent(), Some(&home_away()), Some(&head_to_head()), Some(&baseline())).unwrap();
        assert_eq!(Schedule::Full, estimate.schedule);
        assert_float_absolute_eq!(2.77333, estimate.full_time.home, 1e-5);
        assert_float_absolute_eq!(1.10333, estimate.full_time.away, 1e-5);
        assert_float_absolute_eq!(1.38667, estimate.half_time.home, 1e-5);
        assert_float_absolute_eq!(0.55167, estimate.half_time.away, 1e-5);
        assert_eq!(
            vec![Source::HomeAway, Source::Recent, Source::HeadToHead],
            estimate.sources().collect::<Vec<_>>()
        );
        let contributed: f64 = estimate.breakdown.iter().map(|c| c.weighted().home).sum();
        assert_float_absolute_eq!(estimate.full_time.home, contributed, 1e-12);
        assert_eq!(None, estimate.recorded_half_time);
    }

    #[test]
    fn blend_without_head_to_head() {
        let estimate = estimate(&recent(), Some(&home_away()), None, Some(&baseline())).unwrap();
        assert_eq!(Schedule::NoHeadToHead, estimate.schedule);
        assert_float_absolute_eq!(2.71, estimate.full_time.home, 1e-9);
        assert_float_absolute_eq!(0.575, estimate.full_time.away, 1e-9);
    }

    #[test]
    fn empty_home_away_record_drops_the_source() {
        let mut home_away = home_away();
        home_away.home = FormRecord::default();
        let estimate =
            estimate(&recent(), Some(&home_away), Some(&head_to_head()), Some(&baseline())).unwrap();
        assert_eq!(Schedule::NoHomeAway, estimate.schedule);
        assert_float_absolute_eq!(2.34667, estimate.full_time.home, 1e-5);
        assert_float_absolute_eq!(1.80667, estimate.full_time.away, 1e-5);
        assert!(estimate.sources().all(|source| source != Source::HomeAway));
    }

    #[test]
    fn head_to_head_alone() {
        let no_recent = FormPair {
            home: FormRecord::default(),
            away: FormRecord::default(),
        };
        let estimate = estimate(&no_recent, None, Some(&head_to_head()), None).unwrap();
        assert_eq!(Schedule::HeadToHeadOnly, estimate.schedule);
        assert_eq!(estimate.full_time.home, estimate.full_time.away);
    }

    #[test]
    fn no_usable_source() {
        let no_recent = FormPair {
            home: FormRecord::default(),
            away: FormRecord::new(10, 3, 3, 4, 12, 15),
        };
        assert_eq!(
            Err(InsufficientData),
            estimate(&no_recent, None, Some(&FormRecord::default()), Some(&baseline()))
        );
    }

    #[test]
    fn recorded_half_time_track() {
        let mut recent = recent();
        recent.home = recent.home.with_half_time(HalfTimeRecord {
            matches: 10,
            goals_for: 8,
            goals_against: 4,
        });
        recent.away = recent.away.with_half_time(HalfTimeRecord {
            matches: 10,
            goals_for: 5,
            goals_against: 6,
        });
        let estimate = estimate(&recent, None, None, Some(&baseline())).unwrap();
        assert_eq!(Schedule::RecentOnly, estimate.schedule);
        let recorded = estimate.recorded_half_time.unwrap();
        assert_float_absolute_eq!(0.64, recorded.home, 1e-12);
        assert_float_absolute_eq!(0.33333, recorded.away, 1e-5);
        assert_float_absolute_eq!(0.9, estimate.half_time.home, 1e-12);
    }

    #[test]
    fn rates_are_never_negative_or_nan() {
        let rates = GoalRates::new(-0.1, f64::NAN);
        assert_eq!(GoalRates::new(0.0, 0.0), rates);
    }
}
