//! Blends market-implied and model-derived probabilities into one home/draw/away score, picks a
//! recommendation and grades its confidence. Scores are in percentage points.

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::debug;

use crate::distribution::OutcomeDistribution;
use crate::scoregrid::{MatchOutcome, ThreeWay};
use crate::xg::{GoalRateEstimate, GoalRates, Source};

/// Order in which tied outcomes are preferred.
pub const TIE_BREAK_PRECEDENCE: [MatchOutcome; 3] =
    [MatchOutcome::Home, MatchOutcome::Away, MatchOutcome::Draw];

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum BlendSchedule {
    /// Fair three-way prices are available.
    OddsAndModel,

    ModelOnly,
}
impl BlendSchedule {
    /// Weights of the odds, xG-share and Poisson components.
    pub fn weights(&self) -> (f64, f64, f64) {
        match self {
            BlendSchedule::OddsAndModel => (0.5, 0.3, 0.2),
            BlendSchedule::ModelOnly => (0.0, 0.55, 0.45),
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub high_pct: f64,
    pub medium_pct: f64,
    pub draw_high_pct: f64,
    pub draw_medium_pct: f64,
}
impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high_pct: 60.0,
            medium_pct: 45.0,
            draw_high_pct: 60.0,
            draw_medium_pct: 40.0,
        }
    }
}
impl ConfidenceThresholds {
    pub fn grade(&self, outcome: MatchOutcome, score: f64) -> Confidence {
        let (high, medium) = match outcome {
            MatchOutcome::Draw => (self.draw_high_pct, self.draw_medium_pct),
            MatchOutcome::Home | MatchOutcome::Away => (self.high_pct, self.medium_pct),
        };
        if score > high {
            Confidence::High
        } else if score > medium {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// An input that informed the consensus.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Signal {
    #[strum(serialize = "three-way odds")]
    ThreeWayOdds,

    #[strum(serialize = "home/away form")]
    HomeAwayForm,

    #[strum(serialize = "recent form")]
    RecentForm,

    #[strum(serialize = "head-to-head form")]
    HeadToHeadForm,
}
impl From<Source> for Signal {
    fn from(source: Source) -> Self {
        match source {
            Source::HomeAway => Signal::HomeAwayForm,
            Source::Recent => Signal::RecentForm,
            Source::HeadToHead => Signal::HeadToHeadForm,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub scores: ThreeWay,
    pub recommendation: MatchOutcome,
    pub confidence: Confidence,
    pub schedule: BlendSchedule,
    pub signals: Vec<Signal>,

    pub odds_share: Option<ThreeWay>,
    pub xg_share: ThreeWay,
    pub poisson_share: ThreeWay,
}
impl ConsensusResult {
    pub fn recommended_score(&self) -> f64 {
        self.scores.get(self.recommendation)
    }
}

/// Each side's share of the combined goal rate; the draw takes whatever remains.
pub fn xg_share(rates: &GoalRates) -> ThreeWay {
    let total = rates.home + rates.away;
    let (home, away) = if total > 0.0 {
        (rates.home / total * 100.0, rates.away / total * 100.0)
    } else {
        (0.0, 0.0)
    };
    ThreeWay::new(home, f64::max(0.0, 100.0 - home - away), away)
}

fn to_percent(probs: &ThreeWay) -> ThreeWay {
    ThreeWay::new(probs.home * 100.0, probs.draw * 100.0, probs.away * 100.0)
}

/// The highest-scoring outcome, with ties going to the earlier entry of [TIE_BREAK_PRECEDENCE].
pub fn recommend(scores: &ThreeWay) -> MatchOutcome {
    let mut best = TIE_BREAK_PRECEDENCE[0];
    for outcome in &TIE_BREAK_PRECEDENCE[1..] {
        if scores.get(*outcome) > scores.get(best) {
            best = *outcome;
        }
    }
    best
}

/// Blends the fair three-way probabilities (when the market is available) with the xG share
/// and the full-time Poisson probabilities.
pub fn score(
    odds_fair: Option<&ThreeWay>,
    estimate: &GoalRateEstimate,
    full_time: &OutcomeDistribution,
    thresholds: &ConfidenceThresholds,
) -> ConsensusResult {
    let schedule = match odds_fair {
        Some(_) => BlendSchedule::OddsAndModel,
        None => BlendSchedule::ModelOnly,
    };
    let (odds_weight, xg_weight, poisson_weight) = schedule.weights();
    let odds_share = odds_fair.map(to_percent);
    let xg_share = xg_share(&estimate.full_time);
    let poisson_share = to_percent(&full_time.probs);

    let blend = |outcome| {
        odds_share
            .as_ref()
            .map(|odds| odds_weight * odds.get(outcome))
            .unwrap_or_default()
            + xg_weight * xg_share.get(outcome)
            + poisson_weight * poisson_share.get(outcome)
    };
    let scores = ThreeWay::new(
        blend(MatchOutcome::Home),
        blend(MatchOutcome::Draw),
        blend(MatchOutcome::Away),
    );
    let recommendation = recommend(&scores);
    let confidence = thresholds.grade(recommendation, scores.get(recommendation));

    let mut signals = Vec::with_capacity(4);
    if odds_share.is_some() {
        signals.push(Signal::ThreeWayOdds);
    }
    signals.extend(estimate.sources().map(Signal::from));

    debug!(
        "consensus {recommendation} ({confidence}) from {schedule}: {:.2}/{:.2}/{:.2}",
        scores.home, scores.draw, scores.away
    );
    ConsensusResult {
        scores,
        recommendation,
        confidence,
        schedule,
        signals,
        odds_share,
        xg_share,
        poisson_share,
    }
}
