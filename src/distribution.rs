//! Outcome distributions derived from a pair of goal rates via the independent-Poisson scoregrid.

use ordinalizer::Ordinal;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};

use crate::linear::Matrix;
use crate::poisson;
use crate::probs::SliceExt;
use crate::scoregrid::{self, MatchOutcome, Outcome, Score, Side, ThreeWay};
use crate::xg::GoalRates;

/// Highest goal count per side on the scoregrid.
pub const GRID_GOALS: u8 = 8;

/// Highest goal count per side considered for the most-likely scorelines.
pub const SCORELINE_GOALS: u8 = 4;

/// Scorelines at or below this probability are left off the most-likely list.
pub const MIN_SCORELINE_PROB: f64 = 0.001;

pub const TOP_SCORELINES: usize = 10;

/// Highest goal count in each side's marginal distribution.
pub const SIDE_GOALS: u8 = 6;

/// Highest combined goal count in the total-goals distribution.
pub const TOTAL_GOALS: u8 = 12;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbableScore {
    pub score: Score,
    pub probability: f64,
}

fn allocate_scoregrid(rates: &GoalRates) -> Matrix {
    let size = GRID_GOALS as usize + 1;
    let mut scoregrid = Matrix::allocate(size, size);
    scoregrid::from_univariate_poisson(rates.home, rates.away, &mut scoregrid);
    scoregrid
}

fn gather_three_way(scoregrid: &Matrix) -> ThreeWay {
    ThreeWay::new(
        Outcome::Win(Side::Home).gather(scoregrid),
        Outcome::Draw.gather(scoregrid),
        Outcome::Win(Side::Away).gather(scoregrid),
    )
}

/// Home/draw/away probabilities summed over the truncated grid. The three sum to
/// [OutcomeDistribution::captured_mass] rather than exactly 1.
pub fn three_way(rates: &GoalRates) -> ThreeWay {
    gather_three_way(&allocate_scoregrid(rates))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDistribution {
    pub rates: GoalRates,
    pub probs: ThreeWay,

    /// Most likely scorelines, descending by probability.
    pub scorelines: Vec<ProbableScore>,

    pub home_goals: Vec<f64>,
    pub away_goals: Vec<f64>,
    pub total_goals: Vec<f64>,

    /// Probability mass within the truncated scoregrid.
    pub captured_mass: f64,
}
impl OutcomeDistribution {
    pub fn from_rates(rates: &GoalRates) -> Self {
        let scoregrid = allocate_scoregrid(rates);
        let probs = gather_three_way(&scoregrid);

        let mut scorelines = Vec::with_capacity((SCORELINE_GOALS as usize + 1).pow(2));
        for home in 0..=SCORELINE_GOALS {
            for away in 0..=SCORELINE_GOALS {
                let probability = scoregrid[(home as usize, away as usize)];
                if probability > MIN_SCORELINE_PROB {
                    scorelines.push(ProbableScore {
                        score: Score::new(home, away),
                        probability,
                    });
                }
            }
        }
        scorelines.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        scorelines.truncate(TOP_SCORELINES);

        let home_totals = poisson::series(rates.home, TOTAL_GOALS);
        let away_totals = poisson::series(rates.away, TOTAL_GOALS);
        let total_goals = (0..=TOTAL_GOALS as usize)
            .map(|total| {
                (0..=total)
                    .map(|home| home_totals[home] * away_totals[total - home])
                    .sum::<f64>()
            })
            .collect::<Vec<_>>();

        Self {
            rates: rates.clone(),
            probs,
            scorelines,
            home_goals: poisson::series(rates.home, SIDE_GOALS),
            away_goals: poisson::series(rates.away, SIDE_GOALS),
            total_goals,
            captured_mass: scoregrid.flatten().sum(),
        }
    }

    pub fn probability(&self, outcome: MatchOutcome) -> f64 {
        self.probs.get(outcome)
    }

    pub fn most_likely(&self) -> Option<&ProbableScore> {
        self.scorelines.first()
    }

    /// Probability that more than `line` goals are scored in total.
    pub fn over(&self, line: f64) -> f64 {
        self.total_goals_where(|total| total > line)
    }

    /// Probability that fewer than `line` goals are scored in total.
    pub fn under(&self, line: f64) -> f64 {
        self.total_goals_where(|total| total < line)
    }

    fn total_goals_where(&self, predicate: impl Fn(f64) -> bool) -> f64 {
        self.total_goals
            .iter()
            .enumerate()
            .filter(|(total, _)| predicate(*total as f64))
            .map(|(_, prob)| prob)
            .sum()
    }
}

/// One of the nine half-time/full-time result combinations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HalfFull {
    pub half: MatchOutcome,
    pub full: MatchOutcome,
    pub probability: f64,
}
impl HalfFull {
    pub fn label(&self) -> String {
        format!("{}{}", self.half, self.full)
    }
}

/// Joint distribution of the half-time and full-time results.
///
/// Treats first-half and full-time goal counts as independent of each other, which they are not
/// in a real match: a side leading at the break has already banked those goals. Each bucket is
/// therefore the product of the half-time and full-time result probabilities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HalfFullDistribution {
    pub buckets: Vec<HalfFull>,
}
impl HalfFullDistribution {
    pub fn from_rates(half_time: &GoalRates, full_time: &GoalRates) -> Self {
        Self::from_three_ways(&three_way(half_time), &three_way(full_time))
    }

    pub fn from_three_ways(half_time: &ThreeWay, full_time: &ThreeWay) -> Self {
        let mut buckets = Vec::with_capacity(MatchOutcome::COUNT.pow(2));
        for half in MatchOutcome::iter() {
            for full in MatchOutcome::iter() {
                buckets.push(HalfFull {
                    half,
                    full,
                    probability: half_time.get(half) * full_time.get(full),
                });
            }
        }
        Self { buckets }
    }

    pub fn probability(&self, half: MatchOutcome, full: MatchOutcome) -> f64 {
        self.buckets[half.ordinal() * MatchOutcome::COUNT + full.ordinal()].probability
    }
}
