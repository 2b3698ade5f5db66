//! The joint scoreline grid of two independent Poisson goal processes, and the outcomes that
//! can be gathered from it.

use ordinalizer::Ordinal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount, EnumIter};

use crate::linear::Matrix;
use crate::poisson;

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Score {
    pub home: u8,
    pub away: u8,
}
impl Score {
    pub fn new(home: u8, away: u8) -> Self {
        Self { home, away }
    }

    pub fn nil_all() -> Self {
        Self { home: 0, away: 0 }
    }

    pub fn total(&self) -> u16 {
        self.home as u16 + self.away as u16
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Side {
    Home,
    Away,
}
impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// Result of a match (or of a half) from the home side's perspective.
#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Ordinal, EnumIter, EnumCount, Display,
)]
pub enum MatchOutcome {
    #[strum(serialize = "H")]
    Home,

    #[strum(serialize = "D")]
    Draw,

    #[strum(serialize = "A")]
    Away,
}
impl MatchOutcome {
    pub fn of(score: &Score) -> Self {
        match score.home.cmp(&score.away) {
            std::cmp::Ordering::Greater => MatchOutcome::Home,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
            std::cmp::Ordering::Less => MatchOutcome::Away,
        }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            MatchOutcome::Home => Some(Side::Home),
            MatchOutcome::Draw => None,
            MatchOutcome::Away => Some(Side::Away),
        }
    }
}

/// A value for each of home, draw and away.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreeWay {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}
impl ThreeWay {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    pub fn get(&self, outcome: MatchOutcome) -> f64 {
        match outcome {
            MatchOutcome::Home => self.home,
            MatchOutcome::Draw => self.draw,
            MatchOutcome::Away => self.away,
        }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.home, self.draw, self.away]
    }
}

/// Fills the grid with the product of two independent Poisson mass functions: rows are home
/// goals, columns away goals. Mass beyond the grid's extent is not captured.
pub fn from_univariate_poisson(home_rate: f64, away_rate: f64, scoregrid: &mut Matrix) {
    let home_probs = poisson::series(home_rate, (scoregrid.rows() - 1) as u8);
    let away_probs = poisson::series(away_rate, (scoregrid.cols() - 1) as u8);
    for (home_goals, home_prob) in home_probs.iter().enumerate() {
        for (away_goals, away_prob) in away_probs.iter().enumerate() {
            scoregrid[(home_goals, away_goals)] = home_prob * away_prob;
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Outcome {
    Win(Side),
    Draw,
    GoalsUnder(u8),
    GoalsOver(u8),
    CorrectScore(Score),
}
impl Outcome {
    pub fn gather(&self, scoregrid: &Matrix) -> f64 {
        match self {
            Outcome::Win(Side::Home) => scoregrid.sum_where(|home, away| home > away),
            Outcome::Win(Side::Away) => scoregrid.sum_where(|home, away| home < away),
            Outcome::Draw => scoregrid.sum_where(|home, away| home == away),
            Outcome::GoalsUnder(goals) => {
                let goals = *goals as usize;
                scoregrid.sum_where(|home, away| home + away < goals)
            }
            Outcome::GoalsOver(goals) => {
                let goals = *goals as usize;
                scoregrid.sum_where(|home, away| home + away > goals)
            }
            Outcome::CorrectScore(score) => {
                let (home, away) = (score.home as usize, score.away as usize);
                if home < scoregrid.rows() && away < scoregrid.cols() {
                    scoregrid[(home, away)]
                } else {
                    0.0
                }
            }
        }
    }
}

impl From<MatchOutcome> for Outcome {
    fn from(outcome: MatchOutcome) -> Self {
        match outcome.side() {
            Some(side) => Outcome::Win(side),
            None => Outcome::Draw,
        }
    }
}
