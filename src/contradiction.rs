//! Cross-checks a consensus recommendation against the signals it was blended from.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consensus::ConsensusResult;
use crate::form::FormPair;
use crate::scoregrid::{MatchOutcome, Side};
use crate::xg::GoalRates;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContradictionThresholds {
    /// Largest tolerated gap, in percentage points, between a source and the consensus score.
    pub max_divergence_pct: f64,

    pub weak_form_win_rate_pct: f64,
    pub strong_form_win_rate_pct: f64,

    /// Largest tolerated shortfall of the recommended side's goal rate behind its opponent's.
    pub max_xg_deficit: f64,
}
impl Default for ContradictionThresholds {
    fn default() -> Self {
        Self {
            max_divergence_pct: 25.0,
            weak_form_win_rate_pct: 20.0,
            strong_form_win_rate_pct: 40.0,
            max_xg_deficit: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Contradiction {
    OddsDivergence {
        outcome: MatchOutcome,
        odds_pct: f64,
        consensus_pct: f64,
    },
    PoissonDivergence {
        outcome: MatchOutcome,
        poisson_pct: f64,
        consensus_pct: f64,
    },
    FormAgainst {
        side: Side,
        win_rate_pct: f64,
        opponent_win_rate_pct: f64,
    },
    ExpectedGoalsAgainst {
        side: Side,
        rate: f64,
        opponent_rate: f64,
    },
}

impl Display for Contradiction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Contradiction::OddsDivergence {
                outcome,
                odds_pct,
                consensus_pct,
            } => write!(
                f,
                "odds imply {odds_pct:.1}% for {} against a consensus of {consensus_pct:.1}%",
                describe(*outcome)
            ),
            Contradiction::PoissonDivergence {
                outcome,
                poisson_pct,
                consensus_pct,
            } => write!(
                f,
                "Poisson model gives {poisson_pct:.1}% for {} against a consensus of {consensus_pct:.1}%",
                describe(*outcome)
            ),
            Contradiction::FormAgainst {
                side,
                win_rate_pct,
                opponent_win_rate_pct,
            } => write!(
                f,
                "{side} side has won {win_rate_pct:.0}% of recent matches while the {} side has won {opponent_win_rate_pct:.0}%",
                side.opponent()
            ),
            Contradiction::ExpectedGoalsAgainst {
                side,
                rate,
                opponent_rate,
            } => write!(
                f,
                "{side} side's expected goals {rate:.2} trail the {} side's {opponent_rate:.2}",
                side.opponent()
            ),
        }
    }
}

fn describe(outcome: MatchOutcome) -> &'static str {
    match outcome {
        MatchOutcome::Home => "a home win",
        MatchOutcome::Draw => "a draw",
        MatchOutcome::Away => "an away win",
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContradictionReport {
    pub warnings: Vec<Contradiction>,
}
impl ContradictionReport {
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Runs every check independently against the recommended outcome. Form and goal-rate checks
/// apply only when a side is recommended.
pub fn detect(
    consensus: &ConsensusResult,
    recent: &FormPair,
    goal_rates: &GoalRates,
    thresholds: &ContradictionThresholds,
) -> ContradictionReport {
    let outcome = consensus.recommendation;
    let consensus_pct = consensus.recommended_score();
    let mut warnings = vec![];

    if let Some(odds) = &consensus.odds_share {
        let odds_pct = odds.get(outcome);
        if (odds_pct - consensus_pct).abs() > thresholds.max_divergence_pct {
            warnings.push(Contradiction::OddsDivergence {
                outcome,
                odds_pct,
                consensus_pct,
            });
        }
    }

    let poisson_pct = consensus.poisson_share.get(outcome);
    if (poisson_pct - consensus_pct).abs() > thresholds.max_divergence_pct {
        warnings.push(Contradiction::PoissonDivergence {
            outcome,
            poisson_pct,
            consensus_pct,
        });
    }

    if let Some(side) = outcome.side() {
        if recent.is_usable() {
            let win_rate_pct = recent.get(side).win_rate() * 100.0;
            let opponent_win_rate_pct = recent.get(side.opponent()).win_rate() * 100.0;
            if win_rate_pct < thresholds.weak_form_win_rate_pct
                && opponent_win_rate_pct > thresholds.strong_form_win_rate_pct
            {
                warnings.push(Contradiction::FormAgainst {
                    side,
                    win_rate_pct,
                    opponent_win_rate_pct,
                });
            }
        }

        let rate = goal_rates.get(side);
        let opponent_rate = goal_rates.get(side.opponent());
        if rate < opponent_rate - thresholds.max_xg_deficit {
            warnings.push(Contradiction::ExpectedGoalsAgainst {
                side,
                rate,
                opponent_rate,
            });
        }
    }

    for warning in &warnings {
        debug!("contradiction: {warning}");
    }
    ContradictionReport { warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{BlendSchedule, Confidence};
    use crate::form::FormRecord;
    use crate::scoregrid::ThreeWay;

    fn consensus(
        recommendation: MatchOutcome,
        scores: ThreeWay,
        odds_share: Option<ThreeWay>,
        poisson_share: ThreeWay,
    ) -> ConsensusResult {
        ConsensusResult {
            scores,
            recommendation,
            confidence: Confidence::Low,
            schedule: BlendSchedule::OddsAndModel,
            signals: vec![],
            odds_share,
            xg_share: ThreeWay::new(50.0, 0.0, 50.0),
            poisson_share,
        }
    }

    fn neutral_form() -> FormPair {
        FormPair {
            home: FormRecord::new(10, 4, 3, 3, 12, 12),
            away: FormRecord::new(10, 4, 3, 3, 12, 12),
        }
    }

    #[test]
    fn agreement_is_silent() {
        let consensus = consensus(
            MatchOutcome::Home,
            ThreeWay::new(55.0, 20.0, 25.0),
            Some(ThreeWay::new(52.0, 27.0, 21.0)),
            ThreeWay::new(53.0, 23.0, 23.0),
        );
        let report = detect(
            &consensus,
            &neutral_form(),
            &GoalRates::new(1.8, 1.1),
            &Default::default(),
        );
        assert!(report.is_empty());
    }

    #[test]
    fn divergence_is_strictly_beyond_threshold() {
        let consensus = consensus(
            MatchOutcome::Home,
            ThreeWay::new(50.0, 25.0, 25.0),
            Some(ThreeWay::new(75.0, 15.0, 10.0)),
            ThreeWay::new(24.9, 40.0, 35.1),
        );
        let report = detect(
            &consensus,
            &neutral_form(),
            &GoalRates::new(1.2, 1.2),
            &Default::default(),
        );
        assert_eq!(1, report.warnings.len());
        assert!(matches!(
            report.warnings[0],
            Contradiction::PoissonDivergence {
                outcome: MatchOutcome::Home,
                ..
            }
        ));
    }

    #[test]
    fn draw_divergence_is_checked() {
        let consensus = consensus(
            MatchOutcome::Draw,
            ThreeWay::new(30.0, 40.0, 30.0),
            Some(ThreeWay::new(45.0, 10.0, 45.0)),
            ThreeWay::new(20.0, 70.0, 10.0),
        );
        let report = detect(
            &consensus,
            &neutral_form(),
            &GoalRates::new(0.2, 2.5),
            &Default::default(),
        );
        assert_eq!(2, report.warnings.len());
        assert!(matches!(report.warnings[0], Contradiction::OddsDivergence { .. }));
        assert!(matches!(report.warnings[1], Contradiction::PoissonDivergence { .. }));
    }

    #[test]
    fn form_and_goal_rates_against_away() {
        let consensus = consensus(
            MatchOutcome::Away,
            ThreeWay::new(30.0, 25.0, 45.0),
            None,
            ThreeWay::new(35.0, 25.0, 40.0),
        );
        let recent = FormPair {
            home: FormRecord::new(10, 5, 3, 2, 15, 8),
            away: FormRecord::new(10, 1, 4, 5, 8, 14),
        };
        let report = detect(&consensus, &recent, &GoalRates::new(1.9, 1.3), &Default::default());
        assert_eq!(
            vec![
                Contradiction::FormAgainst {
                    side: Side::Away,
                    win_rate_pct: 10.0,
                    opponent_win_rate_pct: 50.0
                },
                Contradiction::ExpectedGoalsAgainst {
                    side: Side::Away,
                    rate: 1.3,
                    opponent_rate: 1.9
                }
            ],
            report.warnings
        );
        assert_eq!(
            "away side has won 10% of recent matches while the home side has won 50%",
            report.messages()[0].to_lowercase()
        );
    }

    #[test]
    fn custom_thresholds() {
        let consensus = consensus(
            MatchOutcome::Home,
            ThreeWay::new(50.0, 25.0, 25.0),
            None,
            ThreeWay::new(45.0, 25.0, 30.0),
        );
        let thresholds = ContradictionThresholds {
            max_divergence_pct: 4.0,
            max_xg_deficit: 0.0,
            ..Default::default()
        };
        let report = detect(&consensus, &neutral_form(), &GoalRates::new(1.0, 1.1), &thresholds);
        assert_eq!(2, report.warnings.len());
    }
}
