//! The end-to-end pipeline: normalised match inputs in, goal rates, distributions, consensus and
//! contradictions out.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::consensus::{self, ConsensusResult};
use crate::contradiction::{self, ContradictionReport};
use crate::distribution::{HalfFullDistribution, OutcomeDistribution};
use crate::error::{InsufficientData, UnavailableMarket};
use crate::form::{FormPair, FormRecord, HalfTimeRecord, HeadToHead, LeagueBaseline};
use crate::market::{Market, MarketSnapshot, MarketType, Phase, RawQuote};
use crate::scoregrid::{Side, ThreeWay};
use crate::xg::{self, GoalRateEstimate};

/// One evaluation's inputs, already normalised. Optional inputs may be absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchInput {
    #[serde(default)]
    pub three_way: Option<MarketSnapshot>,

    #[serde(default)]
    pub handicap: Option<MarketSnapshot>,

    #[serde(default)]
    pub totals: Option<MarketSnapshot>,

    pub recent: FormPair,

    #[serde(default)]
    pub home_away: Option<FormPair>,

    #[serde(default)]
    pub head_to_head: Option<FormRecord>,

    #[serde(default)]
    pub baseline: Option<LeagueBaseline>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HalfTimeScore {
    /// Written `home:away`.
    pub score: String,

    /// The side the team played on.
    pub side: Side,
}

/// A team's form as published by a provider: a summary line plus, optionally, the half-time
/// scores of the matches it covers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawTeamForm {
    pub summary: String,

    #[serde(default)]
    pub half_time_scores: Vec<HalfTimeScore>,
}
impl RawTeamForm {
    /// An unparsable summary yields an empty record, which no estimate will use.
    pub fn normalise(&self) -> FormRecord {
        let record = match FormRecord::parse_summary(&self.summary) {
            Ok(record) => record,
            Err(err) => {
                warn!("ignoring team form: {err}");
                return FormRecord::default();
            }
        };
        let half_time = HalfTimeRecord::tally(
            self.half_time_scores
                .iter()
                .map(|half_time| (half_time.score.as_str(), half_time.side)),
        );
        if half_time.matches > 0 {
            record.with_half_time(half_time)
        } else {
            record
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawFormPair {
    pub home: RawTeamForm,
    pub away: RawTeamForm,
}
impl RawFormPair {
    pub fn normalise(&self) -> FormPair {
        FormPair {
            home: self.home.normalise(),
            away: self.away.normalise(),
        }
    }
}

/// One evaluation's inputs as captured upstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawMatchInput {
    #[serde(default)]
    pub three_way: Vec<RawQuote>,

    #[serde(default)]
    pub handicap: Vec<RawQuote>,

    #[serde(default)]
    pub totals: Vec<RawQuote>,

    pub recent: RawFormPair,

    #[serde(default)]
    pub home_away: Option<RawFormPair>,

    #[serde(default)]
    pub head_to_head: Option<String>,

    #[serde(default)]
    pub baseline: Option<LeagueBaseline>,
}
impl RawMatchInput {
    pub fn normalise(&self) -> MatchInput {
        let snapshot = |market_type, quotes: &[RawQuote]| {
            if quotes.is_empty() {
                None
            } else {
                Some(MarketSnapshot::from_raw(market_type, quotes))
            }
        };
        let head_to_head = self.head_to_head.as_ref().and_then(|summary| {
            match HeadToHead::parse_summary(summary) {
                Ok(head_to_head) => {
                    debug!("head-to-head reported for {}", head_to_head.dominant);
                    Some(head_to_head.record)
                }
                Err(err) => {
                    warn!("ignoring head-to-head: {err}");
                    None
                }
            }
        });

        MatchInput {
            three_way: snapshot(MarketType::ThreeWay, &self.three_way),
            handicap: snapshot(MarketType::Handicap, &self.handicap),
            totals: snapshot(MarketType::Totals, &self.totals),
            recent: self.recent.normalise(),
            home_away: self.home_away.as_ref().map(RawFormPair::normalise),
            head_to_head,
            baseline: self.baseline.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub market_type: MarketType,
    pub opening: Option<Market>,
    pub current: Option<Market>,
    pub opening_line: Option<f64>,
    pub current_line: Option<f64>,

    /// Current margin less opening margin, in percentage points.
    pub margin_drift: Option<f64>,
}
impl MarketSummary {
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        let fit = |phase| match snapshot.fit(phase) {
            Ok(market) => Some(market),
            Err(err) => {
                debug!("{err}");
                None
            }
        };
        let line = |phase| snapshot.phase(phase).and_then(|average| average.line);
        Self {
            market_type: snapshot.market_type,
            opening: fit(Phase::Opening),
            current: fit(Phase::Current),
            opening_line: line(Phase::Opening),
            current_line: line(Phase::Current),
            margin_drift: snapshot.margin_drift(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub goal_rates: GoalRateEstimate,
    pub full_time: OutcomeDistribution,
    pub half_time: OutcomeDistribution,
    pub half_full: HalfFullDistribution,
    pub markets: Vec<MarketSummary>,
    pub consensus: ConsensusResult,
    pub contradictions: ContradictionReport,
}

/// Fair probabilities of the current three-way prices.
fn fair_three_way(snapshot: &MarketSnapshot) -> Result<ThreeWay, UnavailableMarket> {
    if snapshot.market_type != MarketType::ThreeWay {
        return Err(UnavailableMarket::WrongType {
            expected: MarketType::ThreeWay,
            actual: snapshot.market_type,
        });
    }
    let market = snapshot.fit(Phase::Current)?;
    match market.probs[..] {
        [home, draw, away] => Ok(ThreeWay::new(home, draw, away)),
        _ => Err(UnavailableMarket::WrongArity {
            market_type: MarketType::ThreeWay,
            expected: MarketType::ThreeWay.options(),
            actual: market.probs.len(),
        }),
    }
}

pub fn evaluate(input: &MatchInput, config: &Config) -> Result<Evaluation, InsufficientData> {
    let goal_rates = xg::estimate(
        &input.recent,
        input.home_away.as_ref(),
        input.head_to_head.as_ref(),
        input.baseline.as_ref(),
    )?;
    debug!(
        "goal rates: full time {:.3}/{:.3}, half time {:.3}/{:.3}",
        goal_rates.full_time.home,
        goal_rates.full_time.away,
        goal_rates.half_time.home,
        goal_rates.half_time.away
    );

    let full_time = OutcomeDistribution::from_rates(&goal_rates.full_time);
    let half_time = OutcomeDistribution::from_rates(&goal_rates.half_time);
    let half_full = HalfFullDistribution::from_three_ways(&half_time.probs, &full_time.probs);

    let odds_fair = match input.three_way.as_ref().map(fair_three_way) {
        Some(Ok(fair)) => Some(fair),
        Some(Err(err)) => {
            debug!("three-way odds left out of the consensus: {err}");
            None
        }
        None => None,
    };
    let consensus = consensus::score(
        odds_fair.as_ref(),
        &goal_rates,
        &full_time,
        &config.confidence,
    );
    let contradictions = contradiction::detect(
        &consensus,
        &input.recent,
        &goal_rates.full_time,
        &config.contradiction,
    );

    let markets = [&input.three_way, &input.handicap, &input.totals]
        .into_iter()
        .flatten()
        .map(MarketSummary::from_snapshot)
        .collect();

    Ok(Evaluation {
        goal_rates,
        full_time,
        half_time,
        half_full,
        markets,
        consensus,
        contradictions,
    })
}

pub fn evaluate_raw(input: &RawMatchInput, config: &Config) -> Result<Evaluation, InsufficientData> {
    evaluate(&input.normalise(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{BlendSchedule, Confidence, Signal};
    use crate::scoregrid::MatchOutcome;
    use crate::xg::Schedule;
    use assert_float_eq::*;

    fn quote(provider: &str, opening: [&str; 3], current: [&str; 3]) -> RawQuote {
        RawQuote {
            provider: provider.into(),
            opening: opening.iter().map(|cell| cell.to_string()).collect(),
            current: current.iter().map(|cell| cell.to_string()).collect(),
        }
    }

    fn team(summary: &str) -> RawTeamForm {
        RawTeamForm {
            summary: summary.into(),
            half_time_scores: vec![],
        }
    }

    fn raw_input() -> RawMatchInput {
        RawMatchInput {
            three_way: vec![
                quote("A", ["1.85", "3.40", "4.20"], ["1.80↓", "3.50", "4.50↑"]),
                quote("B", ["1.90", "3.30", "4.00"], ["1.80", "3.50↑", "4.50"]),
                quote("C", ["-", "-", "-"], ["-", "-", "-"]),
            ],
            handicap: vec![quote("A", ["0.90", "半球", "0.96"], ["0.88", "半球/一球", "0.98"])],
            totals: vec![quote("A", ["0.92", "2.5", "0.94"], ["0.85", "2.5/3", "1.01"])],
            recent: RawFormPair {
                home: RawTeamForm {
                    summary: "近10场战绩6胜2平2负进18球失9球".into(),
                    half_time_scores: vec![
                        HalfTimeScore {
                            score: "1:0".into(),
                            side: Side::Home,
                        },
                        HalfTimeScore {
                            score: "0:0".into(),
                            side: Side::Away,
                        },
                    ],
                },
                away: team("近10场战绩3胜3平4负进12球失15球"),
            },
            home_away: Some(RawFormPair {
                home: team("近5场战绩4胜1平0负进12球失3球"),
                away: team("近5场战绩1胜1平3负进4球失10球"),
            }),
            head_to_head: Some("双方近6次交战，主队4胜0平2负，进12球，失7球，大球4次，小球2次".into()),
            baseline: Some(LeagueBaseline {
                home_goals: 1.5,
                away_goals: 1.2,
            }),
        }
    }

    #[test]
    fn normalise_raw_input() {
        let input = raw_input().normalise();
        let three_way = input.three_way.as_ref().unwrap();
        assert_eq!(2, three_way.current.as_ref().unwrap().providers);
        assert_eq!(Some(0.75), input.handicap.as_ref().unwrap().current.as_ref().unwrap().line);
        assert_eq!(Some(2.75), input.totals.as_ref().unwrap().current.as_ref().unwrap().line);
        assert_eq!(FormRecord::new(10, 3, 3, 4, 12, 15), input.recent.away);
        assert_eq!(
            Some(HalfTimeRecord {
                matches: 2,
                goals_for: 1,
                goals_against: 0
            }),
            input.recent.home.half_time
        );
        assert_eq!(6, input.head_to_head.as_ref().unwrap().matches);
    }

    #[test]
    fn evaluate_full_input() {
        let evaluation = evaluate_raw(&raw_input(), &Config::default()).unwrap();
        assert_eq!(Schedule::Full, evaluation.goal_rates.schedule);
        assert_float_absolute_eq!(2.77333, evaluation.goal_rates.full_time.home, 1e-5);
        assert_float_absolute_eq!(1.10333, evaluation.goal_rates.full_time.away, 1e-5);
        assert_float_absolute_eq!(evaluation.full_time.captured_mass, evaluation.full_time.probs.sum(), 1e-12);
        assert_float_absolute_eq!(0.997713, evaluation.full_time.captured_mass, 1e-6);
        assert_float_absolute_eq!(evaluation.half_time.captured_mass, evaluation.half_time.probs.sum(), 1e-12);
        assert_float_absolute_eq!(1.0, evaluation.half_time.probs.sum(), 1e-3);
        assert_eq!(9, evaluation.half_full.buckets.len());
        assert_eq!(3, evaluation.markets.len());

        let consensus = &evaluation.consensus;
        assert_eq!(BlendSchedule::OddsAndModel, consensus.schedule);
        assert_eq!(MatchOutcome::Home, consensus.recommendation);
        assert_eq!(
            vec![
                Signal::ThreeWayOdds,
                Signal::HomeAwayForm,
                Signal::RecentForm,
                Signal::HeadToHeadForm
            ],
            consensus.signals
        );
        assert_float_absolute_eq!(0.522388, consensus.odds_share.as_ref().unwrap().home / 100.0, 1e-6);
        assert!(consensus.confidence >= Confidence::Medium);
    }

    #[test]
    fn market_summaries() {
        let evaluation = evaluate_raw(&raw_input(), &Config::default()).unwrap();
        let three_way = &evaluation.markets[0];
        assert_eq!(MarketType::ThreeWay, three_way.market_type);
        assert_float_absolute_eq!(6.3492, three_way.current.as_ref().unwrap().margin, 0.0001);
        assert!(three_way.margin_drift.is_some());
        assert_eq!(None, three_way.current_line);

        let handicap = &evaluation.markets[1];
        assert_eq!(Some(0.5), handicap.opening_line);
        assert_eq!(Some(0.75), handicap.current_line);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let input = raw_input().normalise();
        let first = evaluate(&input, &Config::default()).unwrap();
        let second = evaluate(&input, &Config::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn without_odds_the_model_decides() {
        let mut raw = raw_input();
        raw.three_way.clear();
        let evaluation = evaluate_raw(&raw, &Config::default()).unwrap();
        assert_eq!(BlendSchedule::ModelOnly, evaluation.consensus.schedule);
        assert_eq!(2, evaluation.markets.len());
        assert!(!evaluation.consensus.signals.contains(&Signal::ThreeWayOdds));
    }

    #[test]
    fn malformed_odds_drop_out_of_the_consensus() {
        let mut raw = raw_input();
        raw.three_way = vec![quote("A", ["x", "y", "z"], ["", "", ""])];
        let evaluation = evaluate_raw(&raw, &Config::default()).unwrap();
        assert_eq!(BlendSchedule::ModelOnly, evaluation.consensus.schedule);
        assert_eq!(None, evaluation.markets[0].current);
    }

    #[test]
    fn two_way_snapshot_in_the_three_way_slot_is_left_out() {
        let mut input = raw_input().normalise();
        let totals = input.totals.clone().unwrap();
        assert_eq!(MarketType::Totals, totals.market_type);
        assert_eq!(
            Err(UnavailableMarket::WrongType {
                expected: MarketType::ThreeWay,
                actual: MarketType::Totals
            }),
            fair_three_way(&totals)
        );

        input.three_way = Some(totals);
        let evaluation = evaluate(&input, &Config::default()).unwrap();
        assert_eq!(BlendSchedule::ModelOnly, evaluation.consensus.schedule);
        assert_eq!(None, evaluation.consensus.odds_share);
        assert!(!evaluation.consensus.signals.contains(&Signal::ThreeWayOdds));
    }

    #[test]
    fn three_way_snapshot_with_two_prices_is_left_out() {
        let mut input = raw_input().normalise();
        input.three_way = Some(MarketSnapshot {
            market_type: MarketType::ThreeWay,
            opening: None,
            current: input.totals.as_ref().and_then(|totals| totals.current.clone()),
        });
        assert!(matches!(
            fair_three_way(input.three_way.as_ref().unwrap()),
            Err(UnavailableMarket::WrongArity { expected: 3, actual: 2, .. })
        ));
        let evaluation = evaluate(&input, &Config::default()).unwrap();
        assert_eq!(BlendSchedule::ModelOnly, evaluation.consensus.schedule);
    }

    #[test]
    fn empty_home_form_falls_back_to_recent_and_head_to_head() {
        let mut raw = raw_input();
        if let Some(home_away) = raw.home_away.as_mut() {
            home_away.home = team("近0场战绩0胜0平0负进0球失0球");
        }
        let evaluation = evaluate_raw(&raw, &Config::default()).unwrap();
        assert_eq!(Schedule::NoHomeAway, evaluation.goal_rates.schedule);
        assert!(!evaluation.consensus.signals.contains(&Signal::HomeAwayForm));
    }

    #[test]
    fn no_usable_form_is_insufficient_data() {
        let mut raw = raw_input();
        raw.recent.home = team("暂无数据");
        raw.home_away = None;
        raw.head_to_head = None;
        assert_eq!(
            Err(InsufficientData),
            evaluate_raw(&raw, &Config::default()).map(|_| ())
        );
    }

    #[test]
    fn optional_inputs_may_be_absent() {
        let input: MatchInput = serde_json::from_str(
            r#"{
                "recent": {
                    "home": {"matches": 10, "wins": 6, "draws": 2, "losses": 2, "goals_for": 18, "goals_against": 9},
                    "away": {"matches": 10, "wins": 3, "draws": 3, "losses": 4, "goals_for": 12, "goals_against": 15}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(None, input.three_way);
        assert_eq!(None, input.baseline);
        let evaluation = evaluate(&input, &Config::default()).unwrap();
        assert_eq!(Schedule::RecentOnly, evaluation.goal_rates.schedule);
        assert_float_absolute_eq!(2.7, evaluation.goal_rates.full_time.home, 1e-12);
        assert!(evaluation.markets.is_empty());
    }
}
