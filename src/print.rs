use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};

use crate::consensus::ConsensusResult;
use crate::contradiction::ContradictionReport;
use crate::distribution::{HalfFullDistribution, OutcomeDistribution};
use crate::evaluation::MarketSummary;
use crate::market::MarketType;
use crate::normalise::{format_line, format_price};
use crate::scoregrid::{MatchOutcome, ThreeWay};
use crate::xg::GoalRateEstimate;

/// Over/under lines tabulated from the total-goals distribution.
const TOTALS_LINES: [f64; 5] = [0.5, 1.5, 2.5, 3.5, 4.5];

fn optional(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
    value.map(render).unwrap_or_else(|| "-".into())
}

/// Handicap lines carry a sign; totals lines are unsigned goal counts.
fn render_line(market_type: MarketType, line: f64) -> String {
    match market_type {
        MarketType::Handicap => format_line(line),
        MarketType::ThreeWay | MarketType::Totals => format_price(line),
    }
}

pub fn tabulate_goal_rates(estimate: &GoalRateEstimate) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(20)).with(Left)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Source".into(), "Weight".into(), "Home".into(), "Away".into()],
        ));
    for contribution in &estimate.breakdown {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", contribution.source).into(),
                format!("{:.3}", contribution.weight).into(),
                format!("{:.3}", contribution.rates.home).into(),
                format!("{:.3}", contribution.rates.away).into(),
            ],
        ));
    }
    table.push_row(Row::new(
        Styles::default().with(Header(true)),
        vec![
            format!("full time ({})", estimate.schedule).into(),
            "".into(),
            format!("{:.3}", estimate.full_time.home).into(),
            format!("{:.3}", estimate.full_time.away).into(),
        ],
    ));
    table.push_row(Row::new(
        Styles::default(),
        vec![
            "half time".into(),
            "".into(),
            format!("{:.3}", estimate.half_time.home).into(),
            format!("{:.3}", estimate.half_time.away).into(),
        ],
    ));
    if let Some(recorded) = &estimate.recorded_half_time {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                "half time (recorded)".into(),
                "".into(),
                format!("{:.3}", recorded.home).into(),
                format!("{:.3}", recorded.away).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_markets(markets: &[MarketSummary]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(10)).with(Left)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(24)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(24)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Market".into(),
                "Line".into(),
                "Prices".into(),
                "Fair".into(),
                "Margin".into(),
                "Drift".into(),
            ],
        ));
    for summary in markets {
        let current = summary.current.as_ref();
        let prices = current
            .map(|market| market.prices.iter().map(|&price| format_price(price)).collect::<Vec<_>>().join(" / "))
            .unwrap_or_else(|| "-".into());
        let fair = current
            .map(|market| {
                market
                    .probs
                    .iter()
                    .map(|prob| format!("{:.1}%", prob * 100.0))
                    .collect::<Vec<_>>()
                    .join(" / ")
            })
            .unwrap_or_else(|| "-".into());
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", summary.market_type).into(),
                optional(summary.current_line, |line| render_line(summary.market_type, line)).into(),
                prices.into(),
                fair.into(),
                optional(current.map(|market| market.margin), |margin| format!("{margin:.2}%")).into(),
                optional(summary.margin_drift, |drift| format!("{drift:+.2}")).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_consensus(consensus: &ConsensusResult) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(10)).with(Left)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["".into(), "Home".into(), "Draw".into(), "Away".into()],
        ));
    let mut push = |label: &str, values: &ThreeWay| {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                label.to_string().into(),
                format!("{:.2}", values.home).into(),
                format!("{:.2}", values.draw).into(),
                format!("{:.2}", values.away).into(),
            ],
        ));
    };
    if let Some(odds) = &consensus.odds_share {
        push("odds", odds);
    }
    push("xG share", &consensus.xg_share);
    push("Poisson", &consensus.poisson_share);
    push("consensus", &consensus.scores);
    table.push_row(Row::new(
        Styles::default().with(Header(true)),
        vec![
            "pick".into(),
            format!("{}", consensus.recommendation).into(),
            format!("{}", consensus.confidence).into(),
            format!("{}", consensus.schedule).into(),
        ],
    ));
    table
}

pub fn tabulate_scorelines(distribution: &OutcomeDistribution) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(8)).with(Left)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Score".into(), "Probability".into()],
        ));
    for scoreline in &distribution.scorelines {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}-{}", scoreline.score.home, scoreline.score.away).into(),
                format!("{:.4}", scoreline.probability).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_totals(distribution: &OutcomeDistribution) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(6)).with(Left)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Line".into(), "Over".into(), "Under".into()],
        ));
    for line in TOTALS_LINES {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{line:.1}").into(),
                format!("{:.4}", distribution.over(line)).into(),
                format!("{:.4}", distribution.under(line)).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_half_full(half_full: &HalfFullDistribution) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(10)).with(Left)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Half \\ Full".into(), "H".into(), "D".into(), "A".into()],
        ));
    for half in [MatchOutcome::Home, MatchOutcome::Draw, MatchOutcome::Away] {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{half}").into(),
                format!("{:.4}", half_full.probability(half, MatchOutcome::Home)).into(),
                format!("{:.4}", half_full.probability(half, MatchOutcome::Draw)).into(),
                format!("{:.4}", half_full.probability(half, MatchOutcome::Away)).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_contradictions(report: &ContradictionReport) -> Table {
    let mut table = Table::default()
        .with_cols(vec![Col::new(Styles::default().with(MinWidth(40)).with(Left))])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Contradictions".into()],
        ));
    if report.is_empty() {
        table.push_row(Row::new(Styles::default(), vec!["none".into()]));
    }
    for message in report.messages() {
        table.push_row(Row::new(Styles::default(), vec![message.into()]));
    }
    table
}
