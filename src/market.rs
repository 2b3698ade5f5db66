//! Provider quotes, their cross-provider aggregation, and the margin-free probabilities implied
//! by a set of prices.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};
use tracing::{debug, warn};

use crate::error::{MalformedInput, UnavailableMarket};
use crate::normalise;
use crate::probs::SliceExt;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
pub enum MarketType {
    /// Home/draw/away; decimal prices that include the stake.
    #[strum(serialize = "three-way")]
    ThreeWay,

    /// Two-way handicap; prices exclude the stake.
    #[strum(serialize = "handicap")]
    Handicap,

    /// Two-way total goals (over/under); prices exclude the stake.
    #[strum(serialize = "totals")]
    Totals,
}
impl MarketType {
    pub fn options(&self) -> usize {
        match self {
            MarketType::ThreeWay => 3,
            MarketType::Handicap | MarketType::Totals => 2,
        }
    }

    pub fn has_line(&self) -> bool {
        !matches!(self, MarketType::ThreeWay)
    }

    pub fn is_valid_price(&self, price: f64) -> bool {
        match self {
            MarketType::ThreeWay => price.is_finite() && price > 1.0,
            MarketType::Handicap | MarketType::Totals => price.is_finite() && price > 0.0,
        }
    }

    pub fn implied_probability(&self, price: f64) -> f64 {
        match self {
            MarketType::ThreeWay => 1.0 / price,
            MarketType::Handicap | MarketType::Totals => 1.0 / (price + 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Phase {
    #[strum(serialize = "opening")]
    Opening,

    #[strum(serialize = "current")]
    Current,
}

/// A provider row as captured upstream: price cells in option order, with the line (if the
/// market has one) in the middle cell: `[home, draw, away]` or `[home/over, line, away/under]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub provider: String,
    pub opening: Vec<String>,
    pub current: Vec<String>,
}
impl RawQuote {
    fn cells(&self, phase: Phase) -> &[String] {
        match phase {
            Phase::Opening => &self.opening,
            Phase::Current => &self.current,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub provider: String,
    pub market_type: MarketType,
    pub phase: Phase,
    pub prices: Vec<f64>,
    pub line: Option<f64>,
}
impl PriceQuote {
    /// Normalises one phase of a raw provider row. Any unusable cell makes the whole quote
    /// unusable.
    pub fn parse(
        raw: &RawQuote,
        market_type: MarketType,
        phase: Phase,
    ) -> Result<Self, MalformedInput> {
        let cells = raw.cells(phase);
        if cells.len() != 3 {
            return Err(MalformedInput::Cells {
                expected: 3,
                actual: cells.len(),
            });
        }

        let (prices, line) = if market_type.has_line() {
            let prices = vec![
                normalise::parse_price(&cells[0], market_type)?,
                normalise::parse_price(&cells[2], market_type)?,
            ];
            (prices, Some(normalise::parse_line(&cells[1])?))
        } else {
            let prices = cells
                .iter()
                .map(|cell| normalise::parse_price(cell, market_type))
                .collect::<Result<Vec<_>, _>>()?;
            (prices, None)
        };

        Ok(Self {
            provider: raw.provider.clone(),
            market_type,
            phase,
            prices,
            line,
        })
    }
}

/// Dispersion of one option's price across providers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub std_dev: f64,
}
impl PriceStats {
    fn from_column(column: &[f64]) -> Option<Self> {
        Some(Self {
            mean: column.mean()?,
            max: column.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: column.iter().copied().fold(f64::INFINITY, f64::min),
            std_dev: column.std_dev()?,
        })
    }
}

/// Mean prices (and line) of one phase across the providers with valid data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseAverage {
    pub prices: Vec<f64>,
    pub line: Option<f64>,
    pub providers: usize,
    pub stats: Vec<PriceStats>,
}
impl PhaseAverage {
    fn from_quotes(quotes: &[&PriceQuote], options: usize) -> Option<Self> {
        if quotes.is_empty() {
            return None;
        }
        let mut stats = Vec::with_capacity(options);
        for option in 0..options {
            let column: Vec<_> = quotes.iter().map(|quote| quote.prices[option]).collect();
            stats.push(PriceStats::from_column(&column)?);
        }
        let lines: Vec<_> = quotes.iter().filter_map(|quote| quote.line).collect();
        Some(Self {
            prices: stats.iter().map(|stat| stat.mean).collect(),
            line: lines.mean(),
            providers: quotes.len(),
            stats,
        })
    }
}

/// All quotes of one market type, averaged per phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub market_type: MarketType,
    pub opening: Option<PhaseAverage>,
    pub current: Option<PhaseAverage>,
}
impl MarketSnapshot {
    /// Averages already-normalised quotes. Quotes of other market types are ignored; if a provider
    /// quotes the same phase more than once, its last quote stands.
    pub fn aggregate(market_type: MarketType, quotes: &[PriceQuote]) -> Self {
        let average = |phase: Phase| {
            let mut latest: FxHashMap<&str, &PriceQuote> = FxHashMap::default();
            let mut order = vec![];
            for quote in quotes {
                if quote.market_type != market_type
                    || quote.phase != phase
                    || quote.prices.len() != market_type.options()
                {
                    continue;
                }
                if latest.insert(&quote.provider, quote).is_none() {
                    order.push(quote.provider.as_str());
                }
            }
            let selected: Vec<_> = order.iter().map(|provider| latest[provider]).collect();
            PhaseAverage::from_quotes(&selected, market_type.options())
        };

        Self {
            market_type,
            opening: average(Phase::Opening),
            current: average(Phase::Current),
        }
    }

    /// Normalises raw provider rows and averages the usable ones. Providers with a malformed
    /// phase are excluded from that phase only.
    pub fn from_raw(market_type: MarketType, raw_quotes: &[RawQuote]) -> Self {
        let mut quotes = Vec::with_capacity(raw_quotes.len() * 2);
        let mut excluded = 0;
        for raw in raw_quotes {
            for phase in [Phase::Opening, Phase::Current] {
                match PriceQuote::parse(raw, market_type, phase) {
                    Ok(quote) => quotes.push(quote),
                    Err(err) => {
                        debug!("excluding {phase} {market_type} quote from {}: {err}", raw.provider);
                        excluded += 1;
                    }
                }
            }
        }
        if excluded > 0 {
            warn!("excluded {excluded} malformed {market_type} quote(s) from aggregation");
        }
        Self::aggregate(market_type, &quotes)
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseAverage> {
        match phase {
            Phase::Opening => self.opening.as_ref(),
            Phase::Current => self.current.as_ref(),
        }
    }

    pub fn fit(&self, phase: Phase) -> Result<Market, UnavailableMarket> {
        let average = self.phase(phase).ok_or(UnavailableMarket::NoPrices {
            market_type: self.market_type,
            phase,
        })?;
        Market::fit(self.market_type, &average.prices)
    }

    /// Change in margin from the opening to the current prices, in percentage points.
    pub fn margin_drift(&self) -> Option<f64> {
        let opening = self.fit(Phase::Opening).ok()?;
        let current = self.fit(Phase::Current).ok()?;
        Some(current.margin - opening.margin)
    }
}

/// Margin and fair probabilities implied by one set of prices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub market_type: MarketType,
    pub prices: Vec<f64>,
    pub implied: Vec<f64>,
    pub probs: Vec<f64>,

    /// Overround in percent. Only rounding noise can make this negative.
    pub margin: f64,
}
impl Market {
    pub fn fit(market_type: MarketType, prices: &[f64]) -> Result<Self, UnavailableMarket> {
        let expected = market_type.options();
        if prices.len() != expected {
            return Err(UnavailableMarket::WrongArity {
                market_type,
                expected,
                actual: prices.len(),
            });
        }
        if let Some(&price) = prices.iter().find(|&&price| !market_type.is_valid_price(price)) {
            return Err(MalformedInput::Price { price, market_type }.into());
        }

        let implied: Vec<_> = prices
            .iter()
            .map(|&price| market_type.implied_probability(price))
            .collect();
        let mut probs = implied.clone();
        let booksum = probs.normalise(1.0);
        Ok(Self {
            market_type,
            prices: prices.to_vec(),
            implied,
            probs,
            margin: (booksum - 1.0) * 100.0,
        })
    }

    pub fn effective_margin(&self) -> f64 {
        f64::max(0.0, self.margin)
    }
}
