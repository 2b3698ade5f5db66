//! Error taxonomy. None of these abort an evaluation outright: malformed inputs are excluded
//! from aggregation, unavailable markets degrade the consensus weighting, and insufficient
//! data is returned to the caller as a value to render.

use thiserror::Error;

use crate::market::{MarketType, Phase};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedInput {
    #[error("unparsable number '{0}'")]
    Number(String),

    #[error("unrecognised handicap label '{0}'")]
    Label(String),

    #[error("line {0} is not on the quarter-goal grid")]
    OffGrid(f64),

    #[error("price {price} is out of range for the {market_type} market")]
    Price { price: f64, market_type: MarketType },

    #[error("expected {expected} cells, got {actual}")]
    Cells { expected: usize, actual: usize },

    #[error("{wins}W {draws}D {losses}L does not add up to {matches} matches")]
    Record {
        matches: u16,
        wins: u16,
        draws: u16,
        losses: u16,
    },

    #[error("unparsable summary '{0}'")]
    Summary(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnavailableMarket {
    #[error("no {phase} prices for the {market_type} market")]
    NoPrices { market_type: MarketType, phase: Phase },

    #[error("expected {expected} prices for the {market_type} market, got {actual}")]
    WrongArity {
        market_type: MarketType,
        expected: usize,
        actual: usize,
    },

    #[error("expected a {expected} market, got {actual}")]
    WrongType {
        expected: MarketType,
        actual: MarketType,
    },

    #[error("{0}")]
    Malformed(#[from] MalformedInput),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("insufficient data: no usable home/away, recent or head-to-head form for either side")]
pub struct InsufficientData;
