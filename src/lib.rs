//! Consensus outcome probabilities for soccer matches.
//! Estimates per-side goal rates from team form, expands them into a Poisson scoregrid and
//! blends the derived 1X2 probabilities with margin-free bookmaker prices, flagging the
//! signals that disagree with the blended verdict.

pub mod config;
pub mod consensus;
pub mod contradiction;
pub mod distribution;
pub mod error;
pub mod evaluation;
pub mod file;
pub mod form;
pub mod linear;
pub mod market;
pub mod normalise;
pub mod poisson;
pub mod print;
pub mod probs;
pub mod scoregrid;
pub mod xg;

#[cfg(test)]
pub(crate) mod factorial;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
