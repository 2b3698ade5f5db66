//! Cleaning of raw price and line strings captured from providers.
//!
//! Providers decorate their cells with movement arrows and qualifiers, quote split handicap
//! lines as fractions of two quarter-values (`2.5/3`) and sometimes use localised labels
//! (`球半`, `受一球`) in place of numbers. Everything here either yields a clean number or a
//! [MalformedInput] that callers must exclude from aggregation; nothing is ever defaulted to zero.

use crate::error::MalformedInput;
use crate::market::MarketType;

/// Price movement decorations.
const ARROWS: [char; 2] = ['↑', '↓'];

/// Rising/falling qualifiers attached to localised handicap labels.
const MOVEMENT_QUALIFIERS: [char; 2] = ['升', '降'];

/// Marks the side receiving the handicap.
const RECEIVING_QUALIFIERS: [&str; 2] = ["受让", "受"];

/// Marks the side giving the handicap.
const GIVING_QUALIFIER: &str = "让";

/// Half the last rendered digit. Magnitudes below this render as zero, suppressing `-0.00`.
const SIGNED_ZERO_EPSILON: f64 = 0.005;

/// Tolerance when checking that a line sits on the quarter-goal grid.
const GRID_TOLERANCE: f64 = 1e-9;

const HANDICAP_LABELS: [(&str, f64); 24] = [
    ("平手", 0.0),
    ("平/半", 0.25),
    ("平手/半球", 0.25),
    ("半球", 0.5),
    ("半/一", 0.75),
    ("半球/一球", 0.75),
    ("一球", 1.0),
    ("一/球半", 1.25),
    ("一球/球半", 1.25),
    ("球半", 1.5),
    ("球半/两球", 1.75),
    ("两球", 2.0),
    ("两球/两球半", 2.25),
    ("两球半", 2.5),
    ("两球半/三球", 2.75),
    ("三球", 3.0),
    ("三球/三球半", 3.25),
    ("三球半", 3.5),
    ("三球半/四球", 3.75),
    ("四球", 4.0),
    ("四球/四球半", 4.25),
    ("四球半", 4.5),
    ("四球半/五球", 4.75),
    ("五球", 5.0),
];

/// Which side a localised handicap label favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Receiving,
    Giving,
}
impl Qualifier {
    fn strip(label: &str) -> (Option<Qualifier>, &str) {
        for prefix in RECEIVING_QUALIFIERS {
            if let Some(remainder) = label.strip_prefix(prefix) {
                return (Some(Qualifier::Receiving), remainder);
            }
        }
        match label.strip_prefix(GIVING_QUALIFIER) {
            Some(remainder) => (Some(Qualifier::Giving), remainder),
            None => (None, label),
        }
    }
}

pub fn strip_arrows(raw: &str) -> String {
    raw.chars().filter(|c| !ARROWS.contains(c)).collect::<String>().trim().to_string()
}

fn parse_number(text: &str) -> Result<f64, MalformedInput> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(MalformedInput::Number(trimmed.to_string())),
    }
}

/// Parses a price cell for the given market type. Three-way prices follow the decimal
/// convention and must exceed 1.0; two-way prices exclude the stake and must be positive.
pub fn parse_price(raw: &str, market_type: MarketType) -> Result<f64, MalformedInput> {
    let price = parse_number(&strip_arrows(raw))?;
    if market_type.is_valid_price(price) {
        Ok(price)
    } else {
        Err(MalformedInput::Price { price, market_type })
    }
}

/// Parses a handicap or totals line, accepting plain numbers, fractional splits (`2.5/3` → 2.75)
/// and localised labels. The result is checked against the quarter-goal grid.
pub fn parse_line(raw: &str) -> Result<f64, MalformedInput> {
    let cleaned = strip_arrows(raw);
    let line = match parse_number(&cleaned) {
        Ok(value) => value,
        Err(_) => match parse_split(&cleaned) {
            Some(value) => value,
            None => parse_label(&cleaned)?,
        },
    };
    if is_on_quarter_grid(line) {
        Ok(normalise_zero(line))
    } else {
        Err(MalformedInput::OffGrid(line))
    }
}

/// A split line `a/b` is the mean of its halves. A sign on the first half carries to the second,
/// so `-0.5/1` is -0.75.
fn parse_split(text: &str) -> Option<f64> {
    let (first, second) = text.split_once('/')?;
    let first = parse_number(first).ok()?;
    let second = parse_number(second).ok()?;
    let second = if first.is_sign_negative() && second > 0.0 {
        -second
    } else {
        second
    };
    Some((first + second) / 2.0)
}

/// Converts a localised handicap label to a signed line. A leading receiving qualifier yields a
/// positive line, a giving qualifier a negative one and an unqualified label its table magnitude.
/// An unrecognised label is returned unchanged (sans decorations) inside the error.
pub fn parse_label(raw: &str) -> Result<f64, MalformedInput> {
    let cleaned: String = strip_arrows(raw)
        .chars()
        .filter(|c| !MOVEMENT_QUALIFIERS.contains(c))
        .collect();
    let (qualifier, label) = Qualifier::strip(&cleaned);
    let magnitude = HANDICAP_LABELS
        .iter()
        .find(|(text, _)| *text == label)
        .map(|(_, magnitude)| *magnitude)
        .ok_or_else(|| MalformedInput::Label(cleaned.clone()))?;

    Ok(match qualifier {
        _ if magnitude == 0.0 => 0.0,
        Some(Qualifier::Receiving) | None => magnitude,
        Some(Qualifier::Giving) => -magnitude,
    })
}

fn is_on_quarter_grid(line: f64) -> bool {
    let quarters = line * 4.0;
    (quarters - quarters.round()).abs() < GRID_TOLERANCE
}

fn normalise_zero(value: f64) -> f64 {
    if value.abs() < SIGNED_ZERO_EPSILON {
        0.0
    } else {
        value
    }
}

/// Renders a price to exactly two fraction digits.
pub fn format_price(value: f64) -> String {
    format!("{:.2}", normalise_zero(value))
}

/// Renders a line with an explicit sign, except for a level line.
pub fn format_line(value: f64) -> String {
    let value = normalise_zero(value);
    if value == 0.0 {
        "0.00".to_string()
    } else {
        format!("{value:+.2}")
    }
}
