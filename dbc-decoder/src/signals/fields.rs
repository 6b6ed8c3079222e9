//! Token classification for `SG_` lines
//!
//! A signal line is a run of whitespace-separated tokens. Each token is
//! classified by its punctuation: `@` marks the bit layout, `(` the
//! scale/offset pair and `"` the unit string. Everything else (the keyword,
//! the name, `[min|max]`, receivers) is unrecognized and skipped.

use crate::signals::database::ByteOrder;
use crate::types::{DecoderError, Result};

/// One classified token of a signal line
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    /// `<start>|<length>@<endian><sign>`, e.g. `0|16@1+`
    BitLayout {
        start_bit: u16,
        bit_length: u16,
        is_signed: bool,
        byte_order: ByteOrder,
    },
    /// `(<scale>,<offset>)`, e.g. `(0.25,0)`
    ScaleOffset { scale: f64, offset: f64 },
    /// `"<text>"`, e.g. `"rpm"`
    Unit(String),
    Unrecognized,
}

/// Classify a token by its shape and parse it
///
/// Precedence is `@`, then `(`, then `"`. A token that has the shape of a
/// field but whose numbers do not parse yields [`DecoderError::Format`].
pub fn classify_and_parse(token: &str) -> Result<FieldData> {
    if token.contains('@') {
        parse_bit_layout(token)
    } else if token.contains('(') {
        parse_scale_offset(token)
    } else if token.contains('"') {
        parse_unit(token)
    } else {
        Ok(FieldData::Unrecognized)
    }
}

fn parse_bit_layout(token: &str) -> Result<FieldData> {
    let (start, rest) = token
        .split_once('|')
        .ok_or_else(|| format_error(token, "bit layout is missing '|'"))?;
    let length = rest
        .split_once('@')
        .map(|(length, _)| length)
        .ok_or_else(|| format_error(token, "bit layout has '@' before '|'"))?;

    let start_bit = parse_number::<u16>(token, start, "start bit")?;
    let bit_length = parse_number::<u16>(token, length, "bit length")?;

    // "@0" is Motorola; anything else, including a missing digit, is Intel.
    let byte_order = if token.contains("@0") {
        ByteOrder::BigEndian
    } else {
        ByteOrder::LittleEndian
    };

    Ok(FieldData::BitLayout {
        start_bit,
        bit_length,
        is_signed: token.contains('-'),
        byte_order,
    })
}

fn parse_scale_offset(token: &str) -> Result<FieldData> {
    let inner = token.trim_start_matches('(').trim_end_matches(')');
    let (scale, offset) = inner
        .split_once(',')
        .ok_or_else(|| format_error(token, "scale/offset is missing ','"))?;

    Ok(FieldData::ScaleOffset {
        scale: parse_number::<f64>(token, scale, "scale")?,
        offset: parse_number::<f64>(token, offset, "offset")?,
    })
}

fn parse_unit(token: &str) -> Result<FieldData> {
    let mut chars = token.chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return Err(format_error(token, "unit must be enclosed in quotes"));
    }
    Ok(FieldData::Unit(chars.as_str().to_string()))
}

fn parse_number<T>(token: &str, text: &str, what: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| format_error(token, &format!("invalid {} '{}': {}", what, text, e)))
}

fn format_error(token: &str, reason: &str) -> DecoderError {
    DecoderError::Format(format!("token '{}': {}", token, reason))
}
