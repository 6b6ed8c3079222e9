//! Core types for the DBC decoder library
//!
//! This module defines the error type shared by the parser and the value
//! extractor, plus the frame and decoded-value types handed to callers.

use byteorder::{ByteOrder as _, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that can occur while parsing definitions or decoding frames
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    /// A token that looked like a known field did not parse
    #[error("Format error: {0}")]
    Format(String),

    /// A signal's bit span does not fit a 64-bit payload
    #[error("Signal '{signal}': start bit {start_bit} with length {bit_length} does not fit a 64-bit payload")]
    Range {
        signal: String,
        start_bit: u16,
        bit_length: u16,
    },

    #[error("Duplicate definition: {0}")]
    Duplicate(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecoderError {
    /// Prefix a format error with the 1-based source line it came from.
    pub(crate) fn at_line(self, line_no: usize) -> Self {
        match self {
            DecoderError::Format(msg) => DecoderError::Format(format!("line {}: {}", line_no, msg)),
            other => other,
        }
    }
}

/// Raw CAN frame: identifier plus up to 8 payload bytes packed into a `u64`
///
/// Payload byte `n` occupies bits `8n..8n+7`, so byte 0 is the least
/// significant byte of `payload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanFrame {
    /// CAN message ID
    pub can_id: u32,
    /// Frame data as a 64-bit little-endian word
    pub payload: u64,
}

impl CanFrame {
    pub fn new(can_id: u32, payload: u64) -> Self {
        Self { can_id, payload }
    }

    /// Build a frame from raw data bytes (classic CAN, 0-8 bytes)
    pub fn from_bytes(can_id: u32, data: &[u8]) -> Result<Self> {
        if data.len() > 8 {
            return Err(DecoderError::InvalidFrame(format!(
                "frame 0x{:X} carries {} bytes, at most 8 are supported",
                can_id,
                data.len()
            )));
        }

        let mut padded = [0u8; 8];
        padded[..data.len()].copy_from_slice(data);

        Ok(Self {
            can_id,
            payload: LittleEndian::read_u64(&padded),
        })
    }

    /// Payload as the 8 data bytes in bus order
    pub fn data(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u64(&mut bytes, self.payload);
        bytes
    }
}

/// Parses candump notation: `<hex id>#<hex data>`, e.g. `064#FF00`.
impl FromStr for CanFrame {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (id_str, data_str) = s.split_once('#').ok_or_else(|| {
            DecoderError::InvalidFrame(format!("'{}' is not in ID#DATA notation", s))
        })?;

        let id_str = id_str.trim_start_matches("0x").trim_start_matches("0X");
        let can_id = u32::from_str_radix(id_str, 16)
            .map_err(|e| DecoderError::InvalidFrame(format!("bad CAN id '{}': {}", id_str, e)))?;

        if data_str.len() % 2 != 0 {
            return Err(DecoderError::InvalidFrame(format!(
                "data '{}' has an odd number of hex digits",
                data_str
            )));
        }

        let data = (0..data_str.len())
            .step_by(2)
            .map(|i| {
                data_str
                    .get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| {
                        DecoderError::InvalidFrame(format!("bad data byte in '{}'", data_str))
                    })
            })
            .collect::<Result<Vec<u8>>>()?;

        Self::from_bytes(can_id, &data)
    }
}

/// Candump notation with all 8 data bytes in bus order, e.g. `064#8813000000000000`
impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X}#", self.can_id)?;
        for byte in self.data() {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// A frame decoded against its message definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedMessage {
    /// CAN message ID
    pub can_id: u32,
    /// Message name from the DBC
    pub name: String,
    /// Decoded signals in declaration order
    pub signals: Vec<DecodedSignal>,
}

/// A decoded signal with its physical value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedSignal {
    /// Signal name from the DBC
    pub name: String,
    /// Physical value after scale and offset
    pub value: f64,
    /// Raw field value before scaling
    pub raw_value: RawValue,
    /// Engineering unit (e.g., "km/h", "V"), None when the DBC leaves it empty
    pub unit: Option<String>,
}

/// Integer field value as extracted from the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Field read as an unsigned integer
    Unsigned(u64),
    /// Field sign-extended from its bit length
    Signed(i64),
}

impl RawValue {
    pub fn as_f64(self) -> f64 {
        match self {
            RawValue::Unsigned(v) => v as f64,
            RawValue::Signed(v) => v as f64,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Unsigned(v) => write!(f, "{}", v),
            RawValue::Signed(v) => write!(f, "{}", v),
        }
    }
}

impl fmt::Display for DecodedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} = {:.3} {}", self.name, self.value, unit),
            None => write!(f, "{} = {:.3}", self.name, self.value),
        }
    }
}
