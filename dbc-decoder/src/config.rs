//! Decoder configuration types
//!
//! The defaults reproduce the plain masking behavior: every field is read as
//! an unsigned integer at a flat little-endian bit index, whatever its
//! declared sign and byte order. The two switches below opt into
//! sign extension and Motorola bit numbering.

use serde::{Deserialize, Serialize};

/// How the extracted integer is interpreted for signed signals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignHandling {
    /// Read every field as unsigned, ignoring `is_signed`
    #[default]
    AsUnsigned,
    /// Sign-extend fields of signed signals from their bit length
    TwosComplement,
}

/// How `start_bit` is mapped onto payload bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitNumbering {
    /// `start_bit` is the LSB of a contiguous field, for every byte order
    #[default]
    Flat,
    /// Big-endian signals use Motorola numbering: `start_bit` is the MSB
    /// and the field continues into the next byte's bit 7
    Declared,
}

/// Options for a single extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub sign: SignHandling,
    pub bit_numbering: BitNumbering,
}

impl ExtractOptions {
    /// Sign extension and Motorola numbering both enabled
    pub fn strict() -> Self {
        Self {
            sign: SignHandling::TwosComplement,
            bit_numbering: BitNumbering::Declared,
        }
    }
}

/// Configuration for the decoder library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    #[serde(default)]
    pub sign_handling: SignHandling,

    #[serde(default)]
    pub bit_numbering: BitNumbering,

    /// Refuse messages whose id or name is already loaded
    #[serde(default = "default_true")]
    pub reject_duplicates: bool,

    /// Optional: only decode these specific CAN message IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,
}

fn default_true() -> bool {
    true
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            sign_handling: SignHandling::default(),
            bit_numbering: BitNumbering::default(),
            reject_duplicates: true,
            message_filter: None,
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: choose how signed fields are read
    pub fn with_sign_handling(mut self, sign_handling: SignHandling) -> Self {
        self.sign_handling = sign_handling;
        self
    }

    /// Builder method: choose how start bits are numbered
    pub fn with_bit_numbering(mut self, bit_numbering: BitNumbering) -> Self {
        self.bit_numbering = bit_numbering;
        self
    }

    /// Builder method: enable or disable the duplicate id/name check
    pub fn with_duplicate_check(mut self, enabled: bool) -> Self {
        self.reject_duplicates = enabled;
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Check if a message ID should be processed
    pub fn should_process_message(&self, can_id: u32) -> bool {
        match &self.message_filter {
            Some(messages) => messages.contains(&can_id),
            None => true,
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            sign: self.sign_handling,
            bit_numbering: self.bit_numbering,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_sign_handling(SignHandling::TwosComplement)
            .with_bit_numbering(BitNumbering::Declared)
            .with_duplicate_check(false)
            .with_message_filter(vec![0x123]);

        assert_eq!(config.sign_handling, SignHandling::TwosComplement);
        assert_eq!(config.bit_numbering, BitNumbering::Declared);
        assert!(!config.reject_duplicates);
        assert_eq!(config.extract_options(), ExtractOptions::strict());
    }

    #[test]
    fn test_defaults_are_faithful() {
        let config = DecoderConfig::new();
        assert!(config.reject_duplicates);
        assert_eq!(config.extract_options(), ExtractOptions::default());
        assert_eq!(ExtractOptions::default().sign, SignHandling::AsUnsigned);
        assert_eq!(ExtractOptions::default().bit_numbering, BitNumbering::Flat);
    }

    #[test]
    fn test_filter_logic() {
        let config = DecoderConfig::new().with_message_filter(vec![0x123, 0x456]);

        assert!(config.should_process_message(0x123));
        assert!(config.should_process_message(0x456));
        assert!(!config.should_process_message(0x789));
        assert!(DecoderConfig::new().should_process_message(0xFFFF_FFFF));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: DecoderConfig =
            serde_json::from_str(r#"{ "sign_handling": "twos_complement" }"#).unwrap();
        assert_eq!(config.sign_handling, SignHandling::TwosComplement);
        assert_eq!(config.bit_numbering, BitNumbering::Flat);
        assert!(config.reject_duplicates);
        assert!(config.message_filter.is_none());
    }
}
