//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct is the entry point for loading DBC definitions and
//! decoding frames against them.

use crate::config::DecoderConfig;
use crate::message_decoder::MessageDecoder;
use crate::signals::{Message, SignalDatabase};
use crate::types::{CanFrame, DecodedMessage, Result};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    /// Internal signal database (loaded from DBC files)
    signal_db: SignalDatabase,
    config: DecoderConfig,
}

impl Decoder {
    /// Create a new decoder instance with the default configuration
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            signal_db: SignalDatabase::with_duplicate_check(config.reject_duplicates),
            config,
        }
    }

    /// Load a DBC file and add its definitions to the signal database
    ///
    /// # Example
    /// ```no_run
    /// use dbc_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_dbc(Path::new("powertrain.dbc")).unwrap();
    /// ```
    pub fn add_dbc(&mut self, path: &Path) -> Result<()> {
        log::info!("Loading DBC file: {:?}", path);

        let messages = crate::signals::dbc::parse_dbc_file(path)?;
        self.add_messages(messages)?;

        log::info!("DBC file loaded successfully: {:?}", path);
        Ok(())
    }

    /// Parse DBC text and add its definitions to the signal database
    pub fn add_dbc_str(&mut self, content: &str) -> Result<()> {
        let messages = crate::signals::dbc::parse_dbc_str(content)?;
        self.add_messages(messages)
    }

    fn add_messages(&mut self, messages: Vec<Message>) -> Result<()> {
        self.signal_db.add_messages(messages)
    }

    /// Decode one frame
    ///
    /// Returns `None` when no message is defined for the frame's CAN ID
    /// or the ID is excluded by the message filter.
    ///
    /// # Example
    /// ```
    /// use dbc_decoder::{CanFrame, Decoder};
    ///
    /// let mut decoder = Decoder::new();
    /// decoder
    ///     .add_dbc_str("BO_ 100 EngineData: 8 ECU1\n SG_ RPM : 0|16@1+ (0.25,0) [0|0] \"rpm\" ECU2\n")
    ///     .unwrap();
    ///
    /// let frame: CanFrame = "064#8813".parse().unwrap();
    /// let decoded = decoder.decode_frame(&frame).unwrap();
    /// assert_eq!(decoded.signals[0].value, 1250.0);
    /// ```
    pub fn decode_frame(&self, frame: &CanFrame) -> Option<DecodedMessage> {
        if !self.config.should_process_message(frame.can_id) {
            log::trace!("Filtered CAN ID: 0x{:X}", frame.can_id);
            return None;
        }

        match self.signal_db.get_message(frame.can_id) {
            Some(message_def) => {
                log::debug!("Decoding message: {} (ID 0x{:X})", message_def.name, frame.can_id);
                Some(MessageDecoder::decode_message(
                    frame,
                    message_def,
                    self.config.extract_options(),
                ))
            }
            None => {
                log::trace!("Unknown CAN ID: 0x{:X}", frame.can_id);
                None
            }
        }
    }

    pub fn database(&self) -> &SignalDatabase {
        &self.signal_db
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Get statistics about the loaded signal database
    pub fn database_stats(&self) -> DatabaseStats {
        self.signal_db.stats()
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

// Re-export DatabaseStats for public API
pub use crate::signals::DatabaseStats;
