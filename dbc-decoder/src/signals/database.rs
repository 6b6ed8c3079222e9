//! Message and signal definitions, and the database that indexes them
//!
//! Definitions are immutable once the parser hands them over. The database
//! keeps them in insertion order and adds id/name lookups on top.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Byte order declared by a signal's layout token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Big-endian (Motorola format), `@0`
    #[default]
    BigEndian,
    /// Little-endian (Intel format), `@1`
    LittleEndian,
}

/// A CAN signal definition
///
/// Fields the DBC line does not provide keep their defaults: big-endian,
/// unsigned, zero scale and offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal name
    pub name: String,
    /// Engineering unit, empty when the DBC declares `""`
    pub unit: String,
    /// Scale factor to convert raw value to physical value
    pub scale: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Start bit in the 64-bit payload
    pub start_bit: u16,
    /// Length in bits
    pub bit_length: u16,
    /// Raw value is two's-complement
    pub is_signed: bool,
    /// Byte order from the layout token (`@0` big-endian, otherwise little-endian)
    pub byte_order: ByteOrder,
}

impl Signal {
    /// Unit as an option, None when empty
    pub fn unit(&self) -> Option<&str> {
        if self.unit.is_empty() {
            None
        } else {
            Some(&self.unit)
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}, unit: {}, scale: {}, offset: {}, start bit: {}, bit length: {}, signed: {}",
            self.name,
            self.unit,
            self.scale,
            self.offset,
            self.start_bit,
            self.bit_length,
            u8::from(self.is_signed)
        )
    }
}

/// A CAN message definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// CAN message ID
    pub id: u32,
    /// Message name
    pub name: String,
    /// Signals in declaration order
    pub signals: Vec<Signal>,
}

impl Message {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            signals: Vec::new(),
        }
    }

    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}, ID: {}", self.name, self.id)?;
        for signal in &self.signals {
            writeln!(f, "{}", signal)?;
        }
        Ok(())
    }
}

/// The signal database
///
/// Messages are stored in insertion order. With `reject_duplicates` set,
/// a second message with the same id or name, or a message that declares
/// the same signal name twice, is refused with [`DecoderError::Duplicate`].
#[derive(Debug, Default)]
pub struct SignalDatabase {
    messages: Vec<Message>,

    /// Key: CAN ID, Value: index into `messages` (first definition wins)
    id_lookup: HashMap<u32, usize>,

    /// Key: message name, Value: index into `messages`
    name_lookup: HashMap<String, usize>,

    /// Key: signal name, Value: list of (message index, signal index)
    signal_lookup: HashMap<String, Vec<(usize, usize)>>,

    reject_duplicates: bool,
}

impl SignalDatabase {
    /// Create a new empty signal database that rejects duplicates
    pub fn new() -> Self {
        Self::with_duplicate_check(true)
    }

    pub fn with_duplicate_check(reject_duplicates: bool) -> Self {
        Self {
            reject_duplicates,
            ..Self::default()
        }
    }

    /// Add a message definition to the database
    pub fn add_message(&mut self, message: Message) -> Result<()> {
        if self.reject_duplicates {
            self.check_unique(&message)?;
        }

        let msg_idx = self.messages.len();

        for (sig_idx, signal) in message.signals.iter().enumerate() {
            self.signal_lookup
                .entry(signal.name.clone())
                .or_default()
                .push((msg_idx, sig_idx));
        }

        self.id_lookup.entry(message.id).or_insert(msg_idx);
        self.name_lookup.entry(message.name.clone()).or_insert(msg_idx);

        log::debug!(
            "Added message {} (ID {}) with {} signals",
            message.name,
            message.id,
            message.signals.len()
        );
        self.messages.push(message);
        Ok(())
    }

    /// Add a batch of message definitions, all or nothing
    ///
    /// The duplicate check covers the database and the batch itself; on
    /// error the database is left unchanged.
    pub fn add_messages(&mut self, messages: Vec<Message>) -> Result<()> {
        if self.reject_duplicates {
            let mut batch_ids = HashSet::new();
            let mut batch_names = HashSet::new();
            for message in &messages {
                self.check_unique(message)?;
                if !batch_ids.insert(message.id) {
                    return Err(DecoderError::Duplicate(format!(
                        "message ID {} ({}) defined twice",
                        message.id, message.name
                    )));
                }
                if !batch_names.insert(message.name.as_str()) {
                    return Err(DecoderError::Duplicate(format!(
                        "message name {} defined twice",
                        message.name
                    )));
                }
            }
        }

        for message in messages {
            self.add_message(message)?;
        }
        Ok(())
    }

    fn check_unique(&self, message: &Message) -> Result<()> {
        if let Some(&idx) = self.id_lookup.get(&message.id) {
            return Err(DecoderError::Duplicate(format!(
                "message ID {} ({}) already defined by {}",
                message.id, message.name, self.messages[idx].name
            )));
        }
        if self.name_lookup.contains_key(&message.name) {
            return Err(DecoderError::Duplicate(format!(
                "message name {} already defined",
                message.name
            )));
        }
        for (i, signal) in message.signals.iter().enumerate() {
            if message.signals[..i].iter().any(|s| s.name == signal.name) {
                return Err(DecoderError::Duplicate(format!(
                    "signal {} declared twice in message {}",
                    signal.name, message.name
                )));
            }
        }
        Ok(())
    }

    /// Get a message definition by CAN ID
    pub fn get_message(&self, can_id: u32) -> Option<&Message> {
        self.id_lookup.get(&can_id).map(|&idx| &self.messages[idx])
    }

    pub fn get_message_by_name(&self, message_name: &str) -> Option<&Message> {
        self.name_lookup.get(message_name).map(|&idx| &self.messages[idx])
    }

    /// Find all messages containing a specific signal name
    pub fn find_signal(&self, signal_name: &str) -> Vec<(u32, &Signal)> {
        self.signal_lookup
            .get(signal_name)
            .map(|locations| {
                locations
                    .iter()
                    .map(|&(msg_idx, sig_idx)| {
                        let msg = &self.messages[msg_idx];
                        (msg.id, &msg.signals[sig_idx])
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All messages in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            num_messages: self.messages.len(),
            num_signals: self.messages.iter().map(|m| m.signals.len()).sum(),
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
}
