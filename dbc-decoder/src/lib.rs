//! DBC Decoder Library
//!
//! A small, stateless library for reading CAN message definitions from DBC
//! text and turning raw frame payloads into physical signal values.
//!
//! # Architecture
//!
//! - [`signals::fields`] classifies the tokens of an `SG_` line
//! - [`signals::dbc`] turns `SG_` lines into [`Signal`]s and `BO_` blocks
//!   into [`Message`]s
//! - [`message_decoder`] masks a field out of a 64-bit payload and applies
//!   `physical = raw * scale + offset`
//! - [`Decoder`] ties a [`SignalDatabase`] to a [`DecoderConfig`]
//!
//! The library does NOT:
//! - Support multiplexed signals, value tables, attributes or comments
//! - Decode payloads wider than 64 bits
//!
//! # Example Usage
//!
//! ```no_run
//! use dbc_decoder::{CanFrame, Decoder, DecoderConfig, SignHandling};
//! use std::path::Path;
//!
//! let config = DecoderConfig::new().with_sign_handling(SignHandling::TwosComplement);
//! let mut decoder = Decoder::with_config(config);
//! decoder.add_dbc(Path::new("powertrain.dbc")).unwrap();
//!
//! let frame: CanFrame = "064#88130000".parse().unwrap();
//! if let Some(decoded) = decoder.decode_frame(&frame) {
//!     for signal in &decoded.signals {
//!         println!("{}", signal);
//!     }
//! }
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod message_decoder;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use config::{BitNumbering, DecoderConfig, ExtractOptions, SignHandling};
pub use decoder::{DatabaseStats, Decoder};
pub use message_decoder::{extract_raw, extract_signed_value, extract_value, MessageDecoder};
pub use signals::{ByteOrder, Message, Signal, SignalDatabase};
pub use types::{CanFrame, DecodedMessage, DecodedSignal, DecoderError, RawValue, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
