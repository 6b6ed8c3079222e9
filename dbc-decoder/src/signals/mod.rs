//! Signal definitions and the DBC parser
//!
//! This module contains the DBC line parser, the token classifier it is
//! built on, and the signal database.

pub mod database;
pub mod dbc;
pub mod fields;

// Re-export key types for convenience
pub use database::{ByteOrder, DatabaseStats, Message, Signal, SignalDatabase};
pub use dbc::{
    decode_signal_line, parse_dbc_file, parse_dbc_reader, parse_dbc_str, parse_header,
    parse_messages,
};
pub use fields::{classify_and_parse, FieldData};
