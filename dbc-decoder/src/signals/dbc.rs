//! DBC file parser
//!
//! Recognizes the `BO_` message blocks of a Vector DBC file and the `SG_`
//! lines inside them. Every other section of the format is skipped.
//!
//! A message block is a header line followed by its signal lines and ends at
//! the first blank line or at end of input:
//!
//! ```text
//! BO_ 100 EngineData: 8 ECU1
//!  SG_ RPM : 0|16@1+ (0.25,0) [0|16383.75] "rpm" ECU2
//!  SG_ Temp : 16|8@1- (1,-40) [-40|215] "degC" ECU2
//!
//! ```

use crate::signals::database::{Message, Signal};
use crate::signals::fields::{classify_and_parse, FieldData};
use crate::types::{DecoderError, Result};
use std::io::BufRead;
use std::path::Path;

/// Literal that opens a message header line
const MESSAGE_MARKER: &str = "BO_ ";

/// Keyword that opens a signal line (after leading whitespace)
const SIGNAL_KEYWORD: &str = "SG_";

/// Parse a DBC file and return message definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<Message>> {
    log::info!("Parsing DBC file: {:?}", path);

    let bytes = std::fs::read(path)?;

    // DBC files exported by Windows tools are often Windows-1252, not UTF-8
    let dbc_content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let messages = parse_dbc_str(&dbc_content)?;

    log::info!("Parsed {} messages from {:?}", messages.len(), path);

    Ok(messages)
}

/// Parse DBC content held in memory
pub fn parse_dbc_str(content: &str) -> Result<Vec<Message>> {
    parse_messages(content.lines())
}

/// Parse DBC content from any buffered reader
pub fn parse_dbc_reader<R: BufRead>(reader: R) -> Result<Vec<Message>> {
    let lines = reader.lines().collect::<std::io::Result<Vec<String>>>()?;
    parse_messages(lines)
}

enum ParseState {
    /// Looking for the next `BO_ ` header
    Scanning,
    /// Inside a message block, appending signals
    CollectingSignals(Message),
}

/// Run the message-block state machine over a sequence of lines
///
/// Messages are returned in source order. A block that is still open when
/// the input ends is emitted as well, and so is a block directly followed by
/// the next `BO_ ` header. Other non-`SG_` lines inside a block are skipped.
/// The first malformed signal line aborts the parse; its error names the
/// 1-based line number.
pub fn parse_messages<I, S>(lines: I) -> Result<Vec<Message>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut messages = Vec::new();
    let mut state = ParseState::Scanning;

    for (idx, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        let line_no = idx + 1;

        state = match state {
            ParseState::Scanning => {
                if line.starts_with(MESSAGE_MARKER) {
                    let (name, id) = parse_header(line).map_err(|e| e.at_line(line_no))?;
                    log::debug!("Message block {} (ID {}) at line {}", name, id, line_no);
                    ParseState::CollectingSignals(Message::new(id, name))
                } else {
                    ParseState::Scanning
                }
            }
            ParseState::CollectingSignals(mut message) => {
                if line.trim().is_empty() {
                    messages.push(message);
                    ParseState::Scanning
                } else if line.starts_with(MESSAGE_MARKER) {
                    // Header with no blank line before it closes the open block
                    messages.push(message);
                    let (name, id) = parse_header(line).map_err(|e| e.at_line(line_no))?;
                    log::debug!("Message block {} (ID {}) at line {}", name, id, line_no);
                    ParseState::CollectingSignals(Message::new(id, name))
                } else if is_signal_line(line) {
                    let signal = decode_signal_line(line).map_err(|e| e.at_line(line_no))?;
                    message.signals.push(signal);
                    ParseState::CollectingSignals(message)
                } else {
                    log::warn!(
                        "Line {}: skipping non-signal line in message {}: '{}'",
                        line_no,
                        message.name,
                        line.trim()
                    );
                    ParseState::CollectingSignals(message)
                }
            }
        };
    }

    if let ParseState::CollectingSignals(message) = state {
        messages.push(message);
    }

    Ok(messages)
}

/// Split a `BO_ <id> <name>: ...` header into `(name, id)`
pub fn parse_header(line: &str) -> Result<(String, u32)> {
    let rest = line
        .strip_prefix(MESSAGE_MARKER)
        .ok_or_else(|| DecoderError::Format(format!("'{}' is not a message header", line)))?
        .trim_start();

    let (id_text, after_id) = rest.split_once(char::is_whitespace).ok_or_else(|| {
        DecoderError::Format(format!("message header '{}' has no name", line))
    })?;

    let id = id_text.parse::<u32>().map_err(|e| {
        DecoderError::Format(format!("invalid message ID '{}': {}", id_text, e))
    })?;

    let name = after_id
        .split_once(':')
        .map(|(name, _)| name.trim())
        .ok_or_else(|| {
            DecoderError::Format(format!("message header '{}' is missing ':'", line))
        })?;

    if name.is_empty() {
        return Err(DecoderError::Format(format!(
            "message header '{}' has an empty name",
            line
        )));
    }

    Ok((name.to_string(), id))
}

fn is_signal_line(line: &str) -> bool {
    line.trim_start()
        .strip_prefix(SIGNAL_KEYWORD)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Decode one `SG_` line into a signal definition
///
/// Fields whose token is absent keep the [`Signal`] defaults. If a field
/// appears twice, the first token wins.
pub fn decode_signal_line(raw_line: &str) -> Result<Signal> {
    let line = raw_line.trim();

    let body = line
        .strip_prefix(SIGNAL_KEYWORD)
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .ok_or_else(|| {
            DecoderError::Format(format!("expected a signal line, found '{}'", line))
        })?
        .trim_start();

    let name_end = body
        .find(|c: char| c.is_whitespace() || c == ':')
        .unwrap_or(body.len());
    let (name, fields) = body.split_at(name_end);
    if name.is_empty() {
        return Err(DecoderError::Format(format!("signal line '{}' has no name", line)));
    }

    let mut signal = Signal {
        name: name.to_string(),
        ..Signal::default()
    };
    let mut seen_layout = false;
    let mut seen_scale = false;
    let mut seen_unit = false;

    for word in split_words(fields) {
        match classify_and_parse(word)? {
            FieldData::BitLayout {
                start_bit,
                bit_length,
                is_signed,
                byte_order,
            } => {
                if take_first(&mut seen_layout, name, word) {
                    signal.start_bit = start_bit;
                    signal.bit_length = bit_length;
                    signal.is_signed = is_signed;
                    signal.byte_order = byte_order;
                }
            }
            FieldData::ScaleOffset { scale, offset } => {
                if take_first(&mut seen_scale, name, word) {
                    signal.scale = scale;
                    signal.offset = offset;
                }
            }
            FieldData::Unit(unit) => {
                if take_first(&mut seen_unit, name, word) {
                    signal.unit = unit;
                }
            }
            FieldData::Unrecognized => {}
        }
    }

    Ok(signal)
}

fn take_first(seen: &mut bool, signal: &str, word: &str) -> bool {
    if *seen {
        log::warn!("Signal {}: ignoring repeated field token '{}'", signal, word);
        false
    } else {
        *seen = true;
        true
    }
}

/// Split on whitespace, keeping a double-quoted run (`"deg C"`) in one word
fn split_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_quotes = false;

    for (i, c) in text.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
            start.get_or_insert(i);
        } else if c.is_whitespace() && !in_quotes {
            if let Some(s) = start.take() {
                words.push(&text[s..i]);
            }
        } else {
            start.get_or_insert(i);
        }
    }
    if let Some(s) = start {
        words.push(&text[s..]);
    }

    words
}
