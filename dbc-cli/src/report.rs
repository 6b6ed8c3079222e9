//! Report generation
//!
//! Text output lists every message definition followed by the decoded
//! frames; JSON output carries the same data in one document.

use dbc_decoder::{CanFrame, DecodedMessage, Message};
use serde::Serialize;
use std::io::{self, Write};

/// One input frame and what it decoded to
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame: CanFrame,
    /// None when no loaded message matches the frame's CAN ID
    pub decoded: Option<DecodedMessage>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    messages: &'a [Message],
    frames: &'a [FrameReport],
}

/// Print message definitions in listing format
pub fn write_listing<W: Write>(out: &mut W, messages: &[Message]) -> io::Result<()> {
    for message in messages {
        writeln!(out, "{}", message)?;
    }
    Ok(())
}

/// Print one block per decoded frame
pub fn write_frames_txt<W: Write>(out: &mut W, reports: &[FrameReport]) -> io::Result<()> {
    for report in reports {
        match &report.decoded {
            Some(decoded) => {
                writeln!(out, "{} {} (ID {})", report.frame, decoded.name, decoded.can_id)?;
                for signal in &decoded.signals {
                    writeln!(out, "  {}", signal)?;
                }
            }
            None => writeln!(out, "{} <unknown>", report.frame)?,
        }
    }
    Ok(())
}

pub fn write_json<W: Write>(
    out: &mut W,
    messages: &[Message],
    reports: &[FrameReport],
) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &JsonReport { messages, frames: reports })?;
    writeln!(out).map_err(serde_json::Error::io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbc_decoder::Decoder;

    const DBC: &str = "BO_ 100 EngineData: 8 ECU1\n SG_ RPM : 0|16@1+ (0.25,0) [0|0] \"rpm\" ECU2\n";

    fn reports(decoder: &Decoder) -> Vec<FrameReport> {
        [CanFrame::new(100, 0x1388), CanFrame::new(0x7FF, 0)]
            .into_iter()
            .map(|frame| FrameReport {
                frame,
                decoded: decoder.decode_frame(&frame),
            })
            .collect()
    }

    #[test]
    fn test_listing() {
        let mut decoder = Decoder::new();
        decoder.add_dbc_str(DBC).unwrap();

        let mut out = Vec::new();
        write_listing(&mut out, decoder.database().messages()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Name: EngineData, ID: 100\n"));
        assert!(text.contains("Name: RPM, unit: rpm, scale: 0.25, offset: 0, start bit: 0, bit length: 16, signed: 0"));
    }

    #[test]
    fn test_frames_txt() {
        let mut decoder = Decoder::new();
        decoder.add_dbc_str(DBC).unwrap();

        let mut out = Vec::new();
        write_frames_txt(&mut out, &reports(&decoder)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "064#8813000000000000 EngineData (ID 100)");
        assert_eq!(lines[1], "  RPM = 1250.000 rpm");
        assert_eq!(lines[2], "7FF#0000000000000000 <unknown>");
    }

    #[test]
    fn test_json() {
        let mut decoder = Decoder::new();
        decoder.add_dbc_str(DBC).unwrap();

        let mut out = Vec::new();
        write_json(&mut out, decoder.database().messages(), &reports(&decoder)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["messages"][0]["name"], "EngineData");
        assert_eq!(value["frames"][0]["decoded"]["signals"][0]["value"], 1250.0);
        assert_eq!(value["frames"][0]["decoded"]["signals"][0]["raw_value"], 5000);
        assert!(value["frames"][1]["decoded"].is_null());
    }
}
