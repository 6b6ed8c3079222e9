//! Message Decoding Engine
//!
//! Extracts signal values from raw 64-bit payloads based on parsed signal
//! definitions. Handles bit masking, optional sign extension and Motorola
//! numbering, and physical value conversion.
//!
//! Everything here is a pure function of its inputs, so it can be called
//! from any number of threads against a shared [`SignalDatabase`].
//!
//! [`SignalDatabase`]: crate::SignalDatabase

use crate::config::{BitNumbering, ExtractOptions, SignHandling};
use crate::signals::database::{ByteOrder, Message, Signal};
use crate::types::{CanFrame, DecodedMessage, DecodedSignal, DecoderError, RawValue, Result};

/// Width of the payload word in bits
const PAYLOAD_BITS: u32 = 64;

/// Compute the physical value of `signal` from a raw payload
///
/// The field is masked at a flat little-endian bit index and read as an
/// unsigned integer, then `physical = raw * scale + offset` is applied.
/// `is_signed` and `byte_order` are not consulted; see
/// [`extract_signed_value`] and [`extract_raw`] for the variants that do.
pub fn extract_value(raw_payload: u64, signal: &Signal) -> Result<f64> {
    let raw = extract_raw(raw_payload, signal, ExtractOptions::default())?;
    Ok(to_physical(raw, signal))
}

/// Like [`extract_value`], but sign-extends the field of a signed signal
/// before the affine transform
pub fn extract_signed_value(raw_payload: u64, signal: &Signal) -> Result<f64> {
    let options = ExtractOptions {
        sign: SignHandling::TwosComplement,
        ..ExtractOptions::default()
    };
    let raw = extract_raw(raw_payload, signal, options)?;
    Ok(to_physical(raw, signal))
}

/// Extract the integer field of `signal` from a raw payload
///
/// Fails with [`DecoderError::Range`] if the field is empty or does not
/// fit inside the 64-bit payload.
pub fn extract_raw(raw_payload: u64, signal: &Signal, options: ExtractOptions) -> Result<RawValue> {
    let bits = match (options.bit_numbering, signal.byte_order) {
        (BitNumbering::Declared, ByteOrder::BigEndian) => extract_motorola(raw_payload, signal)?,
        _ => extract_flat(raw_payload, signal)?,
    };

    let raw = match options.sign {
        SignHandling::TwosComplement if signal.is_signed => {
            RawValue::Signed(sign_extend(bits, signal.bit_length))
        }
        _ => RawValue::Unsigned(bits),
    };

    Ok(raw)
}

/// Apply `physical = raw * scale + offset`
pub fn to_physical(raw: RawValue, signal: &Signal) -> f64 {
    raw.as_f64() * signal.scale + signal.offset
}

/// Message decoder - extracts all signals of a message from a frame
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode a CAN frame against its message definition
    ///
    /// Signals whose bit span does not fit the payload are skipped with a
    /// warning; the others are returned in declaration order.
    pub fn decode_message(
        frame: &CanFrame,
        message: &Message,
        options: ExtractOptions,
    ) -> DecodedMessage {
        let signals = message
            .signals
            .iter()
            .filter_map(|signal| match Self::decode_signal(frame.payload, signal, options) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    log::warn!("Message {} (ID 0x{:X}): {}", message.name, frame.can_id, e);
                    None
                }
            })
            .collect();

        DecodedMessage {
            can_id: frame.can_id,
            name: message.name.clone(),
            signals,
        }
    }

    /// Decode a single signal from a payload
    pub fn decode_signal(
        raw_payload: u64,
        signal: &Signal,
        options: ExtractOptions,
    ) -> Result<DecodedSignal> {
        let raw_value = extract_raw(raw_payload, signal, options)?;

        Ok(DecodedSignal {
            name: signal.name.clone(),
            value: to_physical(raw_value, signal),
            raw_value,
            unit: signal.unit().map(str::to_string),
        })
    }
}

fn range_error(signal: &Signal) -> DecoderError {
    DecoderError::Range {
        signal: signal.name.clone(),
        start_bit: signal.start_bit,
        bit_length: signal.bit_length,
    }
}

/// All-ones mask of `bit_length` bits; 64 bits yields `u64::MAX`
fn field_mask(bit_length: u16) -> u64 {
    if u32::from(bit_length) >= PAYLOAD_BITS {
        u64::MAX
    } else {
        (1u64 << bit_length) - 1
    }
}

/// Contiguous field, `start_bit` is the LSB
fn extract_flat(raw_payload: u64, signal: &Signal) -> Result<u64> {
    let start = u32::from(signal.start_bit);
    let length = u32::from(signal.bit_length);
    if length == 0 || start + length > PAYLOAD_BITS {
        return Err(range_error(signal));
    }

    let mask = field_mask(signal.bit_length) << start;
    Ok((raw_payload & mask) >> start)
}

/// Motorola field, `start_bit` is the MSB
///
/// Within a byte the field runs towards bit 0, then continues at bit 7 of
/// the next byte (bit index `n` with `n % 8 == 0` is followed by `n + 15`).
fn extract_motorola(raw_payload: u64, signal: &Signal) -> Result<u64> {
    let length = u32::from(signal.bit_length);
    if length == 0 || length > PAYLOAD_BITS {
        return Err(range_error(signal));
    }

    let mut pos = u32::from(signal.start_bit);
    let mut result: u64 = 0;

    for i in 0..length {
        if pos >= PAYLOAD_BITS {
            return Err(range_error(signal));
        }
        result = (result << 1) | ((raw_payload >> pos) & 0x01);

        if i + 1 < length {
            pos = if pos % 8 == 0 { pos + 15 } else { pos - 1 };
        }
    }

    Ok(result)
}

/// Sign-extend a value from N bits to 64 bits
///
/// If the value's MSB is 1, fill the upper bits with 1s.
fn sign_extend(value: u64, bit_length: u16) -> i64 {
    if u32::from(bit_length) >= PAYLOAD_BITS {
        return value as i64;
    }

    let sign_bit = 1u64 << (bit_length - 1);
    if (value & sign_bit) != 0 {
        let mask = !0u64 << bit_length;
        (value | mask) as i64
    } else {
        value as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(start_bit: u16, bit_length: u16, scale: f64, offset: f64) -> Signal {
        Signal {
            name: "Test".to_string(),
            unit: String::new(),
            scale,
            offset,
            start_bit,
            bit_length,
            is_signed: false,
            byte_order: ByteOrder::LittleEndian,
        }
    }

    #[test]
    fn test_extract_full_byte() {
        let sig = signal(0, 8, 1.0, 0.0);
        assert_eq!(extract_value(0xFF, &sig).unwrap(), 255.0);
    }

    #[test]
    fn test_extract_with_scale_and_offset() {
        let sig = signal(8, 4, 2.0, 1.0);
        assert_eq!(extract_value(0x0F00, &sig).unwrap(), 31.0);
    }

    #[test]
    fn test_extract_whole_payload() {
        let sig = signal(0, 64, 1.0, 0.0);
        let raw = extract_raw(u64::MAX, &sig, ExtractOptions::default()).unwrap();
        assert_eq!(raw, RawValue::Unsigned(u64::MAX));
        assert_eq!(extract_value(u64::MAX, &sig).unwrap(), u64::MAX as f64);
    }

    #[test]
    fn test_extract_top_bits() {
        let sig = signal(60, 4, 1.0, 0.0);
        assert_eq!(extract_value(0xA000_0000_0000_0000, &sig).unwrap(), 10.0);
    }

    #[test]
    fn test_extract_is_pure() {
        let sig = signal(3, 13, 0.125, -7.5);
        let payload = 0xDEAD_BEEF_CAFE_F00D;
        let first = extract_value(payload, &sig).unwrap();
        let second = extract_value(payload, &sig).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extract_ignores_other_bits() {
        let sig = signal(8, 8, 1.0, 0.0);
        assert_eq!(extract_value(0xFFFF_FFFF_FFFF_12FF, &sig).unwrap(), 0x12 as f64);
    }

    #[test]
    fn test_range_errors() {
        for (start, length) in [(0, 0), (60, 5), (63, 2), (64, 1)] {
            let sig = signal(start, length, 1.0, 0.0);
            assert!(
                matches!(extract_value(0, &sig), Err(DecoderError::Range { .. })),
                "start {} length {}",
                start,
                length
            );
        }
    }

    #[test]
    fn test_signed_field_read_as_unsigned_by_default() {
        let mut sig = signal(0, 8, 1.0, 0.0);
        sig.is_signed = true;
        // Sign bit set, but no two's-complement reinterpretation
        assert_eq!(extract_value(0xFF, &sig).unwrap(), 255.0);
    }

    #[test]
    fn test_signed_field_sign_extended_on_request() {
        let mut sig = signal(0, 8, 1.0, 0.0);
        sig.is_signed = true;
        assert_eq!(extract_signed_value(0xFF, &sig).unwrap(), -1.0);
        assert_eq!(extract_signed_value(0x7F, &sig).unwrap(), 127.0);

        let mut temp = signal(16, 12, 0.5, 10.0);
        temp.is_signed = true;
        // 0x800 is -2048 in 12 bits
        assert_eq!(extract_signed_value(0x0800_0000, &temp).unwrap(), -2048.0 * 0.5 + 10.0);
    }

    #[test]
    fn test_unsigned_field_unchanged_by_sign_extension() {
        let sig = signal(0, 8, 1.0, 0.0);
        assert_eq!(extract_signed_value(0xFF, &sig).unwrap(), 255.0);
    }

    #[test]
    fn test_sign_extend_positive() {
        assert_eq!(sign_extend(0x7F, 8), 127);
    }

    #[test]
    fn test_sign_extend_negative() {
        assert_eq!(sign_extend(0xFF, 8), -1);
        assert_eq!(sign_extend(0x8000, 16), -32768);
        assert_eq!(sign_extend(u64::MAX, 64), -1);
    }

    #[test]
    fn test_big_endian_flat_by_default() {
        let mut sig = signal(0, 16, 1.0, 0.0);
        sig.byte_order = ByteOrder::BigEndian;
        // Flat numbering: same as the little-endian reading
        assert_eq!(extract_value(0xCDAB, &sig).unwrap(), 0xCDAB as f64);
    }

    #[test]
    fn test_motorola_single_byte() {
        let mut sig = signal(7, 8, 1.0, 0.0);
        sig.byte_order = ByteOrder::BigEndian;
        let frame = CanFrame::from_bytes(0x1, &[0xAB, 0xCD, 0xEF, 0x12]).unwrap();
        let raw = extract_raw(frame.payload, &sig, ExtractOptions::strict()).unwrap();
        assert_eq!(raw, RawValue::Unsigned(0xAB));
    }

    #[test]
    fn test_motorola_cross_byte() {
        let mut sig = signal(7, 16, 1.0, 0.0);
        sig.byte_order = ByteOrder::BigEndian;
        let frame = CanFrame::from_bytes(0x1, &[0xAB, 0xCD, 0xEF, 0x12]).unwrap();
        let raw = extract_raw(frame.payload, &sig, ExtractOptions::strict()).unwrap();
        assert_eq!(raw, RawValue::Unsigned(0xABCD));
    }

    #[test]
    fn test_motorola_nibble_spanning_bytes() {
        // MSB at byte 0 bit 1, runs into byte 1 bits 7..6
        let mut sig = signal(1, 4, 1.0, 0.0);
        sig.byte_order = ByteOrder::BigEndian;
        let frame = CanFrame::from_bytes(0x1, &[0b0000_0010, 0b1100_0000]).unwrap();
        let raw = extract_raw(frame.payload, &sig, ExtractOptions::strict()).unwrap();
        assert_eq!(raw, RawValue::Unsigned(0b1011));
    }

    #[test]
    fn test_motorola_signed() {
        let mut sig = signal(7, 8, 1.0, 0.0);
        sig.byte_order = ByteOrder::BigEndian;
        sig.is_signed = true;
        let raw = extract_raw(0x80, &sig, ExtractOptions::strict()).unwrap();
        assert_eq!(raw, RawValue::Signed(-128));
    }

    #[test]
    fn test_motorola_runs_past_payload() {
        let mut sig = signal(63, 16, 1.0, 0.0);
        sig.byte_order = ByteOrder::BigEndian;
        assert!(matches!(
            extract_raw(0, &sig, ExtractOptions::strict()),
            Err(DecoderError::Range { .. })
        ));
    }

    #[test]
    fn test_decode_message_skips_bad_signals() {
        let message = Message {
            id: 0x64,
            name: "EngineData".to_string(),
            signals: vec![
                Signal {
                    name: "RPM".to_string(),
                    unit: "rpm".to_string(),
                    ..signal(0, 16, 0.25, 0.0)
                },
                Signal {
                    name: "Broken".to_string(),
                    ..signal(60, 8, 1.0, 0.0)
                },
            ],
        };

        let frame = CanFrame::new(0x64, 0x1388);
        let decoded = MessageDecoder::decode_message(&frame, &message, ExtractOptions::default());

        assert_eq!(decoded.can_id, 0x64);
        assert_eq!(decoded.name, "EngineData");
        assert_eq!(decoded.signals.len(), 1);
        assert_eq!(decoded.signals[0].name, "RPM");
        assert_eq!(decoded.signals[0].value, 1250.0);
        assert_eq!(decoded.signals[0].raw_value, RawValue::Unsigned(5000));
        assert_eq!(decoded.signals[0].unit.as_deref(), Some("rpm"));
    }
}
