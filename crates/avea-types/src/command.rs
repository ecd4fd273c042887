//! Wire encoding for Avea lamp commands.
//!
//! The bulb takes commands as short writes to its control characteristic.
//! Two commands are supported:
//!
//! Color (13 bytes):
//!
//! ```text
//! offset  0     1     2     3     4     5..6   7..8   9..10  11..12
//! byte    0x35  0x32  0x00  0x0a  0x00  white  red    green  blue
//! ```
//!
//! Each channel field is a 16-bit word derived from the channel value `v`:
//! the value is widened to `E = v * 16`, then transmitted as the byte pair
//! `(E & 0xFF, (E >> 8) | (prefix << 4))`. The prefix nibble tags the
//! channel (white `0x8`, red `0x3`, green `0x2`, blue `0x1`), so fields are
//! self-identifying regardless of position.
//!
//! Brightness (3 bytes):
//!
//! ```text
//! offset  0     1         2
//! byte    0x57  E & 0xFF  E >> 8
//! ```
//!
//! Brightness uses the same `E = v * 16` widening but carries the low byte
//! first and has no prefix nibble. The orderings differ on the wire and the
//! firmware expects exactly these layouts.

use crate::types::{Brightness, CHANNEL_MAX, Color};

/// First byte of every color command.
pub const COLOR_OPCODE: u8 = 0x35;

/// First byte of every brightness command.
pub const BRIGHTNESS_OPCODE: u8 = 0x57;

/// Total length of an encoded color command.
pub const COLOR_PACKET_LEN: usize = 13;

/// Total length of an encoded brightness command.
pub const BRIGHTNESS_PACKET_LEN: usize = 3;

/// Fixed preamble of a color command.
const COLOR_HEADER: [u8; 5] = [COLOR_OPCODE, 0x32, 0x00, 0x0a, 0x00];

// Channel tag nibbles, as the firmware expects them.
const WHITE_PREFIX: u8 = 0x8;
const RED_PREFIX: u8 = 0x3;
const GREEN_PREFIX: u8 = 0x2;
const BLUE_PREFIX: u8 = 0x1;

/// An encoded command, ready to write to the control characteristic.
///
/// Packets are plain bytes with no framing beyond their fixed lengths;
/// [`CommandPacket::as_bytes`] is what actually goes over the air.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPacket {
    /// A 13-byte color command.
    Color([u8; COLOR_PACKET_LEN]),
    /// A 3-byte brightness command.
    Brightness([u8; BRIGHTNESS_PACKET_LEN]),
}

impl CommandPacket {
    /// The wire bytes of this command.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            CommandPacket::Color(bytes) => bytes,
            CommandPacket::Brightness(bytes) => bytes,
        }
    }
}

/// Encode a color into the 13-byte command the lamp expects.
///
/// # Examples
///
/// ```
/// use avea_types::{Color, encode_color};
///
/// let packet = encode_color(Color::OFF);
/// assert_eq!(packet.as_bytes()[0], 0x35);
/// assert_eq!(packet.as_bytes().len(), 13);
/// ```
#[must_use]
pub fn encode_color(color: Color) -> CommandPacket {
    let mut bytes = [0u8; COLOR_PACKET_LEN];
    bytes[..COLOR_HEADER.len()].copy_from_slice(&COLOR_HEADER);

    let channels = [
        (WHITE_PREFIX, color.white),
        (RED_PREFIX, color.red),
        (GREEN_PREFIX, color.green),
        (BLUE_PREFIX, color.blue),
    ];
    for (i, (prefix, value)) in channels.into_iter().enumerate() {
        let (high, low) = split_word(channel_word(prefix, u16::from(value)));
        bytes[COLOR_HEADER.len() + 2 * i] = high;
        bytes[COLOR_HEADER.len() + 2 * i + 1] = low;
    }
    CommandPacket::Color(bytes)
}

/// Encode a brightness level into the 3-byte command the lamp expects.
///
/// # Examples
///
/// ```
/// use avea_types::{Brightness, encode_brightness};
///
/// let packet = encode_brightness(Brightness::MAX);
/// assert_eq!(packet.as_bytes(), &[0x57, 0xF0, 0x0F]);
/// ```
#[must_use]
pub fn encode_brightness(brightness: Brightness) -> CommandPacket {
    let extended = u16::from(brightness.value()) * 16;
    let (high, low) = split_word(extended);
    // Low byte first, unlike the color fields.
    CommandPacket::Brightness([BRIGHTNESS_OPCODE, low, high])
}

/// Pack one channel value and its tag nibble into a 16-bit field word.
///
/// Values above [`CHANNEL_MAX`] encode to an all-zero word, prefix
/// included, matching the firmware's tolerance for garbage fields. The
/// validating constructors keep such values out of normal paths.
fn channel_word(prefix: u8, value: u16) -> u16 {
    if value > u16::from(CHANNEL_MAX) {
        return 0;
    }
    let extended = value * 16;
    let prefix_mask = u16::from(prefix) << 4;
    let lower = (extended >> 8) | prefix_mask;
    let higher = extended & 0xFF;
    (higher << 8) | lower
}

/// Split a word into `(high, low)` bytes.
fn split_word(word: u16) -> (u8, u8) {
    ((word >> 8) as u8, (word & 0xFF) as u8)
}


/// Property-based tests for the command encoders.
///
/// These pin down the structural invariants of the wire format for every
/// possible channel value rather than a handful of golden vectors.
///
/// # Test Categories
///
/// ## Shape Tests
/// - `color_packets_keep_header_and_tags`: header and tag nibbles for any color
/// - `brightness_packets_keep_opcode`: opcode for any level
///
/// ## Losslessness Tests
/// - `color_channels_are_recoverable`: every channel value survives a decode
/// - `brightness_is_recoverable`: every level survives a decode
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Undo the `E = v * 16` widening of one color field.
    fn decode_field(high: u8, low: u8) -> u16 {
        ((u16::from(low & 0x0F) << 8) | u16::from(high)) / 16
    }

    proptest! {
        /// Every encoded color keeps the fixed header and channel tags.
        #[test]
        fn color_packets_keep_header_and_tags(red: u8, green: u8, blue: u8, white: u8) {
            let color = Color { red, green, blue, white };
            let packet = encode_color(color);
            let bytes = packet.as_bytes();
            prop_assert_eq!(bytes.len(), COLOR_PACKET_LEN);
            prop_assert_eq!(&bytes[..5], &[0x35, 0x32, 0x00, 0x0a, 0x00]);
            prop_assert_eq!(bytes[6] >> 4, 0x8);
            prop_assert_eq!(bytes[8] >> 4, 0x3);
            prop_assert_eq!(bytes[10] >> 4, 0x2);
            prop_assert_eq!(bytes[12] >> 4, 0x1);
        }

        /// No channel value is lost or clamped by the widening.
        #[test]
        fn color_channels_are_recoverable(red: u8, green: u8, blue: u8, white: u8) {
            let color = Color { red, green, blue, white };
            let bytes = match encode_color(color) {
                CommandPacket::Color(bytes) => bytes,
                CommandPacket::Brightness(_) => unreachable!(),
            };
            prop_assert_eq!(decode_field(bytes[5], bytes[6]), u16::from(white));
            prop_assert_eq!(decode_field(bytes[7], bytes[8]), u16::from(red));
            prop_assert_eq!(decode_field(bytes[9], bytes[10]), u16::from(green));
            prop_assert_eq!(decode_field(bytes[11], bytes[12]), u16::from(blue));
        }

        /// Every encoded brightness keeps its opcode and length.
        #[test]
        fn brightness_packets_keep_opcode(value: u8) {
            let packet = encode_brightness(Brightness::from(value));
            let bytes = packet.as_bytes();
            prop_assert_eq!(bytes.len(), BRIGHTNESS_PACKET_LEN);
            prop_assert_eq!(bytes[0], BRIGHTNESS_OPCODE);
        }

        /// Brightness levels survive a low-byte-first decode.
        #[test]
        fn brightness_is_recoverable(value: u8) {
            let bytes = match encode_brightness(Brightness::from(value)) {
                CommandPacket::Brightness(bytes) => bytes,
                CommandPacket::Color(_) => unreachable!(),
            };
            let widened = (u16::from(bytes[2]) << 8) | u16::from(bytes[1]);
            prop_assert_eq!(widened / 16, u16::from(value));
        }
    }
}
