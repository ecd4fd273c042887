//! Core types for Avea lamp commands.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// Largest value accepted for a color channel or brightness.
pub const CHANNEL_MAX: u8 = 255;

/// An RGBW color as the lamp understands it.
///
/// Each channel covers `0..=255`. The white channel drives the dedicated
/// white LEDs and is independent of the RGB channels.
///
/// # Examples
///
/// ```
/// use avea_types::Color;
///
/// let orange = Color::rgbw(255, 75, 0, 0).unwrap();
/// assert_eq!(orange.red, 255);
/// assert!(Color::rgbw(300, 0, 0, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    /// Red channel intensity.
    pub red: u8,
    /// Green channel intensity.
    pub green: u8,
    /// Blue channel intensity.
    pub blue: u8,
    /// White LED intensity.
    pub white: u8,
}

impl Color {
    /// All channels off. Sending this turns the lamp dark.
    pub const OFF: Color = Color {
        red: 0,
        green: 0,
        blue: 0,
        white: 0,
    };

    /// Build a color from untrusted channel values.
    ///
    /// Accepts `u16` so callers can pass values straight from parsed
    /// input; anything above [`CHANNEL_MAX`] is rejected with the name of
    /// the offending channel.
    pub fn rgbw(red: u16, green: u16, blue: u16, white: u16) -> ValidationResult<Self> {
        Ok(Color {
            red: validate_channel("red", red)?,
            green: validate_channel("green", green)?,
            blue: validate_channel("blue", blue)?,
            white: validate_channel("white", white)?,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Red: {}, Green: {}, Blue: {}, White: {}",
            self.red, self.green, self.blue, self.white
        )
    }
}

fn validate_channel(field: &'static str, value: u16) -> ValidationResult<u8> {
    u8::try_from(value).map_err(|_| ValidationError::out_of_range(field, value))
}

/// Overall lamp brightness, applied on top of the current color.
///
/// # Examples
///
/// ```
/// use avea_types::Brightness;
///
/// let half = Brightness::new(128).unwrap();
/// assert_eq!(half.value(), 128);
/// assert!(Brightness::new(256).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Brightness(u8);

impl Brightness {
    /// Maximum brightness.
    pub const MAX: Brightness = Brightness(CHANNEL_MAX);

    /// Build a brightness level from an untrusted value.
    pub fn new(value: u16) -> ValidationResult<Self> {
        validate_channel("brightness", value).map(Brightness)
    }

    /// The raw level, `0..=255`.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<u8> for Brightness {
    fn from(value: u8) -> Self {
        Brightness(value)
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/255", self.0)
    }
}

/// Opaque identifier for a lamp as reported by the platform BLE stack.
///
/// On macOS this is a CoreBluetooth peripheral UUID, on Linux a MAC-derived
/// device path. The string is only ever compared and persisted, never
/// interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Wrap a platform identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        DeviceAddress(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceAddress {
    fn from(id: &str) -> Self {
        DeviceAddress(id.to_string())
    }
}

impl From<String> for DeviceAddress {
    fn from(id: String) -> Self {
        DeviceAddress(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_accepts_full_range() {
        let color = Color::rgbw(0, 128, 255, 10).unwrap();
        assert_eq!(color.green, 128);
        assert_eq!(color.blue, 255);
    }

    #[test]
    fn test_color_rejects_out_of_range_channel() {
        let err = Color::rgbw(0, 0, 300, 0).unwrap_err();
        assert_eq!(err, ValidationError::out_of_range("blue", 300));
        assert_eq!(err.to_string(), "blue value 300 out of range (0-255)");
    }

    #[test]
    fn test_color_reports_first_bad_channel() {
        // Channels validate in RGBW order
        let err = Color::rgbw(999, 999, 0, 0).unwrap_err();
        assert_eq!(err, ValidationError::out_of_range("red", 999));
    }

    #[test]
    fn test_color_off_is_all_zero() {
        assert_eq!(Color::OFF, Color::rgbw(0, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_color_display() {
        let color = Color::rgbw(255, 75, 0, 0).unwrap();
        assert_eq!(color.to_string(), "Red: 255, Green: 75, Blue: 0, White: 0");
    }

    #[test]
    fn test_brightness_bounds() {
        assert!(Brightness::new(0).is_ok());
        assert!(Brightness::new(255).is_ok());
        let err = Brightness::new(256).unwrap_err();
        assert_eq!(err, ValidationError::out_of_range("brightness", 256));
    }

    #[test]
    fn test_brightness_display() {
        assert_eq!(Brightness::MAX.to_string(), "255/255");
        assert_eq!(Brightness::from(64).to_string(), "64/255");
    }

    #[test]
    fn test_device_address_round_trip() {
        let address = DeviceAddress::new("12345678-90AB-CDEF-1234-567890ABCDEF");
        assert_eq!(address.as_str(), "12345678-90AB-CDEF-1234-567890ABCDEF");
        assert_eq!(address.to_string(), address.as_str());
    }

    #[test]
    fn test_device_address_equality_is_exact() {
        let a = DeviceAddress::from("AA:BB:CC:DD:EE:FF");
        let b = DeviceAddress::from("aa:bb:cc:dd:ee:ff");
        assert_ne!(a, b);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_color_serde_round_trip() {
        let color = Color::rgbw(200, 100, 0, 175).unwrap();
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, r#"{"red":200,"green":100,"blue":0,"white":175}"#);
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, color);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_device_address_serializes_transparently() {
        let address = DeviceAddress::from("ABCD-1234");
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, r#""ABCD-1234""#);
    }
}
