//! Platform-agnostic types for Elgato Avea lamps.
//!
//! This crate provides the command vocabulary shared by the session engine
//! (avea-core) and the command-line tool: colors, brightness levels, device
//! addresses and the exact wire encoding the bulb's firmware expects.
//!
//! # Features
//!
//! - Validated color and brightness values
//! - Bit-exact command packet encoding
//! - UUID constants for the lamp's BLE service
//! - Optional serde support for persistence
//!
//! # Example
//!
//! ```
//! use avea_types::{Color, encode_color};
//!
//! let color = Color::rgbw(255, 75, 0, 0).unwrap();
//! let packet = encode_color(color);
//! assert_eq!(packet.as_bytes().len(), 13);
//! ```

pub mod command;
pub mod error;
pub mod types;
pub mod uuid;

pub use command::{CommandPacket, encode_brightness, encode_color};
pub use error::{ValidationError, ValidationResult};
pub use types::{Brightness, Color, DeviceAddress};
pub use uuid as uuids;
