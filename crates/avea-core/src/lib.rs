//! Core BLE library for the Elgato Avea lamp.
//!
//! This crate drives the Avea bulb's proprietary color protocol over
//! Bluetooth Low Energy: it finds a lamp, connects, and writes encoded
//! color or brightness commands to the vendor characteristic, waiting for
//! the lamp's acknowledgment.
//!
//! # Features
//!
//! - **Lamp discovery**: resolve stored addresses or scan by advertised name
//! - **One-shot sessions**: each command runs from stack bring-up to the
//!   acknowledged write
//! - **Blocking facade**: [`Lamp`] hides the async machinery behind plain
//!   function calls
//! - **Scripted mock**: [`MockAdapter`] drives the full flow in tests
//!   without a radio
//!
//! # Quick Start
//!
//! ```no_run
//! use std::collections::HashSet;
//!
//! use avea_core::{Color, Lamp};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lamp = Lamp::new()?;
//!     let orange = Color::rgbw(255, 75, 0, 0)?;
//!
//!     // Blocks until a lamp has acknowledged the command.
//!     lamp.set_color(orange, &HashSet::new(), |address| {
//!         println!("discovered lamp at {address}");
//!     })?;
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod central;
pub mod error;
pub mod lamp;
pub mod mock;
pub mod session;

// Core exports
pub use adapter::{
    AdapterEvent, AdvertisedLamp, EventReceiver, EventSender, LampAdapter, event_channel,
};
pub use central::BleCentral;
pub use error::{Error, ProtocolItem, Result};
pub use lamp::Lamp;
pub use mock::{AdapterCall, CallLog, MockAdapter, MockAdapterBuilder, mock_address};
pub use session::{
    DiscoveryReceiver, DiscoverySender, Session, SessionState, discovery_channel,
};

// Re-export from avea-types
pub use avea_types::uuid as uuids;
pub use avea_types::{
    Brightness, Color, CommandPacket, DeviceAddress, encode_brightness, encode_color,
};
