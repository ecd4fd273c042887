//! Blocking facade over one-shot command sessions.
//!
//! [`Lamp`] is the synchronous entry point: it owns a private tokio runtime
//! and runs one full [`Session`] per command, blocking the caller until the
//! lamp acknowledges the write or the session fails.

use std::collections::HashSet;

use tokio::runtime::Runtime;

use avea_types::{
    Brightness, Color, CommandPacket, DeviceAddress, encode_brightness, encode_color,
};

use crate::adapter::{EventReceiver, LampAdapter};
use crate::central::BleCentral;
use crate::error::Result;
use crate::session::{Session, discovery_channel};

/// Blocking handle for sending commands to an Avea lamp.
///
/// Every command runs a complete session against a fresh adapter: stack
/// bring-up, lamp discovery, connection, and the acknowledged write. Calls
/// return once the lamp has acknowledged or the session has definitively
/// failed. There is no built-in timeout; a command with no reachable lamp
/// blocks indefinitely, and callers wanting bounded waiting enforce their
/// own policy around the call.
pub struct Lamp {
    runtime: Runtime,
}

impl Lamp {
    /// Create a lamp handle with its own async runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be created.
    pub fn new() -> Result<Self> {
        let runtime = Runtime::new()?;
        Ok(Self { runtime })
    }

    /// Send one encoded command to the first matching lamp.
    ///
    /// Addresses in `known` are tried before falling back to an open scan.
    /// Every address seen for the first time is handed to `on_discovered`
    /// on the calling thread after the session settles, on success and on
    /// failure alike.
    pub fn send_command(
        &self,
        packet: CommandPacket,
        known: &HashSet<DeviceAddress>,
        on_discovered: impl FnMut(DeviceAddress),
    ) -> Result<()> {
        let (adapter, events) = BleCentral::create();
        self.send_with(Box::new(adapter), events, packet, known, on_discovered)
    }

    /// Set the lamp's four color channels.
    pub fn set_color(
        &self,
        color: Color,
        known: &HashSet<DeviceAddress>,
        on_discovered: impl FnMut(DeviceAddress),
    ) -> Result<()> {
        self.send_command(encode_color(color), known, on_discovered)
    }

    /// Set the lamp's overall brightness.
    pub fn set_brightness(
        &self,
        brightness: Brightness,
        known: &HashSet<DeviceAddress>,
        on_discovered: impl FnMut(DeviceAddress),
    ) -> Result<()> {
        self.send_command(encode_brightness(brightness), known, on_discovered)
    }

    /// Turn the lamp off by zeroing every color channel.
    pub fn turn_off(
        &self,
        known: &HashSet<DeviceAddress>,
        on_discovered: impl FnMut(DeviceAddress),
    ) -> Result<()> {
        self.set_color(Color::OFF, known, on_discovered)
    }

    /// Run a session on the given adapter and replay discoveries afterwards.
    fn send_with(
        &self,
        adapter: Box<dyn LampAdapter>,
        events: EventReceiver,
        packet: CommandPacket,
        known: &HashSet<DeviceAddress>,
        mut on_discovered: impl FnMut(DeviceAddress),
    ) -> Result<()> {
        let (discovered_tx, mut discovered_rx) = discovery_channel();
        let session = Session::new(adapter, events, packet, known.clone(), discovered_tx);
        let outcome = self.runtime.block_on(session.run());

        // The session is gone at this point, so the channel holds the full
        // set of newly seen addresses.
        while let Ok(address) = discovered_rx.try_recv() {
            on_discovered(address);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterEvent, AdvertisedLamp};
    use crate::error::Error;
    use crate::mock::{AdapterCall, MockAdapterBuilder};
    use avea_types::uuid::{COLOR_CHARACTERISTIC, COLOR_SERVICE};

    // These tests exercise the blocking surface, so they run on plain
    // threads and let the Lamp's own runtime do the async work.

    fn seen(address: &str) -> AdapterEvent {
        AdapterEvent::DeviceSeen(AdvertisedLamp::new(address, Some("Avea_E2".to_string())))
    }

    #[test]
    fn test_send_command_blocks_until_acknowledged() {
        let (adapter, events) = MockAdapterBuilder::new()
            .on_start(vec![AdapterEvent::Ready])
            .on_scan(vec![seen("AC:E6:4B:01:02:03")])
            .on_connect(vec![AdapterEvent::Connected])
            .on_discover_service(vec![AdapterEvent::ServicesFound(vec![COLOR_SERVICE])])
            .on_discover_characteristic(vec![AdapterEvent::CharacteristicsFound(vec![
                COLOR_CHARACTERISTIC,
            ])])
            .on_write(vec![AdapterEvent::WriteAcknowledged])
            .build();
        let log = adapter.call_log();

        let lamp = Lamp::new().unwrap();
        let mut discovered = Vec::new();
        let packet = encode_color(Color::OFF);
        lamp.send_with(
            Box::new(adapter),
            events,
            packet,
            &HashSet::new(),
            |address| discovered.push(address),
        )
        .unwrap();

        assert_eq!(discovered, vec![DeviceAddress::from("AC:E6:4B:01:02:03")]);
        let calls = log.snapshot();
        assert_eq!(
            calls.last(),
            Some(&AdapterCall::WriteWithAck(
                COLOR_CHARACTERISTIC,
                packet.as_bytes().to_vec()
            ))
        );
    }

    #[test]
    fn test_discoveries_are_replayed_after_a_failed_session() {
        let (adapter, events) = MockAdapterBuilder::new()
            .on_start(vec![AdapterEvent::Ready])
            .on_scan(vec![
                seen("AC:E6:4B:0A:0B:0C"),
                AdapterEvent::Error("radio fault".to_string()),
            ])
            .build();

        let lamp = Lamp::new().unwrap();
        let mut discovered = Vec::new();
        let err = lamp
            .send_with(
                Box::new(adapter),
                events,
                encode_color(Color::OFF),
                &HashSet::new(),
                |address| discovered.push(address),
            )
            .unwrap_err();

        assert!(matches!(err, Error::Adapter(_)));
        assert_eq!(discovered, vec![DeviceAddress::from("AC:E6:4B:0A:0B:0C")]);
    }

    #[test]
    fn test_rejected_input_never_touches_the_adapter() {
        let (adapter, events) = MockAdapterBuilder::new().build();
        let log = adapter.call_log();
        let lamp = Lamp::new().unwrap();

        let outcome = Color::rgbw(0, 0, 0, 300).map(|color| {
            lamp.send_with(
                Box::new(adapter),
                events,
                encode_color(color),
                &HashSet::new(),
                |_| {},
            )
        });

        assert!(outcome.is_err());
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn test_brightness_command_writes_the_brightness_packet() {
        let (adapter, events) = MockAdapterBuilder::new()
            .on_start(vec![AdapterEvent::Ready])
            .on_scan(vec![seen("AC:E6:4B:01:02:03")])
            .on_connect(vec![AdapterEvent::Connected])
            .on_discover_service(vec![AdapterEvent::ServicesFound(vec![COLOR_SERVICE])])
            .on_discover_characteristic(vec![AdapterEvent::CharacteristicsFound(vec![
                COLOR_CHARACTERISTIC,
            ])])
            .on_write(vec![AdapterEvent::WriteAcknowledged])
            .build();
        let log = adapter.call_log();

        let lamp = Lamp::new().unwrap();
        let packet = encode_brightness(Brightness::from(128));
        lamp.send_with(Box::new(adapter), events, packet, &HashSet::new(), |_| {})
            .unwrap();

        assert_eq!(
            log.snapshot().last(),
            Some(&AdapterCall::WriteWithAck(
                COLOR_CHARACTERISTIC,
                vec![0x57, 0x00, 0x08]
            ))
        );
    }
}
