//! One-shot command session against a single lamp.
//!
//! A [`Session`] owns an adapter and drives one command from stack bring-up
//! to write acknowledgment. All adapter outcomes arrive on one event
//! channel, so the whole flow is a synchronous match over
//! `(state, event)` pairs; each accepted event issues at most one follow-up
//! request. Sessions are single-use: terminal states accept nothing.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use avea_types::uuid::{ADVERTISED_NAME_FRAGMENT, COLOR_CHARACTERISTIC, COLOR_SERVICE};
use avea_types::{CommandPacket, DeviceAddress};

use crate::adapter::{AdapterEvent, AdvertisedLamp, EventReceiver, LampAdapter};
use crate::error::{Error, Result};

/// Where a session currently is in the command flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been issued yet.
    Idle,
    /// Stack bring-up requested.
    AdapterStarting,
    /// Waiting for the stack to report it is powered on.
    AwaitingPowerOn,
    /// Looking for a lamp, by known address or open scan.
    Resolving,
    /// Connection to a chosen lamp pending.
    Connecting,
    /// Service discovery pending on the connected lamp.
    ServiceDiscovery,
    /// Characteristic discovery pending within the control service.
    CharacteristicDiscovery,
    /// Command written, acknowledgment pending.
    Writing,
    /// The lamp acknowledged the command.
    Completed,
    /// The session ended without an acknowledgment.
    Failed,
}

impl SessionState {
    /// Terminal states accept no further events.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

/// Sender for lamp addresses seen for the first time during a session.
///
/// The facade drains this after the session settles and replays it into the
/// caller's callback.
pub type DiscoverySender = mpsc::UnboundedSender<DeviceAddress>;

/// Receiver half of the discovery channel.
pub type DiscoveryReceiver = mpsc::UnboundedReceiver<DeviceAddress>;

/// Create the channel carrying newly discovered lamp addresses.
pub fn discovery_channel() -> (DiscoverySender, DiscoveryReceiver) {
    mpsc::unbounded_channel()
}

/// Drives one encoded command to the first matching lamp.
pub struct Session {
    adapter: Box<dyn LampAdapter>,
    events: EventReceiver,
    packet: CommandPacket,
    known: HashSet<DeviceAddress>,
    discovered: DiscoverySender,
    reported: HashSet<DeviceAddress>,
    chosen: Option<DeviceAddress>,
    scanning: bool,
    state: SessionState,
}

impl Session {
    /// Create a session for one command.
    ///
    /// `known` holds addresses of lamps seen in earlier runs; resolution is
    /// tried against them before falling back to an open scan. Addresses
    /// outside that set are sent to `discovered` the first time they appear.
    pub fn new(
        adapter: Box<dyn LampAdapter>,
        events: EventReceiver,
        packet: CommandPacket,
        known: HashSet<DeviceAddress>,
        discovered: DiscoverySender,
    ) -> Self {
        Self {
            adapter,
            events,
            packet,
            known,
            discovered,
            reported: HashSet::new(),
            chosen: None,
            scanning: false,
            state: SessionState::Idle,
        }
    }

    /// The session's current position in the command flow.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session until the lamp acknowledges or the flow fails.
    ///
    /// There is no timeout: if the adapter never delivers the next event,
    /// this future stays pending. Callers wanting bounded waiting enforce
    /// their own policy around the session.
    pub async fn run(mut self) -> Result<()> {
        self.begin().await?;
        loop {
            let Some(event) = self.events.recv().await else {
                let error = match self.state {
                    SessionState::Resolving => {
                        Error::discovery_exhausted("scan ended without a matching lamp")
                    }
                    _ => Error::EventStreamClosed,
                };
                return Err(self.fail(error));
            };
            if self.handle_event(event).await? {
                return Ok(());
            }
        }
    }

    /// Issue the initial stack bring-up request.
    async fn begin(&mut self) -> Result<()> {
        debug!("starting Bluetooth stack");
        self.state = SessionState::AdapterStarting;
        if let Err(error) = self.adapter.start().await {
            return Err(self.fail(error));
        }
        self.state = SessionState::AwaitingPowerOn;
        Ok(())
    }

    /// Apply one adapter event. Returns `Ok(true)` once the command is
    /// acknowledged.
    async fn handle_event(&mut self, event: AdapterEvent) -> Result<bool> {
        match (self.state, event) {
            (SessionState::AwaitingPowerOn, AdapterEvent::Ready) => {
                info!("adapter powered on");
                self.state = SessionState::Resolving;
                if self.known.is_empty() {
                    self.start_scan().await?;
                } else {
                    let known: Vec<DeviceAddress> = self.known.iter().cloned().collect();
                    debug!(count = known.len(), "resolving known lamp addresses");
                    if let Err(error) = self.adapter.resolve(&known).await {
                        return Err(self.fail(error));
                    }
                }
                Ok(false)
            }
            (SessionState::Resolving, AdapterEvent::Resolved(lamps)) => {
                match lamps.into_iter().next() {
                    Some(lamp) => {
                        info!(address = %lamp.address, "retrieved lamp from stored addresses");
                        self.connect_to(lamp).await?;
                    }
                    None => {
                        debug!("no stored lamp reachable, falling back to scanning");
                        self.start_scan().await?;
                    }
                }
                Ok(false)
            }
            (SessionState::Resolving, AdapterEvent::DeviceSeen(lamp)) => {
                info!(
                    address = %lamp.address,
                    name = lamp.name.as_deref().unwrap_or("<unnamed>"),
                    "discovered lamp"
                );
                self.report_new(&lamp);
                self.connect_to(lamp).await?;
                Ok(false)
            }
            (
                SessionState::Connecting
                | SessionState::ServiceDiscovery
                | SessionState::CharacteristicDiscovery
                | SessionState::Writing,
                AdapterEvent::DeviceSeen(lamp),
            ) => {
                // First match won; later sightings are only reported.
                self.report_new(&lamp);
                Ok(false)
            }
            (SessionState::Connecting, AdapterEvent::Connected) => {
                let address = self.chosen.as_ref().map_or("<unknown>", DeviceAddress::as_str);
                info!(address, "connected to lamp");
                if self.scanning {
                    if let Err(error) = self.adapter.stop_scan().await {
                        return Err(self.fail(error));
                    }
                    self.scanning = false;
                }
                self.state = SessionState::ServiceDiscovery;
                debug!(service = %COLOR_SERVICE, "looking for color service");
                if let Err(error) = self.adapter.discover_service(COLOR_SERVICE).await {
                    return Err(self.fail(error));
                }
                Ok(false)
            }
            (SessionState::ServiceDiscovery, AdapterEvent::ServicesFound(services)) => {
                if !services.contains(&COLOR_SERVICE) {
                    return Err(self.fail(Error::missing_service(COLOR_SERVICE)));
                }
                debug!("found color service");
                self.state = SessionState::CharacteristicDiscovery;
                if let Err(error) = self
                    .adapter
                    .discover_characteristic(COLOR_SERVICE, COLOR_CHARACTERISTIC)
                    .await
                {
                    return Err(self.fail(error));
                }
                Ok(false)
            }
            (
                SessionState::CharacteristicDiscovery,
                AdapterEvent::CharacteristicsFound(characteristics),
            ) => {
                if !characteristics.contains(&COLOR_CHARACTERISTIC) {
                    return Err(self.fail(Error::missing_characteristic(COLOR_CHARACTERISTIC)));
                }
                debug!("found color characteristic, sending data");
                self.state = SessionState::Writing;
                let packet = self.packet;
                if let Err(error) = self
                    .adapter
                    .write_with_ack(COLOR_CHARACTERISTIC, packet.as_bytes())
                    .await
                {
                    return Err(self.fail(error));
                }
                Ok(false)
            }
            (SessionState::Writing, AdapterEvent::WriteAcknowledged) => {
                info!("data sent, lamp acknowledged the command");
                self.state = SessionState::Completed;
                Ok(true)
            }
            (state, AdapterEvent::Error(message)) => {
                let error = match state {
                    SessionState::Writing => Error::write_failed(COLOR_CHARACTERISTIC, message),
                    _ => Error::adapter(message),
                };
                Err(self.fail(error))
            }
            (state, event) => {
                debug!(?state, ?event, "ignoring unexpected event");
                Ok(false)
            }
        }
    }

    /// Begin an open scan for lamps advertising the Avea name.
    async fn start_scan(&mut self) -> Result<()> {
        info!("scanning for lamps");
        match self.adapter.scan(ADVERTISED_NAME_FRAGMENT).await {
            Ok(()) => {
                self.scanning = true;
                Ok(())
            }
            Err(error) => Err(self.fail(Error::discovery_exhausted(format!(
                "scan could not start: {error}"
            )))),
        }
    }

    /// Commit to the given lamp and request a connection.
    async fn connect_to(&mut self, lamp: AdvertisedLamp) -> Result<()> {
        self.state = SessionState::Connecting;
        info!(address = %lamp.address, "connecting to lamp");
        self.chosen = Some(lamp.address.clone());
        if let Err(error) = self.adapter.connect(&lamp.address).await {
            return Err(self.fail(error));
        }
        Ok(())
    }

    /// Report an address the caller has never seen, exactly once.
    fn report_new(&mut self, lamp: &AdvertisedLamp) {
        if self.known.contains(&lamp.address) || !self.reported.insert(lamp.address.clone()) {
            return;
        }
        debug!(address = %lamp.address, "reporting newly seen lamp address");
        let _ = self.discovered.send(lamp.address.clone());
    }

    /// Move to the failed state, keeping the error for the caller.
    fn fail(&mut self, error: Error) -> Error {
        warn!(state = ?self.state, %error, "session failed");
        self.state = SessionState::Failed;
        error
    }
}
