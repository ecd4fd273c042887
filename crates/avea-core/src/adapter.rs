//! Adapter capability boundary between the session engine and the BLE stack.
//!
//! A session never talks to the platform directly. It issues one request per
//! [`LampAdapter`] method and consumes the outcomes as [`AdapterEvent`]s from
//! a single channel, which keeps the whole command flow a plain match over
//! one event stream.

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use avea_types::DeviceAddress;

use crate::error::Result;

/// A lamp seen by the adapter during resolution or scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisedLamp {
    /// Platform identifier used for connecting and persistence.
    pub address: DeviceAddress,
    /// Advertised local name, if the advertisement carried one.
    pub name: Option<String>,
}

impl AdvertisedLamp {
    /// Create a descriptor from an address and an optional name.
    pub fn new(address: impl Into<DeviceAddress>, name: Option<String>) -> Self {
        Self {
            address: address.into(),
            name,
        }
    }
}

/// Notifications delivered by a [`LampAdapter`] over its event channel.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AdapterEvent {
    /// The platform stack is powered on and accepting requests.
    Ready,
    /// Outcome of a known-address lookup; empty when none are reachable.
    Resolved(Vec<AdvertisedLamp>),
    /// A matching lamp advertised during an open scan.
    DeviceSeen(AdvertisedLamp),
    /// The pending connection completed.
    Connected,
    /// Service UUIDs discovered on the connected lamp.
    ServicesFound(Vec<Uuid>),
    /// Characteristic UUIDs discovered within the requested service.
    CharacteristicsFound(Vec<Uuid>),
    /// The lamp acknowledged the characteristic write.
    WriteAcknowledged,
    /// The adapter failed mid-flow.
    Error(String),
}

/// Sender half of an adapter's event channel.
pub type EventSender = mpsc::UnboundedSender<AdapterEvent>;

/// Receiver half of an adapter's event channel, owned by the session.
pub type EventReceiver = mpsc::UnboundedReceiver<AdapterEvent>;

/// Create the event channel connecting an adapter to its session.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// One BLE operation per method; outcomes arrive as [`AdapterEvent`]s.
///
/// Implementations report failure either by returning `Err` from the
/// request itself or by emitting [`AdapterEvent::Error`] later. Successful
/// outcomes always travel through the event channel.
///
/// # Example
///
/// ```ignore
/// use avea_core::{LampAdapter, Session};
///
/// async fn drive(adapter: Box<dyn LampAdapter>) {
///     // A Session owns the adapter and its event receiver together.
/// }
/// ```
#[async_trait]
pub trait LampAdapter: Send {
    // --- Stack Lifecycle ---

    /// Bring up the platform stack; emits [`AdapterEvent::Ready`].
    async fn start(&mut self) -> Result<()>;

    // --- Discovery ---

    /// Look up previously seen lamps by address; emits
    /// [`AdapterEvent::Resolved`] with whichever are currently reachable.
    async fn resolve(&mut self, known: &[DeviceAddress]) -> Result<()>;

    /// Begin an open scan; emits [`AdapterEvent::DeviceSeen`] for every
    /// advertisement whose local name contains `name_fragment`.
    async fn scan(&mut self, name_fragment: &str) -> Result<()>;

    /// Stop an in-progress scan. Emits nothing.
    async fn stop_scan(&mut self) -> Result<()>;

    // --- Connection ---

    /// Connect to a lamp; emits [`AdapterEvent::Connected`].
    async fn connect(&mut self, address: &DeviceAddress) -> Result<()>;

    // --- GATT Discovery ---

    /// Discover services on the connected lamp; emits
    /// [`AdapterEvent::ServicesFound`].
    async fn discover_service(&mut self, service: Uuid) -> Result<()>;

    /// Discover characteristics within `service`; emits
    /// [`AdapterEvent::CharacteristicsFound`].
    async fn discover_characteristic(&mut self, service: Uuid, characteristic: Uuid)
    -> Result<()>;

    // --- Commands ---

    /// Write `payload` with acknowledgment; emits
    /// [`AdapterEvent::WriteAcknowledged`] once the lamp confirms.
    async fn write_with_ack(&mut self, characteristic: Uuid, payload: &[u8]) -> Result<()>;
}
