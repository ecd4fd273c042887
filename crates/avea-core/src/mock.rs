//! A mock lamp adapter for testing.
//!
//! [`MockAdapter`] implements [`LampAdapter`] without any Bluetooth. Each
//! operation is scripted at build time with the events it should emit, and
//! every request is recorded in a call log, so tests can assert both what a
//! session asked for and how it reacted to the answers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use avea_types::DeviceAddress;

use crate::adapter::{AdapterEvent, EventReceiver, EventSender, LampAdapter, event_channel};
use crate::error::{Error, Result};

/// Generate a random mock lamp address.
///
/// Useful in tests that don't care about the concrete identifier.
#[must_use]
pub fn mock_address() -> DeviceAddress {
    DeviceAddress::new(format!("MOCK-{:06X}", rand::random::<u32>() % 0xFF_FFFF))
}

/// One request issued against a [`MockAdapter`], with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterCall {
    /// `start` was requested.
    Start,
    /// `resolve` was requested with these known addresses.
    Resolve(Vec<DeviceAddress>),
    /// `scan` was requested with this name fragment.
    Scan(String),
    /// `stop_scan` was requested.
    StopScan,
    /// `connect` was requested for this address.
    Connect(DeviceAddress),
    /// `discover_service` was requested for this service.
    DiscoverService(Uuid),
    /// `discover_characteristic` was requested for `(service, characteristic)`.
    DiscoverCharacteristic(Uuid, Uuid),
    /// `write_with_ack` was requested with this payload.
    WriteWithAck(Uuid, Vec<u8>),
}

/// Shared, cloneable record of the requests a mock has received.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<AdapterCall>>>);

impl CallLog {
    fn push(&self, call: AdapterCall) {
        self.entries().push(call);
    }

    /// A copy of all recorded calls, in request order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AdapterCall> {
        self.entries().clone()
    }

    /// How many requests have been recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<AdapterCall>> {
        // A panic while holding the lock only poisons recorded history,
        // which stays readable.
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Whether no requests have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A scripted [`LampAdapter`] for driving sessions in tests.
///
/// # Example
///
/// ```
/// use avea_core::adapter::AdapterEvent;
/// use avea_core::mock::MockAdapterBuilder;
///
/// let (adapter, _events) = MockAdapterBuilder::new()
///     .on_start(vec![AdapterEvent::Ready])
///     .build();
/// let log = adapter.call_log();
/// assert!(log.is_empty());
/// ```
#[derive(Debug)]
pub struct MockAdapter {
    events: Option<EventSender>,
    calls: CallLog,
    on_start: Vec<AdapterEvent>,
    on_resolve: Vec<AdapterEvent>,
    on_scan: Vec<AdapterEvent>,
    on_connect: Vec<AdapterEvent>,
    on_discover_service: Vec<AdapterEvent>,
    on_discover_characteristic: Vec<AdapterEvent>,
    on_write: Vec<AdapterEvent>,
    refuse_scan: Option<String>,
    close_after_scan: bool,
}

impl MockAdapter {
    /// A handle to this mock's call log.
    ///
    /// Take it before boxing the adapter into a session; the log stays
    /// readable while the session owns the mock.
    #[must_use]
    pub fn call_log(&self) -> CallLog {
        self.calls.clone()
    }

    fn emit(&self, events: &[AdapterEvent]) {
        if let Some(sender) = &self.events {
            for event in events {
                let _ = sender.send(event.clone());
            }
        }
    }
}

#[async_trait]
impl LampAdapter for MockAdapter {
    async fn start(&mut self) -> Result<()> {
        self.calls.push(AdapterCall::Start);
        self.emit(&self.on_start);
        Ok(())
    }

    async fn resolve(&mut self, known: &[DeviceAddress]) -> Result<()> {
        self.calls.push(AdapterCall::Resolve(known.to_vec()));
        self.emit(&self.on_resolve);
        Ok(())
    }

    async fn scan(&mut self, name_fragment: &str) -> Result<()> {
        self.calls.push(AdapterCall::Scan(name_fragment.to_string()));
        if let Some(message) = &self.refuse_scan {
            return Err(Error::adapter(message.clone()));
        }
        self.emit(&self.on_scan);
        if self.close_after_scan {
            // Dropping the only sender ends the session's event stream
            self.events = None;
        }
        Ok(())
    }

    async fn stop_scan(&mut self) -> Result<()> {
        self.calls.push(AdapterCall::StopScan);
        Ok(())
    }

    async fn connect(&mut self, address: &DeviceAddress) -> Result<()> {
        self.calls.push(AdapterCall::Connect(address.clone()));
        self.emit(&self.on_connect);
        Ok(())
    }

    async fn discover_service(&mut self, service: Uuid) -> Result<()> {
        self.calls.push(AdapterCall::DiscoverService(service));
        self.emit(&self.on_discover_service);
        Ok(())
    }

    async fn discover_characteristic(
        &mut self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<()> {
        self.calls
            .push(AdapterCall::DiscoverCharacteristic(service, characteristic));
        self.emit(&self.on_discover_characteristic);
        Ok(())
    }

    async fn write_with_ack(&mut self, characteristic: Uuid, payload: &[u8]) -> Result<()> {
        self.calls
            .push(AdapterCall::WriteWithAck(characteristic, payload.to_vec()));
        self.emit(&self.on_write);
        Ok(())
    }
}

/// Builder for [`MockAdapter`] scripts.
///
/// Every `on_*` method sets the events that operation emits when called.
/// Unscripted operations record their call and emit nothing.
#[derive(Debug, Default)]
pub struct MockAdapterBuilder {
    on_start: Vec<AdapterEvent>,
    on_resolve: Vec<AdapterEvent>,
    on_scan: Vec<AdapterEvent>,
    on_connect: Vec<AdapterEvent>,
    on_discover_service: Vec<AdapterEvent>,
    on_discover_characteristic: Vec<AdapterEvent>,
    on_write: Vec<AdapterEvent>,
    refuse_scan: Option<String>,
    close_after_scan: bool,
}

impl MockAdapterBuilder {
    /// Create a builder with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted when `start` is called.
    #[must_use]
    pub fn on_start(mut self, events: Vec<AdapterEvent>) -> Self {
        self.on_start = events;
        self
    }

    /// Events emitted when `resolve` is called.
    #[must_use]
    pub fn on_resolve(mut self, events: Vec<AdapterEvent>) -> Self {
        self.on_resolve = events;
        self
    }

    /// Events emitted when `scan` is called.
    #[must_use]
    pub fn on_scan(mut self, events: Vec<AdapterEvent>) -> Self {
        self.on_scan = events;
        self
    }

    /// Events emitted when `connect` is called.
    #[must_use]
    pub fn on_connect(mut self, events: Vec<AdapterEvent>) -> Self {
        self.on_connect = events;
        self
    }

    /// Events emitted when `discover_service` is called.
    #[must_use]
    pub fn on_discover_service(mut self, events: Vec<AdapterEvent>) -> Self {
        self.on_discover_service = events;
        self
    }

    /// Events emitted when `discover_characteristic` is called.
    #[must_use]
    pub fn on_discover_characteristic(mut self, events: Vec<AdapterEvent>) -> Self {
        self.on_discover_characteristic = events;
        self
    }

    /// Events emitted when `write_with_ack` is called.
    #[must_use]
    pub fn on_write(mut self, events: Vec<AdapterEvent>) -> Self {
        self.on_write = events;
        self
    }

    /// Make `scan` fail at request time with this message.
    #[must_use]
    pub fn refuse_scan(mut self, message: impl Into<String>) -> Self {
        self.refuse_scan = Some(message.into());
        self
    }

    /// Close the event channel right after `scan` emits its script.
    ///
    /// Simulates a scan that ends without ever finding a lamp.
    #[must_use]
    pub fn close_after_scan(mut self) -> Self {
        self.close_after_scan = true;
        self
    }

    /// Build the adapter and the receiver its session will consume.
    #[must_use]
    pub fn build(self) -> (MockAdapter, EventReceiver) {
        let (sender, receiver) = event_channel();
        let adapter = MockAdapter {
            events: Some(sender),
            calls: CallLog::default(),
            on_start: self.on_start,
            on_resolve: self.on_resolve,
            on_scan: self.on_scan,
            on_connect: self.on_connect,
            on_discover_service: self.on_discover_service,
            on_discover_characteristic: self.on_discover_characteristic,
            on_write: self.on_write,
            refuse_scan: self.refuse_scan,
            close_after_scan: self.close_after_scan,
        };
        (adapter, receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdvertisedLamp;

    #[tokio::test]
    async fn test_scripted_events_arrive_in_order() {
        let lamp = AdvertisedLamp::new(mock_address(), Some("Avea_mock".to_string()));
        let (mut adapter, mut events) = MockAdapterBuilder::new()
            .on_start(vec![AdapterEvent::Ready])
            .on_scan(vec![AdapterEvent::DeviceSeen(lamp.clone())])
            .build();

        adapter.start().await.unwrap();
        adapter.scan("Avea").await.unwrap();

        assert_eq!(events.try_recv().unwrap(), AdapterEvent::Ready);
        assert_eq!(events.try_recv().unwrap(), AdapterEvent::DeviceSeen(lamp));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_call_log_records_requests_with_arguments() {
        let (mut adapter, _events) = MockAdapterBuilder::new().build();
        let log = adapter.call_log();

        let address = DeviceAddress::from("MOCK-TEST");
        adapter.connect(&address).await.unwrap();
        adapter.write_with_ack(Uuid::nil(), &[0x57, 0x00, 0x00]).await.unwrap();

        assert_eq!(
            log.snapshot(),
            vec![
                AdapterCall::Connect(address),
                AdapterCall::WriteWithAck(Uuid::nil(), vec![0x57, 0x00, 0x00]),
            ]
        );
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_refused_scan_still_records_the_request() {
        let (mut adapter, _events) = MockAdapterBuilder::new()
            .refuse_scan("no scanning here")
            .build();
        let log = adapter.call_log();

        let err = adapter.scan("Avea").await.unwrap_err();
        assert!(err.to_string().contains("no scanning here"));
        assert_eq!(log.snapshot(), vec![AdapterCall::Scan("Avea".to_string())]);
    }

    #[tokio::test]
    async fn test_close_after_scan_ends_the_event_stream() {
        let (mut adapter, mut events) = MockAdapterBuilder::new().close_after_scan().build();

        adapter.scan("Avea").await.unwrap();

        // Channel reports closed once the only sender is gone
        assert!(events.recv().await.is_none());
    }

    #[test]
    fn test_mock_addresses_look_like_mock_addresses() {
        let address = mock_address();
        assert!(address.as_str().starts_with("MOCK-"));
        assert_eq!(address.as_str().len(), "MOCK-".len() + 6);
    }
}
