//! btleplug-backed lamp adapter.
//!
//! [`BleCentral`] is the production [`LampAdapter`]. Each request talks to
//! the system Bluetooth stack through btleplug and reports its outcome on
//! the shared event channel. The only long-running piece is the
//! advertisement pump, a spawned task that forwards matching advertisements
//! until the scan is stopped.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central as _, CentralEvent, CentralState, Characteristic, Manager as _, Peripheral as _,
    PeripheralProperties, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

use avea_types::DeviceAddress;

use crate::adapter::{
    AdapterEvent, AdvertisedLamp, EventReceiver, EventSender, LampAdapter, event_channel,
};
use crate::error::{Error, Result};

/// How often the adapter state is polled while waiting for power-on.
const POWER_ON_POLL: Duration = Duration::from_millis(200);

/// How long a powered-off adapter is given to come up before bring-up fails.
const POWER_ON_GRACE: Duration = Duration::from_secs(3);

/// Address reported by backends that hide the hardware address (macOS).
const ZERO_ADDRESS: &str = "00:00:00:00:00:00";

/// Lamp adapter backed by the first system Bluetooth adapter.
///
/// Create one with [`BleCentral::create`], hand it to a
/// [`Session`](crate::Session) and drive it through the [`LampAdapter`]
/// requests. The central keeps the connected peripheral and its discovered
/// characteristics internally, so a write only needs the characteristic UUID.
pub struct BleCentral {
    events: EventSender,
    adapter: Option<Adapter>,
    selected: Option<Peripheral>,
    characteristics: HashMap<Uuid, Characteristic>,
    scan_pump: Option<JoinHandle<()>>,
}

impl BleCentral {
    /// Create the adapter and the receiving half of its event channel.
    #[must_use]
    pub fn create() -> (Self, EventReceiver) {
        let (events, receiver) = event_channel();
        let central = Self {
            events,
            adapter: None,
            selected: None,
            characteristics: HashMap::new(),
            scan_pump: None,
        };
        (central, receiver)
    }

    fn adapter_handle(&self) -> Result<Adapter> {
        self.adapter
            .clone()
            .ok_or_else(|| Error::adapter("Bluetooth stack has not been started"))
    }

    fn selected(&self) -> Result<&Peripheral> {
        self.selected
            .as_ref()
            .ok_or_else(|| Error::adapter("no lamp connection is active"))
    }

    fn emit(&self, event: AdapterEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl LampAdapter for BleCentral {
    async fn start(&mut self) -> Result<()> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| Error::adapter("no Bluetooth adapter available"))?;

        await_powered_on(&adapter).await?;
        info!("Bluetooth adapter ready");
        self.adapter = Some(adapter);
        self.emit(AdapterEvent::Ready);
        Ok(())
    }

    async fn resolve(&mut self, known: &[DeviceAddress]) -> Result<()> {
        let adapter = self.adapter_handle()?;
        let mut found = Vec::new();
        for peripheral in adapter.peripherals().await? {
            let Some(properties) = peripheral.properties().await? else {
                continue;
            };
            for address in known {
                if matches_address(&peripheral.id(), &properties, address) {
                    found.push(AdvertisedLamp::new(
                        address.as_str(),
                        properties.local_name.clone(),
                    ));
                    break;
                }
            }
        }
        debug!(count = found.len(), "checked stored addresses against known peripherals");
        self.emit(AdapterEvent::Resolved(found));
        Ok(())
    }

    async fn scan(&mut self, name_fragment: &str) -> Result<()> {
        let adapter = self.adapter_handle()?;

        // Take the event stream before scanning starts so no advertisement
        // slips between the two calls.
        let mut stream = adapter.events().await?;
        adapter.start_scan(ScanFilter::default()).await?;
        info!(filter = name_fragment, "scanning for advertising lamps");

        let events = self.events.clone();
        let fragment = name_fragment.to_string();
        let pump = tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                let id = match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                    _ => continue,
                };
                match advertised_lamp(&adapter, &id, &fragment).await {
                    Ok(Some(lamp)) => {
                        if events.send(AdapterEvent::DeviceSeen(lamp)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(error) => {
                        debug!(%error, "could not inspect advertising peripheral");
                    }
                }
            }
            debug!("advertisement pump ended");
        });
        self.scan_pump = Some(pump);
        Ok(())
    }

    async fn stop_scan(&mut self) -> Result<()> {
        if let Some(pump) = self.scan_pump.take() {
            pump.abort();
        }
        let adapter = self.adapter_handle()?;
        if let Err(error) = adapter.stop_scan().await {
            // The command flow carries on either way; the radio stops
            // advertising scans on disconnect at the latest.
            warn!(%error, "failed to stop BLE scan");
        }
        Ok(())
    }

    async fn connect(&mut self, address: &DeviceAddress) -> Result<()> {
        let adapter = self.adapter_handle()?;
        let peripheral = find_peripheral(&adapter, address).await?.ok_or_else(|| {
            Error::adapter(format!("peripheral {address} is no longer visible"))
        })?;

        peripheral.connect().await?;
        info!(%address, "connected");
        self.selected = Some(peripheral);
        self.emit(AdapterEvent::Connected);
        Ok(())
    }

    async fn discover_service(&mut self, service: Uuid) -> Result<()> {
        let peripheral = self.selected()?;
        peripheral.discover_services().await?;

        let mut found = Vec::new();
        let services = peripheral.services();
        for entry in &services {
            found.push(entry.uuid);
        }
        debug!(wanted = %service, count = found.len(), "service discovery finished");
        self.emit(AdapterEvent::ServicesFound(found));
        Ok(())
    }

    async fn discover_characteristic(&mut self, service: Uuid, characteristic: Uuid) -> Result<()> {
        let services = self.selected()?.services();

        let mut found = Vec::new();
        for entry in &services {
            if entry.uuid != service {
                continue;
            }
            for ch in &entry.characteristics {
                found.push(ch.uuid);
                self.characteristics.insert(ch.uuid, ch.clone());
            }
        }
        debug!(
            wanted = %characteristic,
            count = found.len(),
            "characteristic discovery finished"
        );
        self.emit(AdapterEvent::CharacteristicsFound(found));
        Ok(())
    }

    async fn write_with_ack(&mut self, characteristic: Uuid, payload: &[u8]) -> Result<()> {
        let target = self
            .characteristics
            .get(&characteristic)
            .ok_or_else(|| Error::missing_characteristic(characteristic))?;
        let peripheral = self.selected()?;

        debug!(uuid = %characteristic, len = payload.len(), "writing command");
        peripheral
            .write(target, payload, WriteType::WithResponse)
            .await
            .map_err(|error| Error::write_failed(characteristic, error.to_string()))?;
        self.emit(AdapterEvent::WriteAcknowledged);
        Ok(())
    }
}

impl Drop for BleCentral {
    fn drop(&mut self) {
        if let Some(pump) = self.scan_pump.take() {
            pump.abort();
        }
    }
}

/// Wait until the adapter reports it is powered on.
///
/// Backends that cannot report their state at all are given the benefit of
/// the doubt; the next request will surface any real problem.
async fn await_powered_on(adapter: &Adapter) -> Result<()> {
    let deadline = Instant::now() + POWER_ON_GRACE;
    loop {
        match adapter.adapter_state().await {
            Ok(CentralState::PoweredOn) => return Ok(()),
            Ok(state) => {
                if Instant::now() >= deadline {
                    return Err(Error::adapter(format!(
                        "Bluetooth is not powered on (state {state:?})"
                    )));
                }
                debug!(?state, "waiting for the adapter to power on");
            }
            Err(error) => {
                debug!(%error, "adapter state unavailable");
                return Ok(());
            }
        }
        sleep(POWER_ON_POLL).await;
    }
}

/// Look up an advertising peripheral and keep it only if the name matches.
async fn advertised_lamp(
    adapter: &Adapter,
    id: &PeripheralId,
    name_fragment: &str,
) -> Result<Option<AdvertisedLamp>> {
    let peripheral = adapter.peripheral(id).await?;
    let Some(properties) = peripheral.properties().await? else {
        return Ok(None);
    };
    let Some(name) = properties.local_name.clone() else {
        return Ok(None);
    };
    if !name.contains(name_fragment) {
        return Ok(None);
    }
    let address = identifier_for(id, &properties);
    Ok(Some(AdvertisedLamp::new(address, Some(name))))
}

/// Search the adapter's known peripherals for one matching the address.
async fn find_peripheral(
    adapter: &Adapter,
    address: &DeviceAddress,
) -> Result<Option<Peripheral>> {
    for peripheral in adapter.peripherals().await? {
        if let Ok(Some(properties)) = peripheral.properties().await
            && matches_address(&peripheral.id(), &properties, address)
        {
            return Ok(Some(peripheral));
        }
    }
    Ok(None)
}

/// Check whether a peripheral answers to the given stored address.
fn matches_address(
    id: &PeripheralId,
    properties: &PeripheralProperties,
    wanted: &DeviceAddress,
) -> bool {
    if peripheral_identifier(id).eq_ignore_ascii_case(wanted.as_str()) {
        return true;
    }
    let hardware = properties.address.to_string();
    hardware != ZERO_ADDRESS && hardware.eq_ignore_ascii_case(wanted.as_str())
}

/// The address a peripheral is stored and reported under.
///
/// macOS hides the hardware address behind zeros, so the peripheral ID is
/// used there. Other platforms report the real MAC address.
fn identifier_for(id: &PeripheralId, properties: &PeripheralProperties) -> String {
    let hardware = properties.address.to_string();
    if hardware == ZERO_ADDRESS {
        peripheral_identifier(id)
    } else {
        hardware
    }
}

/// Extract the identifier string from a peripheral ID.
fn peripheral_identifier(id: &PeripheralId) -> String {
    trim_wrapper(&format!("{id:?}")).to_string()
}

fn trim_wrapper(repr: &str) -> &str {
    repr.trim_start_matches("PeripheralId(")
        .trim_end_matches(')')
}

#[cfg(test)]
mod tests {
    use super::*;

    // PeripheralId cannot be constructed directly, so the tests cover the
    // string-level helpers the ID handling is built from.

    #[test]
    fn test_trim_wrapper_strips_debug_noise() {
        assert_eq!(
            trim_wrapper("PeripheralId(hci0/dev_E0_13_95_41_A2_C2)"),
            "hci0/dev_E0_13_95_41_A2_C2"
        );
    }

    #[test]
    fn test_trim_wrapper_leaves_plain_identifiers_alone() {
        assert_eq!(
            trim_wrapper("8B284F8C-DF31-4A4B-94F0-5E6A54FF8D27"),
            "8B284F8C-DF31-4A4B-94F0-5E6A54FF8D27"
        );
    }

    #[test]
    fn test_zero_address_matches_default_hardware_address() {
        assert_eq!(btleplug::api::BDAddr::default().to_string(), ZERO_ADDRESS);
    }
}
