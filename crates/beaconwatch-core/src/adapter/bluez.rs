//! BlueZ-backed radio adapter (Linux).
//!
//! Wraps a `bluer` session and forwards BlueZ discovery events into the
//! engine's advertisement channel. BlueZ surfaces repeat sightings of a
//! known device as property changes, so discovery runs in the
//! with-changes mode and every event is re-snapshotted from the device's
//! current properties.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::{
    AdapterError, AdapterState, RadioAdapter, RawAdvertisement, ADVERTISEMENT_CHANNEL_CAPACITY,
};

/// How often the powered property is polled while a state observer waits.
const STATE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// [`RadioAdapter`] over a BlueZ adapter via D-Bus.
pub struct BluerAdapter {
    adapter: bluer::Adapter,
    scanning: AtomicBool,
    subscriber: Arc<Mutex<Option<mpsc::Sender<RawAdvertisement>>>>,
    pump: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl BluerAdapter {
    /// Opens the system-default Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NotFound`] when no adapter is present and
    /// [`AdapterError::Backend`] when the BlueZ session cannot be opened.
    pub async fn new() -> Result<Self, AdapterError> {
        let session = bluer::Session::new()
            .await
            .map_err(|e| AdapterError::Backend(e.to_string()))?;
        let adapter = session
            .default_adapter()
            .await
            .map_err(|_| AdapterError::NotFound)?;
        debug!(adapter = %adapter.name(), "opened default Bluetooth adapter");
        Ok(Self::from_adapter(adapter))
    }

    /// Opens a named adapter (e.g. `hci0`).
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NotFound`] when the named adapter does not
    /// exist and [`AdapterError::Backend`] when the session cannot be
    /// opened.
    pub async fn with_name(name: &str) -> Result<Self, AdapterError> {
        let session = bluer::Session::new()
            .await
            .map_err(|e| AdapterError::Backend(e.to_string()))?;
        let adapter = session
            .adapter(name)
            .map_err(|_| AdapterError::NotFound)?;
        Ok(Self::from_adapter(adapter))
    }

    fn from_adapter(adapter: bluer::Adapter) -> Self {
        Self {
            adapter,
            scanning: AtomicBool::new(false),
            subscriber: Arc::new(Mutex::new(None)),
            pump: tokio::sync::Mutex::new(None),
        }
    }

    async fn powered_state(&self) -> AdapterState {
        match self.adapter.is_powered().await {
            Ok(true) => AdapterState::PoweredOn,
            Ok(false) => AdapterState::PoweredOff,
            Err(e) => {
                warn!(error = %e, "failed to read adapter power state");
                AdapterState::Unknown
            }
        }
    }
}

/// Reads the device's current advertisement-relevant properties.
async fn snapshot(device: &bluer::Device, address: bluer::Address) -> RawAdvertisement {
    RawAdvertisement {
        address: address.to_string(),
        local_name: device.name().await.ok().flatten(),
        rssi: device.rssi().await.ok().flatten(),
        tx_power: device.tx_power().await.ok().flatten(),
        manufacturer_data: device
            .manufacturer_data()
            .await
            .ok()
            .flatten()
            .unwrap_or_default(),
        service_data: device.service_data().await.ok().flatten().unwrap_or_default(),
    }
}

#[async_trait]
impl RadioAdapter for BluerAdapter {
    async fn state(&self) -> AdapterState {
        self.powered_state().await
    }

    async fn next_state_change(&self) -> AdapterState {
        // BlueZ exposes the power state as a D-Bus property; poll until it
        // leaves the state observed at call time.
        let initial = self.powered_state().await;
        loop {
            tokio::time::sleep(STATE_POLL_INTERVAL).await;
            let current = self.powered_state().await;
            if current != initial {
                return current;
            }
        }
    }

    async fn start_scanning(&self) -> Result<(), AdapterError> {
        let mut events = self
            .adapter
            .discover_devices_with_changes()
            .await
            .map_err(|e| AdapterError::ScanStart(e.to_string()))?;

        let adapter = self.adapter.clone();
        let subscriber = Arc::clone(&self.subscriber);
        let handle = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let bluer::AdapterEvent::DeviceAdded(address) = event else {
                    continue;
                };
                let Ok(device) = adapter.device(address) else {
                    continue;
                };
                let advertisement = snapshot(&device, address).await;
                let sender = subscriber
                    .lock()
                    .expect("subscriber lock poisoned")
                    .clone();
                if let Some(tx) = sender {
                    if tx.send(advertisement).await.is_err() {
                        trace!(%address, "subscriber gone, dropping advertisement");
                    }
                }
            }
            debug!("BlueZ discovery stream ended");
        });

        *self.pump.lock().await = Some(handle);
        self.scanning.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_scanning(&self) {
        // Aborting the pump drops the discovery stream, which releases the
        // BlueZ discovery session.
        if let Some(handle) = self.pump.lock().await.take() {
            handle.abort();
        }
        self.scanning.store(false, Ordering::SeqCst);
    }

    async fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    async fn subscribe(&self) -> mpsc::Receiver<RawAdvertisement> {
        let (tx, rx) = mpsc::channel(ADVERTISEMENT_CHANNEL_CAPACITY);
        *self.subscriber.lock().expect("subscriber lock poisoned") = Some(tx);
        rx
    }
}
