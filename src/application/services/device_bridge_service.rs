//! Device Bridge Service - Connection lifecycle of the local toy server
//!
//! A battery-poll loop runs while connected. Its cancellation token is replaced
//! on every successful (re)connect and cancelled on disconnect, so at most one
//! loop is alive at a time.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::application::ports::outbound::{DeviceBattery, DeviceClientPort, DeviceError};
use crate::application::services::SettingsService;
use crate::domain::value_objects::ToyInstruction;

pub struct DeviceBridgeService {
    client: Arc<dyn DeviceClientPort>,
    settings: Arc<SettingsService>,
    battery_token: Mutex<CancellationToken>,
    batteries: Arc<RwLock<Vec<DeviceBattery>>>,
}

impl DeviceBridgeService {
    pub fn new(client: Arc<dyn DeviceClientPort>, settings: Arc<SettingsService>) -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self {
            client,
            settings,
            battery_token: Mutex::new(token),
            batteries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Connect and (re)start the battery-poll loop
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<(), DeviceError> {
        self.client.connect().await?;
        info!("Connected to device server");

        let token = self.reset_battery_token();
        let interval = self.settings.get().await.battery_poll_interval();
        tokio::spawn(battery_poll_loop(
            self.client.clone(),
            self.batteries.clone(),
            interval,
            token,
        ));
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<(), DeviceError> {
        self.battery_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
        self.batteries.write().await.clear();
        self.client.disconnect().await?;
        info!("Disconnected from device server");
        Ok(())
    }

    pub fn has_session(&self) -> bool {
        self.client.is_connected()
    }

    pub fn is_polling(&self) -> bool {
        !self
            .battery_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_cancelled()
    }

    pub async fn battery_levels(&self) -> Vec<DeviceBattery> {
        self.batteries.read().await.clone()
    }

    /// Hand an instruction to the device server; returns false without a session
    pub fn enqueue(&self, instruction: ToyInstruction) -> bool {
        if !self.has_session() {
            debug!("No device session, dropping toy instruction");
            return false;
        }
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = client.send_instruction(&instruction).await {
                warn!(error = %e, "Toy instruction failed");
            }
        });
        true
    }

    fn reset_battery_token(&self) -> CancellationToken {
        let mut current = self
            .battery_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
        current.clone()
    }
}

async fn battery_poll_loop(
    client: Arc<dyn DeviceClientPort>,
    batteries: Arc<RwLock<Vec<DeviceBattery>>>,
    interval: Duration,
    token: CancellationToken,
) {
    debug!(interval_secs = interval.as_secs(), "Starting battery poll loop");
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            levels = client.battery_levels() => match levels {
                Ok(levels) => *batteries.write().await = levels,
                Err(e) => warn!(error = %e, "Battery poll failed"),
            },
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    debug!("Battery poll loop stopped");
}
