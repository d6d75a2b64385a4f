use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::{DEFAULT_TIMEOUT, DEVICE_PORT, SENSOR_SELECTOR};
use crate::devices::DeviceCharacteristics;
use crate::error::BLError;
use crate::mac::MacAddress;
use crate::message::{Command, Request};
use crate::session::{Session, SessionState};
use crate::transport::{Connector, Transport, UdpConnector};

/// Connection settings for a [`Device`].
#[derive(Clone)]
pub struct DeviceConfig {
    /// UDP port of the device (80 on real hardware)
    pub port: u16,
    /// Read deadline for each exchange
    pub timeout: Duration,
    /// Socket factory, one socket per exchange
    pub connector: Arc<dyn Connector>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: DEVICE_PORT,
            timeout: DEFAULT_TIMEOUT,
            connector: Arc::new(UdpConnector),
        }
    }
}

impl DeviceConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Arc::new(connector);
        self
    }
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Temperature (°C) and relative humidity (%) from the onboard sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    pub temperature: f64,
    pub humidity: f64,
}

impl SensorReading {
    /// Parse two fixed-point values: integer part then hundredths.
    pub fn from_payload(payload: &[u8]) -> Result<Self, BLError> {
        match payload {
            [t_int, t_frac, h_int, h_frac, ..] => Ok(Self {
                temperature: f64::from(*t_int) + f64::from(*t_frac) / 100.0,
                humidity: f64::from(*h_int) + f64::from(*h_frac) / 100.0,
            }),
            _ => Err(BLError::MalformedResponse {
                expected: 4,
                actual: payload.len(),
            }),
        }
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} °C, {:.2} %RH", self.temperature, self.humidity)
    }
}

/// An authenticated session with one Broadlink RM device.
///
/// All operations take `&mut self`: the session counter and key change on
/// every exchange. To share a device between tasks, put it behind a
/// `tokio::sync::Mutex` and hold the lock for the whole call.
pub struct Device {
    session: Session,
    transport: Transport,
}

impl Device {
    /// Connect to a device on port 80 and authenticate.
    pub async fn new(ip: IpAddr, mac: MacAddress, device_type: u16) -> Result<Self, BLError> {
        Self::with_config(ip, mac, device_type, DeviceConfig::default()).await
    }

    /// Connect with explicit settings and authenticate.
    ///
    /// Fails with [`BLError::UnsupportedDeviceType`] for unknown device types,
    /// or with the authentication error; a device without a session key is
    /// never returned.
    pub async fn with_config(
        ip: IpAddr,
        mac: MacAddress,
        device_type: u16,
        config: DeviceConfig,
    ) -> Result<Self, BLError> {
        let characteristics = DeviceCharacteristics::lookup(device_type);
        if !characteristics.supported {
            return Err(BLError::UnsupportedDeviceType(device_type));
        }

        let remote = SocketAddr::new(ip, config.port);
        info!(
            %remote,
            %mac,
            model = characteristics.model,
            device_type = %format!("{device_type:#06x}"),
            "Connecting to device"
        );

        let mut device = Self {
            session: Session::new(mac, characteristics),
            transport: Transport::new(remote, config.timeout, config.connector),
        };
        device.authenticate().await?;

        Ok(device)
    }

    async fn authenticate(&mut self) -> Result<(), BLError> {
        info!("--- Starting Authentication ---");
        let response = self
            .transport
            .exchange(&mut self.session, &Request::authenticate())
            .await?;

        if self.session.state() != SessionState::Ready {
            return Err(BLError::UnexpectedReply(response.command.into()));
        }

        info!("--- Authentication Complete ---");
        Ok(())
    }

    /// Replay a captured IR/RF code. The reply carries no data.
    pub async fn send_data(&mut self, code: &[u8]) -> Result<(), BLError> {
        let header = self.session.characteristics().code_sending_header;
        let request = Request::send_code(header, code);

        let response = self.transport.exchange(&mut self.session, &request).await?;
        debug!(code_len = code.len(), reply = ?response.command, "Code sent");
        Ok(())
    }

    /// Read the onboard temperature and humidity sensor.
    pub async fn check_sensors(&mut self) -> Result<SensorReading, BLError> {
        let header = self.session.characteristics().request_header;
        let request = Request::query(header, SENSOR_SELECTOR);

        let response = self.transport.exchange(&mut self.session, &request).await?;
        if response.command != Command::ControlReply {
            debug!(reply = ?response.command, "Unexpected reply type to sensor query");
        }

        let reading = SensorReading::from_payload(&response.payload)?;
        debug!(temperature = reading.temperature, humidity = reading.humidity, "Sensor reading");
        Ok(reading)
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.transport.remote()
    }

    /// Read deadline applied to every exchange
    pub fn timeout(&self) -> Duration {
        self.transport.timeout()
    }

    pub fn mac(&self) -> MacAddress {
        self.session.mac()
    }

    pub fn device_type(&self) -> u16 {
        self.session.characteristics().device_type
    }

    pub fn model(&self) -> &'static str {
        self.session.characteristics().model
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
