pub mod constants;
pub mod crypto;
pub mod device;
pub mod devices;
pub mod error;
pub mod mac;
pub mod message;
pub mod packet;
pub mod session;
pub mod transport;

// Re-export the main types for easy access
pub use device::{Device, DeviceConfig, SensorReading};
pub use devices::DeviceCharacteristics;
pub use error::BLError;
pub use mac::MacAddress;
