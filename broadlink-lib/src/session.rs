use strum_macros::Display;
use tracing::info;

use crate::constants::{CONTROL_PREFIX_SIZE, DEFAULT_DEVICE_ID, DEFAULT_IV, DEFAULT_KEY};
use crate::devices::DeviceCharacteristics;
use crate::mac::MacAddress;

/// Authentication state of a session. `Ready` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    #[strum(to_string = "unauthenticated")]
    Unauthenticated,
    #[strum(to_string = "ready")]
    Ready,
}

/// Mutable per-device cryptographic material.
///
/// Key and device id start at the protocol defaults and are replaced only
/// by [`crate::packet::decrypt_response`] when it sees an authentication
/// reply. The IV never changes.
#[derive(Debug, Clone)]
pub struct Session {
    mac: MacAddress,
    characteristics: DeviceCharacteristics,
    count: u16,
    key: [u8; 16],
    iv: [u8; 16],
    id: [u8; 4],
    state: SessionState,
}

impl Session {
    /// New unauthenticated session with a random starting counter
    pub fn new(mac: MacAddress, characteristics: DeviceCharacteristics) -> Self {
        Self::with_count(mac, characteristics, rand::random())
    }

    pub fn with_count(mac: MacAddress, characteristics: DeviceCharacteristics, count: u16) -> Self {
        Self {
            mac,
            characteristics,
            count,
            key: DEFAULT_KEY,
            iv: DEFAULT_IV,
            id: DEFAULT_DEVICE_ID,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    pub fn characteristics(&self) -> &DeviceCharacteristics {
        &self.characteristics
    }

    /// Counter value carried by the most recent request
    pub fn count(&self) -> u16 {
        self.count
    }

    pub fn key(&self) -> &[u8; 16] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; 16] {
        &self.iv
    }

    pub fn device_id(&self) -> &[u8; 4] {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Where the caller-visible payload starts in a decrypted reply: the
    /// echoed family header plus the 4-byte control prefix.
    pub fn response_offset(&self) -> usize {
        self.characteristics.request_header.len() + CONTROL_PREFIX_SIZE
    }

    /// Advance the request counter, wrapping at 16 bits
    pub(crate) fn next_count(&mut self) -> u16 {
        self.count = self.count.wrapping_add(1);
        self.count
    }

    /// Install the device id and key from an authentication reply
    pub(crate) fn rotate(&mut self, id: [u8; 4], key: [u8; 16]) {
        self.id = id;
        self.key = key;
        self.state = SessionState::Ready;
        info!(device_id = hex::encode(id), mac = %self.mac, "Session key rotated");
    }
}
