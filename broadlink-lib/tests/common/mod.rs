//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#![allow(dead_code)]

#[allow(unused_imports)]
pub use broadlink_lib::constants::*;
#[allow(unused_imports)]
pub use broadlink_lib::message::{Command, Request};
#[allow(unused_imports)]
pub use broadlink_lib::session::{Session, SessionState};
#[allow(unused_imports)]
pub use broadlink_lib::transport::{Connector, Link, Transport};
#[allow(unused_imports)]
pub use broadlink_lib::packet::FrameHeader;
#[allow(unused_imports)]
pub use broadlink_lib::{
    BLError, Device, DeviceCharacteristics, DeviceConfig, MacAddress, crypto, packet,
};

use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const RM4_PRO: u16 = 0x649b;
pub const TEST_MAC: MacAddress = MacAddress::new([0xec, 0x0b, 0xae, 0x23, 0xf2, 0x78]);
pub const TEST_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 10, 78));

/// Device id and key handed out by the simulated device on authentication
pub const SESSION_ID: [u8; 4] = [0x4d, 0x3c, 0x2b, 0x1a];
pub const SESSION_KEY: [u8; 16] = [
    0xf0, 0xe1, 0xd2, 0xc3, 0xb4, 0xa5, 0x96, 0x87, 0x78, 0x69, 0x5a, 0x4b, 0x3c, 0x2d, 0x1e, 0x0f,
];

/// Error code the simulated device reports for a frame with a bad checksum
pub const BAD_CHECKSUM_ERROR: u16 = 0xfffb;

/// Captured light toggle code (truncated) from an RM4 pro
pub const LIGHT_TOGGLE: &str = concat!(
    "b1c07c02ce9e06000c0d0d0d0d0d0e0d0d0d0d0d0d0d0d0d0d0e0d0d",
    "0d0d0daa1b0d0d1a1a0d1a0e1a0d0d1b0c1b",
);

/// A simulated RM4 device plus a record of what it was sent.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub id: [u8; 4],
    pub key: [u8; 16],
    pub header_len: usize,
    pub sensor: [u8; 4],
    /// Non-zero: answer every frame with this error code and no payload
    pub error_code: u16,
    /// Command byte of the answer to an authentication request
    pub auth_reply: u8,
    /// Number of upcoming sends that fail at the socket level
    pub fail_sends: usize,
    /// Never answer
    pub silent: bool,
    /// Reads on the socket fail after the request is sent
    pub fail_recv: bool,
    /// Cut replies to this many bytes
    pub truncate_to: Option<usize>,

    pub frames: Vec<Vec<u8>>,
    pub send_attempts: usize,
    pub sockets_opened: usize,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self {
            id: SESSION_ID,
            key: SESSION_KEY,
            header_len: 2,
            sensor: [21, 50, 45, 10],
            error_code: 0,
            auth_reply: 0xe9,
            fail_sends: 0,
            silent: false,
            fail_recv: false,
            truncate_to: None,
            frames: Vec::new(),
            send_attempts: 0,
            sockets_opened: 0,
        }
    }
}

impl FakeDevice {
    pub fn shared() -> SharedDevice {
        Arc::new(Mutex::new(Self::default()))
    }

    /// The reply a device would send for `frame`
    pub fn reply(&self, frame: &[u8]) -> Vec<u8> {
        let mut reply = self.build_reply(frame);
        if let Some(len) = self.truncate_to {
            reply.truncate(len);
        }
        reply
    }

    fn build_reply(&self, frame: &[u8]) -> Vec<u8> {
        if self.error_code != 0 {
            return reply_frame(0xee, self.error_code, &[]);
        }
        if !request_checksums_ok(frame) {
            return reply_frame(0xee, BAD_CHECKSUM_ERROR, &[]);
        }

        match frame[COMMAND_OFFSET] {
            0x65 => {
                let mut plaintext = vec![0u8; 32];
                plaintext[..4].copy_from_slice(&self.id);
                plaintext[4..20].copy_from_slice(&self.key);
                let ciphertext = crypto::encrypt(&DEFAULT_KEY, &DEFAULT_IV, &plaintext).unwrap();
                reply_frame(self.auth_reply, 0, &ciphertext)
            }
            _ => {
                let mut plaintext = vec![0u8; 16];
                let data = self.header_len + CONTROL_PREFIX_SIZE;
                plaintext[data..data + 4].copy_from_slice(&self.sensor);
                let ciphertext = crypto::encrypt(&self.key, &DEFAULT_IV, &plaintext).unwrap();
                reply_frame(0xee, 0, &ciphertext)
            }
        }
    }
}

pub type SharedDevice = Arc<Mutex<FakeDevice>>;

/// Build a reply frame by hand from header offsets
pub fn reply_frame(command: u8, error_code: u16, ciphertext: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8; HEADER_SIZE];
    frame[..8].copy_from_slice(&FRAME_MAGIC);
    frame[ERROR_CODE_OFFSET..ERROR_CODE_OFFSET + 2].copy_from_slice(&error_code.to_le_bytes());
    frame[0x24..0x26].copy_from_slice(&FRAME_SIGNATURE);
    frame[COMMAND_OFFSET] = command;
    frame.extend_from_slice(ciphertext);
    let sum = packet::checksum(&frame);
    frame[PACKET_CHECKSUM_OFFSET..PACKET_CHECKSUM_OFFSET + 2].copy_from_slice(&sum.to_le_bytes());
    frame
}

fn read_le16(frame: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([frame[offset], frame[offset + 1]])
}

/// Verify the whole-packet checksum of a request frame
pub fn request_checksums_ok(frame: &[u8]) -> bool {
    let stored = read_le16(frame, PACKET_CHECKSUM_OFFSET);
    let mut zeroed = frame.to_vec();
    zeroed[PACKET_CHECKSUM_OFFSET] = 0;
    zeroed[PACKET_CHECKSUM_OFFSET + 1] = 0;
    stored == packet::checksum(&zeroed)
}

/// Decrypt the payload of a captured request frame and check its checksum
pub fn open_frame(frame: &[u8], key: &[u8; 16]) -> Vec<u8> {
    let plaintext = crypto::decrypt(key, &DEFAULT_IV, &frame[HEADER_SIZE..]).unwrap();
    assert_eq!(read_le16(frame, PAYLOAD_CHECKSUM_OFFSET), packet::checksum(&plaintext));
    plaintext
}

pub fn frame_count(frame: &[u8]) -> u16 {
    FrameHeader::read(frame).unwrap().0.count()
}

pub struct MockConnector {
    pub device: SharedDevice,
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, _remote: SocketAddr) -> io::Result<Box<dyn Link>> {
        self.device.lock().unwrap().sockets_opened += 1;
        Ok(Box::new(MockLink {
            device: self.device.clone(),
            pending: None,
        }))
    }
}

pub struct MockLink {
    device: SharedDevice,
    pending: Option<Vec<u8>>,
}

#[async_trait]
impl Link for MockLink {
    async fn send_to(&mut self, frame: &[u8], _dest: SocketAddr) -> io::Result<usize> {
        let mut device = self.device.lock().unwrap();
        device.send_attempts += 1;
        if device.fail_sends > 0 {
            device.fail_sends -= 1;
            return Err(io::Error::other("simulated send failure"));
        }

        device.frames.push(frame.to_vec());
        if !device.silent {
            self.pending = Some(device.reply(frame));
        }
        Ok(frame.len())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let fail_recv = self.device.lock().unwrap().fail_recv;
        if fail_recv {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "simulated read failure"));
        }

        match self.pending.take() {
            Some(reply) => {
                buf[..reply.len()].copy_from_slice(&reply);
                Ok(reply.len())
            }
            None => std::future::pending().await,
        }
    }
}

pub fn mock_config(device: &SharedDevice) -> DeviceConfig {
    DeviceConfig::default()
        .with_timeout(Duration::from_millis(100))
        .with_connector(MockConnector {
            device: device.clone(),
        })
}

/// Construct an authenticated RM4 pro against the simulated device
pub async fn connect(device: &SharedDevice) -> Result<Device, BLError> {
    Device::with_config(TEST_IP, TEST_MAC, RM4_PRO, mock_config(device)).await
}
