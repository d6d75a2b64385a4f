// Protocol constants for Broadlink RM devices

use std::time::Duration;

/// Size of the frame header preceding the encrypted payload (56 bytes)
pub const HEADER_SIZE: usize = 0x38;

/// Replies shorter than this are rejected before any other inspection
pub const MIN_RESPONSE_SIZE: usize = 0x30;

/// AES block size; every payload must be a multiple of it
pub const AES_BLOCK_SIZE: usize = 16;

/// Frame magic at offset 0x00
pub const FRAME_MAGIC: [u8; 8] = [0x5a, 0xa5, 0xaa, 0x55, 0x5a, 0xa5, 0xaa, 0x55];

/// Constant bytes at offset 0x24
pub const FRAME_SIGNATURE: [u8; 2] = [0x2a, 0x27];

/// Offset of the whole-packet checksum (LE16)
pub const PACKET_CHECKSUM_OFFSET: usize = 0x20;

/// Offset of the device-reported error code (LE16)
pub const ERROR_CODE_OFFSET: usize = 0x22;

/// Offset of the command byte
pub const COMMAND_OFFSET: usize = 0x26;

/// Offset of the request counter (LE16)
pub const COUNT_OFFSET: usize = 0x28;

/// Offset of the reversed hardware address
pub const MAC_OFFSET: usize = 0x2a;

/// Offset of the device id
pub const DEVICE_ID_OFFSET: usize = 0x30;

/// Offset of the plaintext payload checksum (LE16)
pub const PAYLOAD_CHECKSUM_OFFSET: usize = 0x34;

/// Initial value of both additive checksums
pub const CHECKSUM_SEED: u16 = 0xbeaf;

/// AES key used until the first successful authentication
pub const DEFAULT_KEY: [u8; 16] = [
    0x09, 0x76, 0x28, 0x34, 0x3f, 0xe9, 0x9e, 0x23, 0x76, 0x5c, 0x15, 0x13, 0xac, 0xcf, 0x8b, 0x02,
];

/// AES IV, fixed for the lifetime of a session
pub const DEFAULT_IV: [u8; 16] = [
    0x56, 0x2e, 0x17, 0x99, 0x6d, 0x09, 0x3d, 0x28, 0xdd, 0xb3, 0xba, 0x69, 0x5a, 0x2e, 0x6f, 0x58,
];

/// Device id used until the first successful authentication
pub const DEFAULT_DEVICE_ID: [u8; 4] = [0x00; 4];

/// UDP port the device listens on
pub const DEVICE_PORT: u16 = 80;

/// Default read deadline for a single exchange
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum number of send attempts per exchange
pub const SEND_RETRIES: u8 = 3;

/// Receive buffer for a single reply datagram
pub const RECV_BUFFER_SIZE: usize = 2048;

/// Size of the authentication payload
pub const AUTH_PAYLOAD_SIZE: usize = 0x50;

/// Decrypted authentication reply: bytes 0x00..0x04 are the device id,
/// 0x04..0x14 the new key
pub const AUTH_ID_END: usize = 0x04;
pub const AUTH_KEY_END: usize = 0x14;

/// Control prefix the device echoes after the family-specific header
pub const CONTROL_PREFIX_SIZE: usize = 4;

/// Sub-header for "send code, no repeat count override"
pub const SEND_CODE_SUBHEADER: [u8; 4] = [0x02, 0x00, 0x00, 0x00];

/// Control selector for the temperature/humidity query
pub const SENSOR_SELECTOR: u8 = 0x24;
