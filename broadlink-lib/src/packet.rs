//! Frame codec.
//!
//! A frame is a 56-byte header followed by the AES-128-CBC encrypted payload:
//!
//! | Offset    | Field                                              |
//! |-----------|----------------------------------------------------|
//! | 0x00–0x07 | magic `5a a5 aa 55 5a a5 aa 55`                    |
//! | 0x20–0x21 | whole-packet checksum (LE16)                       |
//! | 0x22–0x23 | device error code (LE16), replies only             |
//! | 0x24–0x25 | constant `2a 27`                                   |
//! | 0x26      | command code                                       |
//! | 0x28–0x29 | request counter (LE16)                             |
//! | 0x2a–0x2f | hardware address, reversed                         |
//! | 0x30–0x33 | device id                                          |
//! | 0x34–0x35 | plaintext payload checksum (LE16)                  |
//! | 0x38+     | ciphertext                                         |

use bytes::{Bytes, BytesMut};
use num_enum::FromPrimitive;
use zerocopy::byteorder::little_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::constants::{
    AES_BLOCK_SIZE, AUTH_ID_END, AUTH_KEY_END, CHECKSUM_SEED, FRAME_MAGIC, FRAME_SIGNATURE,
    HEADER_SIZE, PACKET_CHECKSUM_OFFSET,
};
use crate::crypto;
use crate::error::BLError;
use crate::message::{Command, Request, Response};
use crate::session::Session;

#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct FrameHeader {
    pub magic: [u8; 8],
    pub reserved0: [u8; 24],
    pub checksum: U16,
    pub error_code: U16,
    pub signature: [u8; 2],
    pub command: u8,
    pub reserved1: u8,
    pub count: U16,
    pub mac: [u8; 6],
    pub device_id: [u8; 4],
    pub payload_checksum: U16,
    pub reserved2: [u8; 2],
}

const _: () = assert!(size_of::<FrameHeader>() == HEADER_SIZE);

impl FrameHeader {
    /// Split `raw` into its header and the bytes that follow it
    pub fn read(raw: &[u8]) -> Result<(Self, &[u8]), BLError> {
        Self::read_from_prefix(raw).map_err(|_| BLError::ShortResponse {
            expected: HEADER_SIZE,
            actual: raw.len(),
        })
    }

    pub fn command(&self) -> Command {
        Command::from_primitive(self.command)
    }

    pub fn error_code(&self) -> u16 {
        self.error_code.get()
    }

    pub fn count(&self) -> u16 {
        self.count.get()
    }
}

/// Additive 16-bit checksum: `(0xbeaf + sum(bytes)) mod 0x10000`
pub fn checksum(data: &[u8]) -> u16 {
    data.iter().fold(CHECKSUM_SEED, |acc, &b| acc.wrapping_add(u16::from(b)))
}

/// Build the encrypted frame for `request`, advancing the session counter.
///
/// Fails with [`BLError::InvalidPayloadLength`] before touching the session
/// if the payload is not a whole number of blocks.
pub fn encrypt_request(session: &mut Session, request: &Request) -> Result<Bytes, BLError> {
    let payload = request.payload.as_ref();
    if !payload.len().is_multiple_of(AES_BLOCK_SIZE) {
        return Err(BLError::InvalidPayloadLength(payload.len()));
    }

    let count = session.next_count();

    let header = FrameHeader {
        magic: FRAME_MAGIC,
        signature: FRAME_SIGNATURE,
        command: request.command.into(),
        count: U16::new(count),
        mac: session.mac().reversed(),
        device_id: *session.device_id(),
        payload_checksum: U16::new(checksum(payload)),
        ..Default::default()
    };

    let ciphertext = crypto::encrypt(session.key(), session.iv(), payload)?;

    let mut frame = BytesMut::with_capacity(HEADER_SIZE + ciphertext.len());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(&ciphertext);

    // Checksum field is still zero here, so it sums as zero
    let total = checksum(&frame);
    frame[PACKET_CHECKSUM_OFFSET..PACKET_CHECKSUM_OFFSET + 2].copy_from_slice(&total.to_le_bytes());

    Ok(frame.freeze())
}

/// Validate and decrypt a reply frame.
///
/// An authentication reply (`0xe9`) installs the new device id and key in
/// `session` before the payload is returned.
pub fn decrypt_response(session: &mut Session, raw: &[u8]) -> Result<Response, BLError> {
    let (header, ciphertext) = FrameHeader::read(raw)?;

    let error_code = header.error_code();
    if error_code != 0 {
        return Err(BLError::DeviceError(error_code));
    }

    let plaintext = crypto::decrypt(session.key(), session.iv(), ciphertext)?;

    let command = header.command();
    if command == Command::AuthenticateReply {
        if plaintext.len() < AUTH_KEY_END {
            return Err(BLError::MalformedResponse {
                expected: AUTH_KEY_END,
                actual: plaintext.len(),
            });
        }
        let mut id = [0u8; 4];
        let mut key = [0u8; 16];
        id.copy_from_slice(&plaintext[..AUTH_ID_END]);
        key.copy_from_slice(&plaintext[AUTH_ID_END..AUTH_KEY_END]);
        session.rotate(id, key);
    }

    let offset = session.response_offset();
    let mut plaintext = Bytes::from(plaintext);
    let payload = if plaintext.len() >= offset {
        plaintext.split_off(offset)
    } else {
        Bytes::new()
    };

    Ok(Response { command, payload })
}
