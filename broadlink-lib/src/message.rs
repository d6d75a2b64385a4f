use bytes::{BufMut, Bytes, BytesMut};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::constants::{AES_BLOCK_SIZE, AUTH_PAYLOAD_SIZE, SEND_CODE_SUBHEADER};

/// Command byte at offset 0x26 of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum Command {
    /// Host → device: key exchange
    Authenticate = 0x65,
    /// Host → device: code sending and sensor queries, told apart by the payload
    Control = 0x6a,
    /// Device → host: carries the new device id and key
    AuthenticateReply = 0xe9,
    /// Device → host: answer to a control request
    ControlReply = 0xee,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// A logical, not yet encrypted request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub command: Command,
    /// Plaintext payload, a multiple of 16 bytes for the codec to accept it
    pub payload: Bytes,
}

/// A decrypted reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Type tag taken from the command byte the device reported
    pub command: Command,
    /// Decrypted payload after the echoed family header and control prefix
    pub payload: Bytes,
}

impl Request {
    pub fn new(command: Command, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            payload: payload.into(),
        }
    }

    /// Key exchange request.
    ///
    /// The firmware only checks that the identity block is present, so the
    /// content is a fixed placeholder identity.
    pub fn authenticate() -> Self {
        let mut payload = [0u8; AUTH_PAYLOAD_SIZE];
        payload[0x04..0x13].fill(0x31);
        payload[0x1e] = 0x01;
        payload[0x2d] = 0x01;
        payload[0x30..0x37].copy_from_slice(b"Test  1");

        Self::new(Command::Authenticate, Bytes::copy_from_slice(&payload))
    }

    /// Replay a captured IR/RF code.
    ///
    /// Layout: `code_sending_header ++ 02 00 00 00 ++ code`, zero padded to a
    /// block boundary.
    pub fn send_code(code_sending_header: &[u8], code: &[u8]) -> Self {
        let len = code_sending_header.len() + SEND_CODE_SUBHEADER.len() + code.len();

        let mut payload = BytesMut::with_capacity(padded_len(len));
        payload.put_slice(code_sending_header);
        payload.put_slice(&SEND_CODE_SUBHEADER);
        payload.put_slice(code);
        payload.resize(padded_len(len), 0);

        Self::new(Command::Control, payload.freeze())
    }

    /// Single-block control query: `request_header ++ selector`, zero padded.
    pub fn query(request_header: &[u8], selector: u8) -> Self {
        let len = request_header.len() + 1;

        let mut payload = BytesMut::with_capacity(padded_len(len));
        payload.put_slice(request_header);
        payload.put_u8(selector);
        payload.resize(padded_len(len), 0);

        Self::new(Command::Control, payload.freeze())
    }
}

/// Round `len` up to the next AES block boundary
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(AES_BLOCK_SIZE) * AES_BLOCK_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SENSOR_SELECTOR;

    #[test]
    fn test_command_codes() {
        assert_eq!(u8::from(Command::Authenticate), 0x65);
        assert_eq!(u8::from(Command::Control), 0x6a);
        assert_eq!(Command::from_primitive(0xe9), Command::AuthenticateReply);
        assert_eq!(Command::from_primitive(0xee), Command::ControlReply);
        assert_eq!(Command::from_primitive(0x42), Command::Unknown(0x42));
    }

    #[test]
    fn test_authenticate_payload_layout() {
        let request = Request::authenticate();
        let p = request.payload.as_ref();

        assert_eq!(request.command, Command::Authenticate);
        assert_eq!(p.len(), 0x50);
        assert_eq!(&p[0x00..0x04], &[0u8; 4]);
        assert!(p[0x04..=0x12].iter().all(|&b| b == 0x31));
        assert_eq!(p[0x13], 0x00);
        assert_eq!(p[0x1e], 0x01);
        assert_eq!(p[0x2d], 0x01);
        assert_eq!(&p[0x30..0x37], b"Test  1");
        assert!(p[0x37..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_send_code_layout_rm4() {
        let code = hex::decode("b1c07c02ce9e0600").unwrap();
        let request = Request::send_code(&[0xd0, 0x00], &code);
        let p = request.payload.as_ref();

        assert_eq!(request.command, Command::Control);
        assert_eq!(p.len(), 16);
        assert_eq!(&p[..2], &[0xd0, 0x00]);
        assert_eq!(&p[2..6], &[0x02, 0x00, 0x00, 0x00]);
        assert_eq!(&p[6..14], code.as_slice());
        assert_eq!(&p[14..], &[0, 0]);
    }

    #[test]
    fn test_send_code_exact_block_is_not_padded_further() {
        // 4-byte sub-header + 12-byte code = exactly one block
        let request = Request::send_code(&[], &[0xaa; 12]);
        assert_eq!(request.payload.len(), 16);
    }

    #[test]
    fn test_send_code_spills_into_next_block() {
        let request = Request::send_code(&[0xd0, 0x00], &[0xaa; 11]);
        assert_eq!(request.payload.len(), 32);
        assert!(request.payload[17..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sensor_query_layout() {
        let request = Request::query(&[0x04, 0x00], SENSOR_SELECTOR);
        assert_eq!(request.command, Command::Control);
        assert_eq!(
            request.payload.as_ref(),
            &[0x04, 0x00, 0x24, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_padded_len() {
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(1), 16);
        assert_eq!(padded_len(16), 16);
        assert_eq!(padded_len(17), 32);
    }
}
