//! WebSocket frame codec.
//!
//! Covers the subset the server needs: single-frame text messages with
//! 7-bit or 16-bit payload lengths inbound, any length outbound. Inbound
//! frames with a 64-bit length are rejected. Outbound frames are never
//! masked.

use crate::error::FrameError;

const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;
const OPCODE_MASK: u8 = 0x0F;
const LENGTH_MASK: u8 = 0x7F;

const LENGTH_16: u8 = 126;
const LENGTH_64: u8 = 127;

/// Frame opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
    Reserved(u8),
}

impl From<u8> for OpCode {
    fn from(v: u8) -> Self {
        match v & OPCODE_MASK {
            0x0 => OpCode::Continuation,
            0x1 => OpCode::Text,
            0x2 => OpCode::Binary,
            0x8 => OpCode::Close,
            0x9 => OpCode::Ping,
            0xA => OpCode::Pong,
            other => OpCode::Reserved(other),
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        match op {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
            OpCode::Reserved(v) => v & OPCODE_MASK,
        }
    }
}

/// One decoded frame. The payload is already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: OpCode,
    pub mask_key: Option<[u8; 4]>,
    pub payload: Vec<u8>,
}

/// What a frame means to the read loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A complete text payload, not yet checked for UTF-8.
    Text(Vec<u8>),
    /// The peer is closing the connection.
    Close,
    /// Control or data frame the server does not act on.
    Ignored(OpCode),
}

impl Frame {
    /// An unmasked, final text frame.
    pub fn text(text: &str) -> Self {
        Self {
            fin: true,
            opcode: OpCode::Text,
            mask_key: None,
            payload: text.as_bytes().to_vec(),
        }
    }

    /// Mask the payload with `key` when encoded, as a client would.
    pub fn masked(mut self, key: [u8; 4]) -> Self {
        self.mask_key = Some(key);
        self
    }

    pub fn is_masked(&self) -> bool {
        self.mask_key.is_some()
    }

    /// Payload length in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Serialize the frame.
    ///
    /// The header is 2 bytes for payloads under 126 bytes, 4 bytes up to
    /// 65535 bytes and 10 bytes beyond that, plus 4 bytes when masked.
    pub fn encode(&self) -> Vec<u8> {
        let len = self.payload.len();
        let mut out = Vec::with_capacity(header_len(len, self.is_masked()) + len);

        let fin = if self.fin { FIN_BIT } else { 0 };
        out.push(fin | u8::from(self.opcode));

        let mask = if self.is_masked() { MASK_BIT } else { 0 };
        if len < LENGTH_16 as usize {
            out.push(mask | len as u8);
        } else if len <= u16::MAX as usize {
            out.push(mask | LENGTH_16);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            out.push(mask | LENGTH_64);
            out.extend_from_slice(&(len as u64).to_be_bytes());
        }

        match self.mask_key {
            Some(key) => {
                out.extend_from_slice(&key);
                let start = out.len();
                out.extend_from_slice(&self.payload);
                apply_mask(&mut out[start..], key);
            }
            None => out.extend_from_slice(&self.payload),
        }
        out
    }

    /// Classify the frame for the read loop.
    pub fn into_message(self) -> Result<Message, FrameError> {
        match self.opcode {
            OpCode::Text if !self.fin => Err(FrameError::Fragmented),
            OpCode::Text => Ok(Message::Text(self.payload)),
            OpCode::Close => Ok(Message::Close),
            other => Ok(Message::Ignored(other)),
        }
    }
}

/// Encode `text` as a single server-to-client text frame.
pub fn encode_text(text: &str) -> Vec<u8> {
    Frame::text(text).encode()
}

/// Decode one frame from the front of `buf`.
///
/// Returns `Ok(None)` when `buf` does not yet hold a whole frame, otherwise
/// the frame and the number of bytes it occupied.
pub fn decode(buf: &[u8]) -> Result<Option<(Frame, usize)>, FrameError> {
    if buf.len() < 2 {
        return Ok(None);
    }

    let fin = buf[0] & FIN_BIT != 0;
    let opcode = OpCode::from(buf[0]);
    let masked = buf[1] & MASK_BIT != 0;

    let (len, mut offset) = match buf[1] & LENGTH_MASK {
        LENGTH_64 => return Err(FrameError::UnsupportedPayloadLength),
        LENGTH_16 => {
            if buf.len() < 4 {
                return Ok(None);
            }
            (u16::from_be_bytes([buf[2], buf[3]]) as usize, 4)
        }
        short => (short as usize, 2),
    };

    let mask_key = if masked {
        let Some(key) = buf.get(offset..offset + 4) else {
            return Ok(None);
        };
        offset += 4;
        Some([key[0], key[1], key[2], key[3]])
    } else {
        None
    };

    let Some(payload) = buf.get(offset..offset + len) else {
        return Ok(None);
    };
    let mut payload = payload.to_vec();
    if let Some(key) = mask_key {
        apply_mask(&mut payload, key);
    }

    Ok(Some((
        Frame {
            fin,
            opcode,
            mask_key,
            payload,
        },
        offset + len,
    )))
}

/// XOR `data` with the 4-byte masking key. Applying it twice is a no-op.
pub fn apply_mask(data: &mut [u8], key: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i % 4];
    }
}

fn header_len(payload_len: usize, masked: bool) -> usize {
    let base = if payload_len < LENGTH_16 as usize {
        2
    } else if payload_len <= u16::MAX as usize {
        4
    } else {
        10
    };
    if masked { base + 4 } else { base }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
