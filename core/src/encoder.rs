use rand::Rng;

use crate::error::{AuroraLinkError, Result};
use crate::framing::Frame;
use crate::rs;
use crate::{FRAME_DATA_SIZE, MAX_MESSAGE_BYTES, MAX_TOTAL_FRAMES, MIN_PARITY_FRAMES};

/// Number of data frames needed for a payload of `len` bytes.
pub fn data_frame_count(len: usize) -> usize {
    (len + FRAME_DATA_SIZE - 1) / FRAME_DATA_SIZE
}

/// Parity frames for `data_frames` data frames: 25% overhead, floor of 4.
pub fn parity_frame_count(data_frames: usize) -> usize {
    MIN_PARITY_FRAMES.max((data_frames + 3) / 4)
}

/// Invert the sizing rule: the data-frame count whose packet totals exactly
/// `total` frames, if any. The rule is strictly increasing in the data-frame
/// count, so a solution is unique; some totals (e.g. below 5) are not
/// producible at all.
pub fn data_frames_for_total(total: u8) -> Option<u8> {
    let total = total as usize;
    (1..=total)
        .find(|&d| d + parity_frame_count(d) == total)
        .map(|d| d as u8)
}

/// One encoded message: `data_frames` data rows followed by `parity_frames`
/// parity rows, all sharing a sequence id.
#[derive(Clone, Debug)]
pub struct Packet {
    pub sequence_id: u16,
    pub data_frames: usize,
    pub parity_frames: usize,
    /// Unpadded payload length in bytes.
    pub payload_len: usize,
    pub frames: Vec<Frame>,
}

impl Packet {
    pub fn total_frames(&self) -> usize {
        self.data_frames + self.parity_frames
    }
}

pub struct PacketEncoder;

impl PacketEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode a text message into a full packet of frames with a freshly
    /// drawn sequence id.
    pub fn encode(&self, message: &str) -> Result<Packet> {
        self.encode_with_sequence_id(message, rand::thread_rng().gen())
    }

    /// Deterministic variant for tests and replay.
    pub fn encode_with_sequence_id(&self, message: &str, sequence_id: u16) -> Result<Packet> {
        let raw = message.as_bytes();
        if raw.is_empty() {
            return Err(AuroraLinkError::EmptyMessage);
        }
        if raw.len() > MAX_MESSAGE_BYTES {
            return Err(AuroraLinkError::MessageTooLong {
                len: raw.len(),
                max: MAX_MESSAGE_BYTES,
            });
        }

        let data_frames = data_frame_count(raw.len());
        let parity_frames = parity_frame_count(data_frames);
        let total = data_frames + parity_frames;
        debug_assert!(total <= MAX_TOTAL_FRAMES);

        // Zero-pad the payload into a data_frames x 10 row-major matrix.
        let mut padded = vec![0u8; data_frames * FRAME_DATA_SIZE];
        padded[..raw.len()].copy_from_slice(raw);

        // Reed-Solomon runs down each byte column, across frames, so losing
        // a frame costs one erasure per column rather than a burst.
        let mut chunks = vec![[0u8; FRAME_DATA_SIZE]; total];
        for col in 0..FRAME_DATA_SIZE {
            let column: Vec<u8> = (0..data_frames)
                .map(|row| padded[row * FRAME_DATA_SIZE + col])
                .collect();
            let encoded = rs::encode(&column, parity_frames);
            for (row, &byte) in encoded.iter().enumerate() {
                chunks[row][col] = byte;
            }
        }

        let frames = chunks
            .into_iter()
            .enumerate()
            .map(|(row, chunk)| Frame::new(row as u8, total as u8, sequence_id, chunk))
            .collect();

        Ok(Packet {
            sequence_id,
            data_frames,
            parity_frames,
            payload_len: raw.len(),
            frames,
        })
    }
}

impl Default for PacketEncoder {
    fn default() -> Self {
        Self::new()
    }
}
