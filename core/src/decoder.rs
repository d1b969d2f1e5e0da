//! Stateful multi-frame decoder.
//!
//! Collects checksum-verified frames for one sequence, keyed by frame index,
//! and recovers the message through the column-wise erasure code once at
//! least the data-frame count has arrived. Frames may arrive in any order;
//! duplicates are idempotent; a frame from a different sequence silently
//! abandons the packet in progress.

use std::collections::HashMap;

use log::{debug, info};

use crate::encoder::data_frames_for_total;
use crate::error::{AuroraLinkError, Result};
use crate::framing::Frame;
use crate::rs;
use crate::FRAME_DATA_SIZE;

/// Receiver progress snapshot, for host-side progress display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeProgress {
    /// Distinct frames collected so far.
    pub collected: usize,
    /// Frames needed before decoding can succeed (= data frames).
    pub required: usize,
    /// Total frames in the packet, zero before any frame arrived.
    pub total_frames: usize,
    pub can_decode: bool,
    /// Frame indices not yet seen.
    pub missing: Vec<u8>,
}

enum DecoderState {
    Uninitialized,
    Active {
        sequence_id: u16,
        total_frames: u8,
        data_frames: u8,
        frames: HashMap<u8, Frame>,
    },
}

pub struct MultiFrameDecoder {
    state: DecoderState,
}

impl MultiFrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Uninitialized,
        }
    }

    /// Insert one frame. Returns whether it was accepted: frames with a bad
    /// checksum, an out-of-range index, a total inconsistent with the packet
    /// in progress, or a total no sender sizing could produce are all
    /// dropped. A frame from a different sequence id abandons the current
    /// packet and starts over.
    pub fn add_frame(&mut self, frame: Frame) -> bool {
        if !frame.verify_checksum() {
            debug!("dropping frame {}: checksum mismatch", frame.frame_index);
            return false;
        }

        match &mut self.state {
            DecoderState::Active {
                sequence_id,
                total_frames,
                frames,
                ..
            } if *sequence_id == frame.sequence_id => {
                if frame.total_frames != *total_frames {
                    debug!(
                        "dropping frame {}: total {} disagrees with packet total {}",
                        frame.frame_index, frame.total_frames, total_frames
                    );
                    return false;
                }
                if frame.frame_index >= *total_frames {
                    debug!("dropping frame {}: index out of range", frame.frame_index);
                    return false;
                }
                frames.insert(frame.frame_index, frame);
                true
            }
            _ => self.adopt(frame),
        }
    }

    /// Start a new packet around `frame`, discarding any packet in progress.
    fn adopt(&mut self, frame: Frame) -> bool {
        let Some(data_frames) = data_frames_for_total(frame.total_frames) else {
            debug!(
                "dropping frame {}: no sizing yields {} total frames",
                frame.frame_index, frame.total_frames
            );
            return false;
        };
        if frame.frame_index >= frame.total_frames {
            debug!("dropping frame {}: index out of range", frame.frame_index);
            return false;
        }

        if let DecoderState::Active { sequence_id, .. } = self.state {
            info!(
                "abandoning sequence {:04x} for {:04x}",
                sequence_id, frame.sequence_id
            );
        } else {
            info!(
                "adopting sequence {:04x}, {} frames",
                frame.sequence_id, frame.total_frames
            );
        }

        let mut frames = HashMap::new();
        let (sequence_id, total_frames) = (frame.sequence_id, frame.total_frames);
        frames.insert(frame.frame_index, frame);
        self.state = DecoderState::Active {
            sequence_id,
            total_frames,
            data_frames,
            frames,
        };
        true
    }

    /// Forget everything, including the learned sequence id.
    pub fn reset(&mut self) {
        self.state = DecoderState::Uninitialized;
    }

    pub fn progress(&self) -> DecodeProgress {
        match &self.state {
            DecoderState::Uninitialized => DecodeProgress {
                collected: 0,
                required: 0,
                total_frames: 0,
                can_decode: false,
                missing: Vec::new(),
            },
            DecoderState::Active {
                total_frames,
                data_frames,
                frames,
                ..
            } => {
                let collected = frames.len();
                let required = *data_frames as usize;
                let missing = (0..*total_frames)
                    .filter(|index| !frames.contains_key(index))
                    .collect();
                DecodeProgress {
                    collected,
                    required,
                    total_frames: *total_frames as usize,
                    can_decode: collected >= required,
                    missing,
                }
            }
        }
    }

    pub fn can_decode(&self) -> bool {
        self.progress().can_decode
    }

    /// Recover the message from the collected frames: erasure-decode each
    /// byte column across frames, reassemble the data rows, trim the zero
    /// padding, and decode strictly as UTF-8.
    pub fn decode(&self) -> Result<String> {
        let DecoderState::Active {
            total_frames,
            data_frames,
            frames,
            ..
        } = &self.state
        else {
            return Err(AuroraLinkError::NoSequence);
        };

        let total = *total_frames as usize;
        let required = *data_frames as usize;
        if frames.len() < required {
            let missing = (0..*total_frames)
                .filter(|index| !frames.contains_key(index))
                .collect();
            return Err(AuroraLinkError::InsufficientFrames {
                collected: frames.len(),
                required,
                missing,
            });
        }

        let mut payload = vec![0u8; required * FRAME_DATA_SIZE];
        for col in 0..FRAME_DATA_SIZE {
            let column: Vec<Option<u8>> = (0..total as u8)
                .map(|row| frames.get(&row).map(|frame| frame.data_chunk[col]))
                .collect();
            let decoded = rs::decode_erasures(&column, required)
                .ok_or(AuroraLinkError::FecDecodeFailure { column: col })?;
            for (row, &byte) in decoded.iter().enumerate() {
                payload[row * FRAME_DATA_SIZE + col] = byte;
            }
        }

        // Zero padding from the encoder side; the message itself never
        // contains NUL.
        if let Some(end) = payload.iter().position(|&b| b == 0) {
            payload.truncate(end);
        }
        String::from_utf8(payload).map_err(|_| AuroraLinkError::InvalidUtf8)
    }
}

impl Default for MultiFrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
