//! Codec core for the auroralink one-way visual data channel
//!
//! Short text messages are framed, forward-error-corrected with a column-wise
//! GF(2^8) Reed-Solomon erasure code, and displayed as 32 colored bands per
//! frame. On the receive side a detector maps camera rasters back to band
//! symbols and a stateful decoder rebuilds the message once enough frames
//! have been seen. Rendering and camera capture live in the host; this crate
//! is purely computational.

pub mod bands;
pub mod decoder;
pub mod detector;
pub mod encoder;
pub mod error;
pub mod framing;
pub mod gf256;
pub mod palette;
pub mod rs;

pub use decoder::{DecodeProgress, MultiFrameDecoder};
pub use detector::{Detection, Detector, DetectorConfig};
pub use encoder::{Packet, PacketEncoder};
pub use error::{AuroraLinkError, Result};
pub use framing::Frame;

// Channel configuration
pub const NUM_BANDS: usize = 32;
pub const PALETTE_SIZE: usize = 16;

// Frame configuration
pub const FRAME_SIZE: usize = 16; // NUM_BANDS / 2, one byte per band pair
pub const FRAME_DATA_SIZE: usize = 10;

// FEC configuration
pub const MIN_PARITY_FRAMES: usize = 4;
pub const MAX_TOTAL_FRAMES: usize = 255; // 8-bit frame header
pub const MAX_MESSAGE_BYTES: usize = 2040; // 204 data + 51 parity = 255 frames
