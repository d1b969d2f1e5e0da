use auroralink_core::bands::frame_to_band_indices;
use auroralink_core::{Detection, Detector, MultiFrameDecoder, Packet, PacketEncoder, NUM_BANDS};
use wasm_bindgen::prelude::*;

// ============================================================================
// ENCODER
// ============================================================================

/// Packet encoder exposed to JavaScript; the renderer pulls per-frame band
/// index vectors out of the returned packet.
#[wasm_bindgen]
pub struct WasmEncoder {
    inner: PacketEncoder,
}

#[wasm_bindgen]
impl WasmEncoder {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmEncoder {
        WasmEncoder {
            inner: PacketEncoder::new(),
        }
    }

    /// Encode a text message into a packet of frames.
    #[wasm_bindgen]
    pub fn encode(&self, message: &str) -> Result<WasmPacket, JsValue> {
        self.inner
            .encode(message)
            .map(|packet| WasmPacket { inner: packet })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Default for WasmEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// One encoded packet held for the renderer.
#[wasm_bindgen]
pub struct WasmPacket {
    inner: Packet,
}

#[wasm_bindgen]
impl WasmPacket {
    #[wasm_bindgen(getter)]
    pub fn sequence_id(&self) -> u16 {
        self.inner.sequence_id
    }

    #[wasm_bindgen(getter)]
    pub fn total_frames(&self) -> usize {
        self.inner.total_frames()
    }

    #[wasm_bindgen(getter)]
    pub fn data_frames(&self) -> usize {
        self.inner.data_frames
    }

    /// The 32 palette indices to render for frame `index`.
    #[wasm_bindgen]
    pub fn band_indices(&self, index: usize) -> Result<Vec<u8>, JsValue> {
        self.inner
            .frames
            .get(index)
            .map(|frame| frame_to_band_indices(frame).to_vec())
            .ok_or_else(|| JsValue::from_str("frame index out of range"))
    }
}

// ============================================================================
// RECEIVER
// ============================================================================

/// Camera-side receiver: a detector feeding a multi-frame decoder.
#[wasm_bindgen]
pub struct WasmReceiver {
    detector: Detector,
    decoder: MultiFrameDecoder,
}

#[wasm_bindgen]
impl WasmReceiver {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmReceiver {
        WasmReceiver {
            detector: Detector::new(),
            decoder: MultiFrameDecoder::new(),
        }
    }

    /// Scan one RGBA raster; a verified frame is fed into the decoder.
    /// Returns the detection confidence (0 when no region was found).
    #[wasm_bindgen]
    pub fn push_raster(&mut self, rgba: &[u8], width: usize, height: usize) -> f32 {
        let detection = self.detector.detect(rgba, width, height);
        if let Detection::Frame { frame, confidence } = detection {
            self.decoder.add_frame(frame);
            confidence
        } else {
            detection.confidence()
        }
    }

    #[wasm_bindgen]
    pub fn collected(&self) -> usize {
        self.decoder.progress().collected
    }

    #[wasm_bindgen]
    pub fn required(&self) -> usize {
        self.decoder.progress().required
    }

    #[wasm_bindgen]
    pub fn can_decode(&self) -> bool {
        self.decoder.can_decode()
    }

    /// Recover the message from the frames collected so far.
    #[wasm_bindgen]
    pub fn try_decode(&self) -> Result<String, JsValue> {
        self.decoder
            .decode()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Drop all collected frames and the learned sequence id.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    /// Lower or raise the mean-confidence floor below which a raster is
    /// discarded.
    #[wasm_bindgen]
    pub fn set_confidence_floor(&mut self, value: f32) {
        self.detector.config_mut().confidence_floor = value.clamp(0.0, 1.0);
    }

    #[wasm_bindgen]
    pub fn get_confidence_floor(&self) -> f32 {
        self.detector.config().confidence_floor
    }

    /// Minimum fraction of the raster width the strip must cover.
    #[wasm_bindgen]
    pub fn set_min_width_fraction(&mut self, value: f32) {
        self.detector.config_mut().min_width_fraction = value.clamp(0.0, 1.0);
    }

    #[wasm_bindgen]
    pub fn get_min_width_fraction(&self) -> f32 {
        self.detector.config().min_width_fraction
    }
}

impl Default for WasmReceiver {
    fn default() -> Self {
        Self::new()
    }
}

/// Band count, for hosts sizing their render targets.
#[wasm_bindgen]
pub fn num_bands() -> usize {
    NUM_BANDS
}

#[wasm_bindgen(start)]
pub fn init() {
    // Optional panic hook setup
}
