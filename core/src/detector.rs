//! Band detector: maps a camera raster back to a candidate frame.
//!
//! The strip is located by scoring aurora-hued pixels per row and column,
//! the horizontal span is cut into 32 band slices, each slice is reduced to
//! one color by averaging its brightest pixels, and the colors are matched
//! against the palette. A CRC-verified frame falls out at the end; every
//! failure on the way is soft and keeps its diagnostics.

use log::debug;

use crate::bands::band_indices_to_frame_bytes;
use crate::framing::Frame;
use crate::palette::{color_confidence, find_closest_palette_index, Rgb};
use crate::NUM_BANDS;

/// Tuning knobs for the strip search and band sampling. The defaults carry
/// the values the renderer was calibrated against; hosts with unusual
/// cameras or lighting can override per knob.
#[derive(Clone, Debug)]
pub struct DetectorConfig {
    /// Minimum row-score peak, as a fraction of raster width, for an aurora
    /// region to count as present at all.
    pub row_presence_floor: f32,
    /// Rows scoring above this fraction of the peak bound the vertical span.
    pub row_span_fraction: f32,
    /// Columns scoring above this fraction of the peak bound the horizontal
    /// span.
    pub col_span_fraction: f32,
    /// Reject regions shorter than this fraction of the raster height.
    pub min_height_fraction: f32,
    /// Reject regions narrower than this fraction of the raster width.
    pub min_width_fraction: f32,
    /// Pixels with r+g+b at or below this are skipped when sampling bands.
    pub brightness_floor: u32,
    /// Fraction of the brightest pixels averaged into a band color.
    pub top_brightness_fraction: f32,
    /// Mean band confidence below this yields `LowConfidence` instead of a
    /// frame.
    pub confidence_floor: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            row_presence_floor: 0.1,
            row_span_fraction: 0.3,
            col_span_fraction: 0.2,
            min_height_fraction: 0.05,
            min_width_fraction: 0.3,
            brightness_floor: 30,
            top_brightness_fraction: 0.25,
            confidence_floor: 0.15,
        }
    }
}

/// Pixel bounds of the located strip, inclusive.
#[derive(Clone, Copy, Debug)]
struct StripRegion {
    top: usize,
    bottom: usize,
    left: usize,
    right: usize,
}

/// Outcome of scanning one raster.
#[derive(Clone, Debug)]
pub enum Detection {
    /// No aurora-like region in the raster.
    NoRegion,
    /// A region was found but the palette match is too poor to trust; the
    /// raw symbols are kept for diagnostics.
    LowConfidence {
        band_indices: [u8; NUM_BANDS],
        confidence: f32,
    },
    /// The symbols assembled into a frame whose checksum does not verify.
    ChecksumMismatch { frame: Frame, confidence: f32 },
    /// A checksum-verified frame.
    Frame { frame: Frame, confidence: f32 },
}

impl Detection {
    /// The verified frame, if this raster produced one.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Detection::Frame { frame, .. } => Some(frame),
            _ => None,
        }
    }

    pub fn confidence(&self) -> f32 {
        match self {
            Detection::NoRegion => 0.0,
            Detection::LowConfidence { confidence, .. }
            | Detection::ChecksumMismatch { confidence, .. }
            | Detection::Frame { confidence, .. } => *confidence,
        }
    }
}

pub struct Detector {
    config: DetectorConfig,
}

impl Detector {
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DetectorConfig {
        &mut self.config
    }

    /// Scan one RGBA raster for a displayed frame.
    ///
    /// `rgba` must hold `width * height` four-byte pixels; the alpha channel
    /// is ignored.
    pub fn detect(&self, rgba: &[u8], width: usize, height: usize) -> Detection {
        assert!(
            rgba.len() >= width * height * 4,
            "raster shorter than width * height * 4"
        );

        let Some(region) = self.find_strip_region(rgba, width, height) else {
            return Detection::NoRegion;
        };

        let colors = self.band_colors(rgba, width, &region);
        let mut band_indices = [0u8; NUM_BANDS];
        let mut confidence_sum = 0.0f32;
        for (band, &color) in colors.iter().enumerate() {
            band_indices[band] = find_closest_palette_index(color);
            confidence_sum += color_confidence(color);
        }
        let confidence = confidence_sum / NUM_BANDS as f32;

        if confidence < self.config.confidence_floor {
            debug!("band confidence {confidence:.3} below floor, discarding");
            return Detection::LowConfidence {
                band_indices,
                confidence,
            };
        }

        let frame = Frame::from_bytes(&band_indices_to_frame_bytes(&band_indices));
        if !frame.verify_checksum() {
            debug!(
                "frame {} of sequence {:04x} failed its checksum",
                frame.frame_index, frame.sequence_id
            );
            return Detection::ChecksumMismatch { frame, confidence };
        }

        Detection::Frame { frame, confidence }
    }

    /// Score aurora-hued pixels per row and column and cut the spans at the
    /// configured fractions of each peak.
    fn find_strip_region(&self, rgba: &[u8], width: usize, height: usize) -> Option<StripRegion> {
        let mut row_scores = vec![0u32; height];
        let mut col_scores = vec![0u32; width];

        for y in 0..height {
            for x in 0..width {
                let i = (y * width + x) * 4;
                let (r, g, b) = (rgba[i] as f32, rgba[i + 1] as f32, rgba[i + 2] as f32);
                if is_aurora_pixel(r, g, b) {
                    row_scores[y] += 1;
                    col_scores[x] += 1;
                }
            }
        }

        let row_peak = *row_scores.iter().max()? as f32;
        if row_peak < self.config.row_presence_floor * width as f32 {
            debug!("row peak {row_peak} too weak for a strip");
            return None;
        }

        let row_cut = self.config.row_span_fraction * row_peak;
        let top = row_scores.iter().position(|&s| s as f32 > row_cut)?;
        let bottom = row_scores.iter().rposition(|&s| s as f32 > row_cut)?;

        let col_peak = *col_scores.iter().max()? as f32;
        let col_cut = self.config.col_span_fraction * col_peak;
        let left = col_scores.iter().position(|&s| s as f32 > col_cut)?;
        let right = col_scores.iter().rposition(|&s| s as f32 > col_cut)?;

        let span_height = (bottom - top + 1) as f32;
        let span_width = (right - left + 1) as f32;
        if span_height < self.config.min_height_fraction * height as f32
            || span_width < self.config.min_width_fraction * width as f32
        {
            debug!("region {span_width}x{span_height} too small, rejecting");
            return None;
        }

        Some(StripRegion {
            top,
            bottom,
            left,
            right,
        })
    }

    /// Reduce each of the 32 equal-width slices of the span to one color:
    /// average of its brightest quartile of lit pixels. An empty slice stays
    /// black and will drag the confidence down.
    fn band_colors(&self, rgba: &[u8], width: usize, region: &StripRegion) -> [Rgb; NUM_BANDS] {
        let span_width = region.right - region.left + 1;
        let mut colors = [[0u8; 3]; NUM_BANDS];

        for (band, color) in colors.iter_mut().enumerate() {
            let x0 = region.left + band * span_width / NUM_BANDS;
            let x1 = region.left + (band + 1) * span_width / NUM_BANDS;

            let mut pixels: Vec<Rgb> = Vec::new();
            for y in region.top..=region.bottom {
                for x in x0..x1 {
                    let i = (y * width + x) * 4;
                    let pixel = [rgba[i], rgba[i + 1], rgba[i + 2]];
                    if brightness(pixel) > self.config.brightness_floor {
                        pixels.push(pixel);
                    }
                }
            }
            if pixels.is_empty() {
                continue;
            }

            pixels.sort_by(|a, b| brightness(*b).cmp(&brightness(*a)));
            let take = ((pixels.len() as f32 * self.config.top_brightness_fraction).ceil()
                as usize)
                .clamp(1, pixels.len());

            let mut sum = [0u32; 3];
            for pixel in &pixels[..take] {
                sum[0] += pixel[0] as u32;
                sum[1] += pixel[1] as u32;
                sum[2] += pixel[2] as u32;
            }
            *color = [
                (sum[0] / take as u32) as u8,
                (sum[1] / take as u32) as u8,
                (sum[2] / take as u32) as u8,
            ];
        }
        colors
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn brightness(pixel: Rgb) -> u32 {
    pixel[0] as u32 + pixel[1] as u32 + pixel[2] as u32
}

/// Aurora hue predicate: green, cyan or purple dominance, and bright enough
/// overall to stand out from the backdrop.
fn is_aurora_pixel(r: f32, g: f32, b: f32) -> bool {
    let green = g > 1.1 * r && g > 30.0;
    let cyan = g > 0.9 * r && b > 0.6 * r && g + b > 80.0;
    let purple = b > 0.6 * r && r > 0.4 * g && r + b > 80.0;
    (green || cyan || purple) && (r + g + b) / 3.0 > 30.0
}
