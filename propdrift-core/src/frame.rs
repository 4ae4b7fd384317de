//! Frame data structures shared by the sampler and the property extractor

use crate::{Error, Result};
use image::{DynamicImage, GrayImage, RgbImage};
use std::path::Path;
use std::sync::Arc;

/// A decoded 8-bit raster frame
#[derive(Debug, Clone)]
pub enum Frame {
    /// Three channels, stored as RGB
    Color(RgbImage),
    /// A single intensity channel
    Gray(GrayImage),
}

impl Frame {
    /// Loads a frame from an image file, always as three color channels.
    ///
    /// Single-channel files are expanded to RGB, so every readable image
    /// yields a full property vector.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = image::open(path)?;
        Ok(Frame::Color(image.to_rgb8()))
    }

    /// Width of the frame in pixels
    pub fn width(&self) -> u32 {
        match self {
            Frame::Color(img) => img.width(),
            Frame::Gray(img) => img.width(),
        }
    }

    /// Height of the frame in pixels
    pub fn height(&self) -> u32 {
        match self {
            Frame::Color(img) => img.height(),
            Frame::Gray(img) => img.height(),
        }
    }

    /// Number of pixels in the frame
    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Returns true when the frame carries color channels
    pub fn is_color(&self) -> bool {
        matches!(self, Frame::Color(_))
    }

    /// Returns the raw interleaved samples of the frame
    pub fn samples(&self) -> &[u8] {
        match self {
            Frame::Color(img) => img.as_raw(),
            Frame::Gray(img) => img.as_raw(),
        }
    }

    /// Returns the color image, or `UnsupportedColorLayout` for grayscale frames
    pub fn color(&self) -> Result<&RgbImage> {
        match self {
            Frame::Color(img) => Ok(img),
            Frame::Gray(_) => Err(Error::UnsupportedColorLayout),
        }
    }

    /// Fails with `InvalidFrame` when the frame holds no pixels
    pub fn ensure_valid(&self) -> Result<()> {
        if self.width() == 0 || self.height() == 0 {
            return Err(Error::InvalidFrame(format!(
                "empty frame ({}x{})",
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }
}

impl From<DynamicImage> for Frame {
    fn from(image: DynamicImage) -> Self {
        if image.color().has_color() {
            Frame::Color(image.to_rgb8())
        } else {
            Frame::Gray(image.to_luma8())
        }
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Frame::Color(image)
    }
}

impl From<GrayImage> for Frame {
    fn from(image: GrayImage) -> Self {
        Frame::Gray(image)
    }
}

/// A frame selected by the sampler, with its position in the source video
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// The decoded and resized frame
    pub frame: Frame,
    /// Zero-based decode index within the source video
    pub index: u64,
    /// Identity of the source video
    pub source: Arc<str>,
}

impl SampledFrame {
    /// Creates a new sampled frame
    pub fn new(frame: Frame, index: u64, source: Arc<str>) -> Self {
        Self {
            frame,
            index,
            source,
        }
    }
}
