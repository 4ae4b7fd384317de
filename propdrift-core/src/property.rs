//! Per-frame visual property extraction
//!
//! Every frame is reduced to a fixed vector of eight statistics. The set of
//! properties is the closed [`Property`] enumeration; the distribution builder
//! and the drift detector both iterate [`Property::ALL`], so the two sides can
//! never disagree on which properties exist.

use crate::{Error, Frame, Result};
use image::Rgb;
use std::fmt;
use std::str::FromStr;

/// ITU-R BT.601 luma weights for R, G and B
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// A scalar visual property computed for every sampled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Property {
    AspectRatio,
    Area,
    AverageBrightness,
    LuminanceBrightness,
    RmsContrast,
    MeanRedRelativeIntensity,
    MeanGreenRelativeIntensity,
    MeanBlueRelativeIntensity,
}

impl Property {
    /// Number of properties in a [`PropertyVector`]
    pub const COUNT: usize = 8;

    /// Every property, in report order
    pub const ALL: [Property; Property::COUNT] = [
        Property::AspectRatio,
        Property::Area,
        Property::AverageBrightness,
        Property::LuminanceBrightness,
        Property::RmsContrast,
        Property::MeanRedRelativeIntensity,
        Property::MeanGreenRelativeIntensity,
        Property::MeanBlueRelativeIntensity,
    ];

    /// The snake_case name used in reports
    pub fn name(self) -> &'static str {
        match self {
            Property::AspectRatio => "aspect_ratio",
            Property::Area => "area",
            Property::AverageBrightness => "average_brightness",
            Property::LuminanceBrightness => "luminance_brightness",
            Property::RmsContrast => "rms_contrast",
            Property::MeanRedRelativeIntensity => "mean_red_relative_intensity",
            Property::MeanGreenRelativeIntensity => "mean_green_relative_intensity",
            Property::MeanBlueRelativeIntensity => "mean_blue_relative_intensity",
        }
    }

    /// Computes this property for one frame
    pub fn compute(self, frame: &Frame) -> Result<f64> {
        match self {
            Property::AspectRatio => aspect_ratio(frame),
            Property::Area => area(frame),
            Property::AverageBrightness => average_brightness(frame),
            Property::LuminanceBrightness => luminance_brightness(frame),
            Property::RmsContrast => rms_contrast(frame),
            Property::MeanRedRelativeIntensity => relative_intensity(frame, 0),
            Property::MeanGreenRelativeIntensity => relative_intensity(frame, 1),
            Property::MeanBlueRelativeIntensity => relative_intensity(frame, 2),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Property {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Property::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::UnknownProperty(s.to_string()))
    }
}

/// Width divided by height
pub fn aspect_ratio(frame: &Frame) -> Result<f64> {
    frame.ensure_valid()?;
    Ok(frame.width() as f64 / frame.height() as f64)
}

/// Width times height, in pixels
pub fn area(frame: &Frame) -> Result<f64> {
    frame.ensure_valid()?;
    Ok(frame.pixel_count() as f64)
}

/// Mean of every sample of every channel
pub fn average_brightness(frame: &Frame) -> Result<f64> {
    frame.ensure_valid()?;
    let samples = frame.samples();
    let sum: u64 = samples.iter().map(|&v| v as u64).sum();
    Ok(sum as f64 / samples.len() as f64)
}

/// Mean of the luma (Y) channel
pub fn luminance_brightness(frame: &Frame) -> Result<f64> {
    frame.ensure_valid()?;
    let image = frame.color()?;
    let sum: f64 = image.pixels().map(luma).sum();
    Ok(sum / frame.pixel_count() as f64)
}

/// Root-mean-square deviation of grayscale intensity from its mean
pub fn rms_contrast(frame: &Frame) -> Result<f64> {
    frame.ensure_valid()?;
    let gray: Vec<f64> = match frame {
        Frame::Color(image) => image.pixels().map(luma).collect(),
        Frame::Gray(image) => image.as_raw().iter().map(|&v| v as f64).collect(),
    };

    let n = gray.len() as f64;
    let mean = gray.iter().sum::<f64>() / n;
    let variance = gray.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    Ok(variance.sqrt())
}

/// Mean of `R / (R + G + B)`
pub fn mean_red_relative_intensity(frame: &Frame) -> Result<f64> {
    relative_intensity(frame, 0)
}

/// Mean of `G / (R + G + B)`
pub fn mean_green_relative_intensity(frame: &Frame) -> Result<f64> {
    relative_intensity(frame, 1)
}

/// Mean of `B / (R + G + B)`
pub fn mean_blue_relative_intensity(frame: &Frame) -> Result<f64> {
    relative_intensity(frame, 2)
}

/// Black pixels divide by 1, so they contribute 0 to every channel
fn relative_intensity(frame: &Frame, channel: usize) -> Result<f64> {
    frame.ensure_valid()?;
    let image = frame.color()?;
    let total: f64 = image
        .pixels()
        .map(|p| {
            let sum = p[0] as u32 + p[1] as u32 + p[2] as u32;
            p[channel] as f64 / sum.max(1) as f64
        })
        .sum();
    Ok(total / frame.pixel_count() as f64)
}

fn luma(pixel: &Rgb<u8>) -> f64 {
    LUMA_WEIGHTS[0] * pixel[0] as f64
        + LUMA_WEIGHTS[1] * pixel[1] as f64
        + LUMA_WEIGHTS[2] * pixel[2] as f64
}

/// One value per [`Property`]; no property can be missing or duplicated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyVector {
    values: [f64; Property::COUNT],
}

impl PropertyVector {
    /// Computes all properties for one frame
    pub fn extract(frame: &Frame) -> Result<Self> {
        let mut values = [0.0; Property::COUNT];
        for property in Property::ALL {
            values[property.index()] = property.compute(frame)?;
        }
        Ok(Self { values })
    }

    /// Builds a vector from a value per property
    pub fn from_fn(mut f: impl FnMut(Property) -> f64) -> Self {
        let mut values = [0.0; Property::COUNT];
        for property in Property::ALL {
            values[property.index()] = f(property);
        }
        Self { values }
    }

    /// Gets the value of one property
    pub fn get(&self, property: Property) -> f64 {
        self.values[property.index()]
    }

    /// Iterates over `(property, value)` pairs in report order
    pub fn iter(&self) -> impl Iterator<Item = (Property, f64)> + '_ {
        Property::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}
