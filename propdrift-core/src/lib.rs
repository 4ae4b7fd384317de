//! PropDrift Core Library
//!
//! This library provides the frame data model, the per-frame property
//! extractor, the property distribution builder and the Kolmogorov-Smirnov
//! drift detector used to compare a reference video against a comparison video.

pub mod distribution;
pub mod drift;
pub mod frame;
pub mod property;
pub mod stats;

pub use distribution::{extract_properties, FrameInput, PropertyDistribution};
pub use drift::{DriftDetector, DriftRecord, DriftReport, PropertyDrift};
pub use frame::{Frame, SampledFrame};
pub use property::{Property, PropertyVector};

/// Result type for propdrift-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for propdrift-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Property requires color channels but the frame is single-channel")]
    UnsupportedColorLayout,

    #[error("Degenerate sample: reference has {reference} values, comparison has {comparison}")]
    DegenerateSample { reference: usize, comparison: usize },

    #[error("Unknown property: {0}")]
    UnknownProperty(String),
}
