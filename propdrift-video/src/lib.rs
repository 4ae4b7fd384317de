//! PropDrift Video Library
//!
//! This library samples frames from video files with FFmpeg and runs the
//! train/test property drift pipeline on top of `propdrift-core`.

pub mod pipeline;
pub mod sampler;
pub mod video_reader;

#[cfg(test)]
mod test_clip;

pub use pipeline::{DriftPipeline, PipelineConfig, PipelineReport, VideoProperties, VideoSummary};
pub use sampler::{FrameSampler, SampledVideo, SamplerConfig, SamplingPlan, SourceStatus};
pub use video_reader::VideoReader;

/// Result type for propdrift-video operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for propdrift-video operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("PropDrift core error: {0}")]
    Core(#[from] propdrift_core::Error),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("Invalid video file")]
    InvalidVideo,

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Invalid sampling plan: {0}")]
    InvalidSamplingPlan(String),
}
