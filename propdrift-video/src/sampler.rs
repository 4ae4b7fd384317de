//! Deterministic temporal frame sampling
//!
//! A video is sampled at a target density of frames per minute of content.
//! The density is turned into a fixed stride in decoded-frame count and every
//! frame whose decode index is a multiple of the stride is kept.

use crate::{Error, Result, VideoReader};
use propdrift_core::{Frame, SampledFrame};
use std::path::Path;
use std::sync::Arc;

/// Sampler configuration
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Frames to keep per minute of video content
    pub target_frames_per_minute: u32,
    /// Side of the square every sampled frame is resized to
    pub frame_size: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            target_frames_per_minute: 60,
            frame_size: 384,
        }
    }
}

/// Stride arithmetic for one video
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPlan {
    total_frames: u64,
    native_fps: f64,
    target_frames_per_minute: u32,
}

impl SamplingPlan {
    /// Creates a plan; every parameter must be positive and the frame rate finite
    pub fn new(
        total_frames: u64,
        native_fps: f64,
        target_frames_per_minute: u32,
    ) -> Result<Self> {
        if total_frames == 0 {
            return Err(Error::InvalidSamplingPlan(
                "video reports no frames".to_string(),
            ));
        }
        if !native_fps.is_finite() || native_fps <= 0.0 {
            return Err(Error::InvalidSamplingPlan(format!(
                "frame rate must be positive, got {}",
                native_fps
            )));
        }
        if target_frames_per_minute == 0 {
            return Err(Error::InvalidSamplingPlan(
                "target frames per minute must be positive".to_string(),
            ));
        }

        Ok(Self {
            total_frames,
            native_fps,
            target_frames_per_minute,
        })
    }

    /// Video duration in minutes
    pub fn duration_minutes(&self) -> f64 {
        self.total_frames as f64 / self.native_fps / 60.0
    }

    /// Number of frames the target density asks for
    pub fn frames_to_process(&self) -> u64 {
        (self.target_frames_per_minute as f64 * self.duration_minutes()).floor() as u64
    }

    /// Stride between sampled frames, never below 1.
    ///
    /// A video too short to yield a single frame at the target density gets a
    /// stride spanning the whole video, so only frame 0 is kept.
    pub fn frame_interval(&self) -> u64 {
        match self.frames_to_process() {
            0 => self.total_frames,
            frames => (self.total_frames / frames).max(1),
        }
    }

    /// Returns true when the frame at `index` is sampled
    pub fn selects(&self, index: u64) -> bool {
        index % self.frame_interval() == 0
    }

    /// Indices the plan selects, assuming the reported frame count is exact
    pub fn selected_indices(&self) -> impl Iterator<Item = u64> {
        (0..self.total_frames).step_by(self.frame_interval() as usize)
    }
}

/// Outcome of sampling one video source
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum SourceStatus {
    /// The source was opened and decoded
    Sampled {
        total_frames: u64,
        native_fps: f64,
        frame_interval: u64,
        decoded_frames: u64,
        sampled_frames: usize,
        /// False when a decode error cut the pass short
        complete: bool,
    },
    /// The source could not be opened or planned; no frames were sampled
    Unavailable { reason: String },
}

impl SourceStatus {
    /// Returns true for the `Unavailable` outcome
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceStatus::Unavailable { .. })
    }
}

/// Frames sampled from one video, in decode order
#[derive(Debug, Clone)]
pub struct SampledVideo {
    pub frames: Vec<SampledFrame>,
    pub status: SourceStatus,
}

/// Samples evenly spaced, resized frames from a video file
#[derive(Debug, Clone, Default)]
pub struct FrameSampler {
    config: SamplerConfig,
}

impl FrameSampler {
    /// Creates a new frame sampler with the given configuration
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Gets the sampler configuration
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Samples a video file.
    ///
    /// A source that cannot be opened yields no frames and an `Unavailable`
    /// status instead of an error.
    pub fn sample<P: AsRef<Path>>(&self, path: P) -> SampledVideo {
        let path = path.as_ref();
        match self.try_sample(path) {
            Ok(video) => video,
            Err(e) => {
                log::warn!("Could not sample {}: {}", path.display(), e);
                SampledVideo {
                    frames: Vec::new(),
                    status: SourceStatus::Unavailable {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    fn try_sample(&self, path: &Path) -> Result<SampledVideo> {
        let mut reader = VideoReader::open(path)?;
        let plan = SamplingPlan::new(
            reader.frame_count(),
            reader.frame_rate(),
            self.config.target_frames_per_minute,
        )?;
        let frame_interval = plan.frame_interval();

        log::info!(
            "Sampling {}: {}x{}, {} frames @ {:.3} fps, every {} frame(s)",
            path.display(),
            reader.width(),
            reader.height(),
            plan.total_frames,
            plan.native_fps,
            frame_interval
        );

        let source: Arc<str> = Arc::from(path.display().to_string());
        let size = self.config.frame_size;
        let mut frames = Vec::new();

        let summary = reader.read_frames_streaming(
            size,
            size,
            |index| plan.selects(index),
            |index, image| {
                log::trace!("Sampled frame {} of {}", index, source);
                frames.push(SampledFrame::new(Frame::Color(image), index, Arc::clone(&source)));
            },
        )?;

        log::info!(
            "Sampled {} of {} decoded frames from {}",
            frames.len(),
            summary.decoded_frames,
            path.display()
        );

        let status = SourceStatus::Sampled {
            total_frames: plan.total_frames,
            native_fps: plan.native_fps,
            frame_interval,
            decoded_frames: summary.decoded_frames,
            sampled_frames: frames.len(),
            complete: !summary.stopped_early,
        };

        Ok(SampledVideo { frames, status })
    }
}
