//! Train/test property drift pipeline
//!
//! Samples both videos, extracts a property distribution from each and
//! scores the drift between them.

use crate::{FrameSampler, SamplerConfig, SourceStatus};
use propdrift_core::{DriftDetector, DriftReport, PropertyDistribution};
use std::path::Path;

/// Pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Frame sampling settings, shared by both videos
    pub sampler: SamplerConfig,
    /// Sample and extract the two videos on separate threads
    pub parallel: bool,
}

/// Property distribution of one video
#[derive(Debug, Clone)]
pub struct VideoProperties {
    pub summary: VideoSummary,
    pub distribution: PropertyDistribution,
}

/// What happened to one video source
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VideoSummary {
    /// Path of the video
    pub source: String,
    /// Outcome of opening and sampling the video
    pub status: SourceStatus,
    /// Frames that made it into the property distribution
    pub extracted_frames: usize,
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PipelineReport {
    /// Per-property drift between the two videos
    pub drift: DriftReport,
    /// Mean KS statistic, when every property could be measured
    pub overall_drift: Option<f64>,
    /// Reference ("train") video
    pub reference: VideoSummary,
    /// Comparison ("test") video
    pub comparison: VideoSummary,
}

/// Runs frame sampling, property extraction and drift scoring for a video pair
#[derive(Debug, Clone, Default)]
pub struct DriftPipeline {
    config: PipelineConfig,
    sampler: FrameSampler,
    detector: DriftDetector,
}

impl DriftPipeline {
    /// Creates a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        let sampler = FrameSampler::new(config.sampler.clone());
        Self {
            config,
            sampler,
            detector: DriftDetector::new(),
        }
    }

    /// Samples one video and extracts its property distribution
    pub fn extract_properties<P: AsRef<Path>>(&self, video: P) -> VideoProperties {
        let video = video.as_ref();
        let sampled = self.sampler.sample(video);
        let distribution = PropertyDistribution::from_frames(sampled.frames);

        if distribution.is_empty() {
            log::warn!(
                "No frames extracted from {}. Check that the path is correct and the file is readable.",
                video.display()
            );
        } else {
            log::info!(
                "Extracted properties for {} frames of {}",
                distribution.len(),
                video.display()
            );
        }

        VideoProperties {
            summary: VideoSummary {
                source: video.display().to_string(),
                status: sampled.status,
                extracted_frames: distribution.len(),
            },
            distribution,
        }
    }

    /// Compares a reference (train) video against a comparison (test) video
    pub fn run<P, Q>(&self, reference: P, comparison: Q) -> PipelineReport
    where
        P: AsRef<Path> + Sync,
        Q: AsRef<Path> + Sync,
    {
        let (reference, comparison) = if self.config.parallel {
            rayon::join(
                || self.extract_properties(&reference),
                || self.extract_properties(&comparison),
            )
        } else {
            (
                self.extract_properties(&reference),
                self.extract_properties(&comparison),
            )
        };

        let drift = self
            .detector
            .compare(&reference.distribution, &comparison.distribution);
        let overall_drift = drift.overall_drift();

        match overall_drift {
            Some(score) => log::info!("Overall drift score: {:.2}", score),
            None => log::warn!(
                "Overall drift is undefined for properties {:?}",
                drift.degenerate_properties()
            ),
        }

        PipelineReport {
            drift,
            overall_drift,
            reference: reference.summary,
            comparison: comparison.summary,
        }
    }
}
