//! PropDrift CLI Tool
//!
//! Command-line interface for measuring property drift between a training
//! video and a testing video.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use propdrift_core::{DriftDetector, DriftReport, PropertyDistribution, PropertyDrift};
use propdrift_video::{DriftPipeline, PipelineConfig, SamplerConfig, SourceStatus, VideoSummary};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "propdrift")]
#[command(about = "Measure visual property drift between a training and a testing video")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare frames sampled from two videos
    Videos {
        /// Path to the training (reference) video
        #[arg(long)]
        train_video: PathBuf,

        /// Path to the testing (comparison) video
        #[arg(long)]
        test_video: PathBuf,

        /// Output JSON file path
        #[arg(short, long, default_value = "property_drift_results.json")]
        output: PathBuf,

        /// Frames sampled per minute of video
        #[arg(long, default_value = "60")]
        target_fpm: u32,

        /// Side of the square sampled frames are resized to
        #[arg(long, default_value = "384")]
        frame_size: u32,

        /// Process both videos concurrently
        #[arg(long)]
        parallel: bool,
    },

    /// Compare two directories of image files
    Images {
        /// Directory of training (reference) images
        #[arg(long)]
        train_dir: PathBuf,

        /// Directory of testing (comparison) images
        #[arg(long)]
        test_dir: PathBuf,

        /// Output JSON file path
        #[arg(short, long, default_value = "property_drift_results.json")]
        output: PathBuf,
    },
}

/// JSON document written by the `images` command
#[derive(Serialize)]
struct ImagesReport<'a> {
    drift: &'a DriftReport,
    overall_drift: Option<f64>,
    reference_images: usize,
    comparison_images: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Videos {
            train_video,
            test_video,
            output,
            target_fpm,
            frame_size,
            parallel,
        } => compare_videos(train_video, test_video, output, target_fpm, frame_size, parallel)?,

        Commands::Images {
            train_dir,
            test_dir,
            output,
        } => compare_images(train_dir, test_dir, output)?,
    }

    Ok(())
}

/// Sets up env_logger; `RUST_LOG` overrides the level picked from `-v`
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

fn compare_videos(
    train_video: PathBuf,
    test_video: PathBuf,
    output: PathBuf,
    target_fpm: u32,
    frame_size: u32,
    parallel: bool,
) -> Result<()> {
    if target_fpm == 0 {
        bail!("--target-fpm must be positive");
    }
    if frame_size == 0 {
        bail!("--frame-size must be positive");
    }

    println!("Train video: {}", train_video.display());
    println!("Test video: {}", test_video.display());

    let config = PipelineConfig {
        sampler: SamplerConfig {
            target_frames_per_minute: target_fpm,
            frame_size,
        },
        parallel,
    };

    let pipeline = DriftPipeline::new(config);
    let report = pipeline.run(&train_video, &test_video);

    print_source("Train", &report.reference);
    print_source("Test", &report.comparison);
    print_drift(&report.drift, report.overall_drift);

    write_json(&output, &report)?;
    println!("Saved drift results to {}", output.display());

    Ok(())
}

fn compare_images(train_dir: PathBuf, test_dir: PathBuf, output: PathBuf) -> Result<()> {
    let train_images = list_images(&train_dir)?;
    let test_images = list_images(&test_dir)?;

    println!(
        "Comparing {} train images against {} test images",
        train_images.len(),
        test_images.len()
    );

    let reference = PropertyDistribution::from_frames(train_images);
    let comparison = PropertyDistribution::from_frames(test_images);
    let drift = DriftDetector::new().compare(&reference, &comparison);
    let overall_drift = drift.overall_drift();

    print_drift(&drift, overall_drift);

    let report = ImagesReport {
        drift: &drift,
        overall_drift,
        reference_images: reference.len(),
        comparison_images: comparison.len(),
    };
    write_json(&output, &report)?;
    println!("Saved drift results to {}", output.display());

    Ok(())
}

/// Image files directly inside `dir`, sorted by path
fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read image directory {}", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry.context("Failed to read directory entry")?.path();
        if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
            images.push(path);
        }
    }
    images.sort();

    Ok(images)
}

/// Writes pretty JSON with a 4-space indent
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).context("Failed to create output file")?;
    let mut writer = BufWriter::new(file);

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value
        .serialize(&mut serializer)
        .context("Failed to serialize drift results")?;
    writer.flush().context("Failed to write output file")?;

    Ok(())
}

fn print_source(label: &str, summary: &VideoSummary) {
    match &summary.status {
        SourceStatus::Sampled {
            total_frames,
            native_fps,
            frame_interval,
            sampled_frames,
            complete,
            ..
        } => {
            println!(
                "{}: {} frames @ {:.2} fps, every {} frame(s), {} sampled, {} extracted{}",
                label,
                total_frames,
                native_fps,
                frame_interval,
                sampled_frames,
                summary.extracted_frames,
                if *complete { "" } else { " (decoding stopped early)" }
            );
        }
        SourceStatus::Unavailable { reason } => {
            println!("{}: unavailable ({})", label, reason);
        }
    }
}

fn print_drift(drift: &DriftReport, overall_drift: Option<f64>) {
    println!("\n=== Property Drift ===");
    println!(
        "  {:<32} {:>9} {:>8} {:>12} {:>12}",
        "property", "statistic", "p-value", "mean (train)", "mean (test)"
    );
    for (property, outcome) in drift.iter() {
        match outcome {
            PropertyDrift::Measured(record) => println!(
                "  {:<32} {:>9.2} {:>8.2} {:>12.2} {:>12.2}",
                property.name(),
                record.statistic,
                record.p_value,
                record.mean_reference,
                record.mean_comparison
            ),
            PropertyDrift::Degenerate {
                reference_samples,
                comparison_samples,
            } => println!(
                "  {:<32} undefined ({} train / {} test samples)",
                property.name(),
                reference_samples,
                comparison_samples
            ),
        }
    }

    match overall_drift {
        Some(score) => println!("\nOverall drift: {:.2}", score),
        None => println!("\nOverall drift: undefined"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use propdrift_core::Property;
    use tempfile::tempdir;

    #[test]
    fn test_videos_defaults() {
        let cli = Cli::try_parse_from([
            "propdrift",
            "videos",
            "--train-video",
            "train.mp4",
            "--test-video",
            "test.mp4",
        ])
        .unwrap();

        match cli.command {
            Commands::Videos {
                output,
                target_fpm,
                frame_size,
                parallel,
                ..
            } => {
                assert_eq!(output, PathBuf::from("property_drift_results.json"));
                assert_eq!(target_fpm, 60);
                assert_eq!(frame_size, 384);
                assert!(!parallel);
            }
            Commands::Images { .. } => panic!("parsed the wrong subcommand"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_videos_requires_both_paths() {
        let result = Cli::try_parse_from(["propdrift", "videos", "--train-video", "train.mp4"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_images_skips_other_files() {
        let dir = tempdir().unwrap();
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))
            .save(dir.path().join("b.png"))
            .unwrap();
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))
            .save(dir.path().join("a.png"))
            .unwrap();
        fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let images = list_images(dir.path()).unwrap();

        assert_eq!(
            images,
            vec![dir.path().join("a.png"), dir.path().join("b.png")]
        );
    }

    #[test]
    fn test_json_report_shape() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("report.json");

        let reference = PropertyDistribution::from_frames(vec![
            propdrift_core::Frame::Color(RgbImage::from_pixel(8, 8, Rgb([10, 10, 10]))),
            propdrift_core::Frame::Color(RgbImage::from_pixel(8, 8, Rgb([12, 12, 12]))),
        ]);
        let drift = DriftDetector::new().compare(&reference, &PropertyDistribution::new());
        let report = ImagesReport {
            drift: &drift,
            overall_drift: drift.overall_drift(),
            reference_images: 2,
            comparison_images: 0,
        };
        write_json(&output, &report).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("\n    \"drift\""));

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(json["overall_drift"].is_null());
        for property in Property::ALL {
            let entry = &json["drift"][property.name()];
            assert_eq!(entry["degenerate"], true);
            assert_eq!(entry["reference_samples"], 2);
            assert_eq!(entry["comparison_samples"], 0);
        }
    }
}
