//! Video reading and frame extraction using FFmpeg

use crate::{Error, Result};
use ffmpeg_next as ffmpeg;
use image::RgbImage;
use std::path::Path;
use std::sync::OnceLock;

static FFMPEG_INIT: OnceLock<std::result::Result<(), ffmpeg::Error>> = OnceLock::new();

/// Initialize FFmpeg once per process
fn init_ffmpeg() -> Result<()> {
    let initialized = *FFMPEG_INIT.get_or_init(|| {
        let result = ffmpeg::init();
        ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Error);
        result
    });
    Ok(initialized?)
}

/// Summary of one decoding pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSummary {
    /// Number of frames the decoder produced
    pub decoded_frames: u64,
    /// True when a decode error ended the pass before the end of the stream
    pub stopped_early: bool,
}

/// Video reader that extracts frames from video files.
///
/// The FFmpeg demuxer and decoder are released when the reader is dropped.
pub struct VideoReader {
    input: ffmpeg::format::context::Input,
    video_stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    native_fps: f64,
    duration_secs: f64,
    reported_frames: u64,
}

impl VideoReader {
    /// Opens a video file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        init_ffmpeg()?;

        let input = ffmpeg::format::input(path.as_ref())?;

        let video_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(Error::NoVideoStream)?;

        let video_stream_index = video_stream.index();

        let mut native_fps = rational_to_f64(video_stream.avg_frame_rate());
        if native_fps <= 0.0 {
            native_fps = rational_to_f64(video_stream.rate());
        }

        let time_base = rational_to_f64(video_stream.time_base());
        let duration_secs = if video_stream.duration() > 0 && time_base > 0.0 {
            video_stream.duration() as f64 * time_base
        } else {
            // Fallback to container duration
            input.duration().max(0) as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
        };

        let reported_frames = video_stream.frames().max(0) as u64;

        let context = ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())?;
        let decoder = context.decoder().video()?;

        Ok(Self {
            input,
            video_stream_index,
            decoder,
            native_fps,
            duration_secs,
            reported_frames,
        })
    }

    /// Gets the video width
    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    /// Gets the video height
    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /// Gets the native frame rate in frames per second (0 when unknown)
    pub fn frame_rate(&self) -> f64 {
        self.native_fps
    }

    /// Gets the stream duration in seconds (0 when unknown)
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Gets the total frame count.
    ///
    /// Containers that do not store a frame count get an estimate from
    /// duration and frame rate.
    pub fn frame_count(&self) -> u64 {
        if self.reported_frames > 0 {
            self.reported_frames
        } else {
            (self.duration_secs * self.native_fps).round().max(0.0) as u64
        }
    }

    /// Decodes the stream in order, converting every frame accepted by
    /// `select` to RGB at `width` x `height` and passing it to `on_frame`
    /// together with its zero-based decode index.
    ///
    /// A decode or conversion error ends the pass; frames delivered before
    /// it are kept and the summary is flagged as stopped early.
    pub fn read_frames_streaming<S, F>(
        &mut self,
        width: u32,
        height: u32,
        mut select: S,
        mut on_frame: F,
    ) -> Result<ReadSummary>
    where
        S: FnMut(u64) -> bool,
        F: FnMut(u64, RgbImage),
    {
        let mut scaler = ffmpeg::software::scaling::Context::get(
            self.decoder.format(),
            self.decoder.width(),
            self.decoder.height(),
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )?;

        let mut decoded = ffmpeg::frame::Video::empty();
        let mut rgb_frame = ffmpeg::frame::Video::empty();
        let mut index: u64 = 0;

        let mut receive_and_process_decoded_frames =
            |decoder: &mut ffmpeg::decoder::Video, index: &mut u64| -> Result<()> {
                loop {
                    match decoder.receive_frame(&mut decoded) {
                        Ok(()) => {}
                        // decoder wants more input, or is fully drained
                        Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => {
                            return Ok(())
                        }
                        Err(ffmpeg::Error::Eof) => return Ok(()),
                        Err(e) => return Err(e.into()),
                    }
                    if select(*index) {
                        scaler.run(&decoded, &mut rgb_frame)?;
                        on_frame(*index, frame_to_image(&rgb_frame)?);
                    }
                    *index += 1;
                }
            };

        let mut stopped_early = false;
        for (stream, packet) in self.input.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }
            let step = self
                .decoder
                .send_packet(&packet)
                .map_err(Error::from)
                .and_then(|_| receive_and_process_decoded_frames(&mut self.decoder, &mut index));
            if let Err(e) = step {
                log::warn!("Decoding stopped at frame {}: {}", index, e);
                stopped_early = true;
                break;
            }
        }

        if !stopped_early {
            // Flush decoder
            let flush = self
                .decoder
                .send_eof()
                .map_err(Error::from)
                .and_then(|_| receive_and_process_decoded_frames(&mut self.decoder, &mut index));
            if let Err(e) = flush {
                log::warn!("Decoder flush failed after {} frames: {}", index, e);
                stopped_early = true;
            }
        }

        Ok(ReadSummary {
            decoded_frames: index,
            stopped_early,
        })
    }
}

/// Copies a packed RGB24 frame into an image buffer, dropping row padding
fn frame_to_image(frame: &ffmpeg::frame::Video) -> Result<RgbImage> {
    let width = frame.width();
    let height = frame.height();
    let stride = frame.stride(0);
    let row_len = width as usize * 3;
    if stride < row_len {
        return Err(Error::InvalidVideo);
    }

    let mut data = Vec::with_capacity(row_len * height as usize);
    for row in frame.data(0).chunks(stride).take(height as usize) {
        data.extend_from_slice(row.get(..row_len).ok_or(Error::InvalidVideo)?);
    }

    RgbImage::from_raw(width, height, data).ok_or(Error::InvalidVideo)
}

fn rational_to_f64(rational: ffmpeg::Rational) -> f64 {
    if rational.denominator() == 0 {
        0.0
    } else {
        rational.numerator() as f64 / rational.denominator() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_clip::write_test_clip;
    use ffmpeg::format::Pixel;

    #[test]
    fn test_open_missing_file_fails() {
        let result = VideoReader::open("/nonexistent/video.mp4");
        assert!(matches!(result, Err(Error::Ffmpeg(_))));
    }

    #[test]
    fn test_rational_conversion() {
        assert_eq!(rational_to_f64(ffmpeg::Rational::new(30000, 1001)), 30000.0 / 1001.0);
        assert_eq!(rational_to_f64(ffmpeg::Rational::new(25, 1)), 25.0);
        assert_eq!(rational_to_f64(ffmpeg::Rational::new(0, 0)), 0.0);
    }

    #[test]
    fn test_frame_to_image_drops_row_padding() {
        let (width, height) = (5u32, 3u32);
        let row_len = width as usize * 3;
        let mut frame = ffmpeg::frame::Video::new(Pixel::RGB24, width, height);
        let stride = frame.stride(0);
        assert!(stride > row_len);

        for (y, row) in frame.data_mut(0).chunks_mut(stride).take(height as usize).enumerate() {
            for (x, byte) in row.iter_mut().enumerate() {
                *byte = if x < row_len { (y * 100 + x) as u8 } else { 0xFF };
            }
        }

        let image = frame_to_image(&frame).unwrap();

        assert_eq!(image.dimensions(), (width, height));
        assert_eq!(image.get_pixel(0, 0).0, [0, 1, 2]);
        assert_eq!(image.get_pixel(4, 0).0, [12, 13, 14]);
        assert_eq!(image.get_pixel(1, 2).0, [203, 204, 205]);
        assert!(image.as_raw().iter().all(|&v| v != 0xFF));
    }

    #[test]
    fn test_read_frames_streaming_decodes_whole_clip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.avi");
        write_test_clip(&path, 24, 12, 64, 48).unwrap();

        let mut reader = VideoReader::open(&path).unwrap();
        assert_eq!((reader.width(), reader.height()), (64, 48));
        assert!((reader.frame_rate() - 12.0).abs() < 1e-6);
        assert_eq!(reader.frame_count(), 24);

        let mut seen = Vec::new();
        let summary = reader
            .read_frames_streaming(
                32,
                16,
                |index| index % 5 == 0,
                |index, image| seen.push((index, image.dimensions())),
            )
            .unwrap();

        assert_eq!(summary.decoded_frames, 24);
        assert!(!summary.stopped_early);
        assert_eq!(
            seen,
            vec![(0, (32, 16)), (5, (32, 16)), (10, (32, 16)), (15, (32, 16)), (20, (32, 16))]
        );
    }
}
