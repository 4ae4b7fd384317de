//! Synthetic video clips for the decoding tests

use ffmpeg_next as ffmpeg;
use std::path::Path;

/// Encodes `frames` gray-ramp frames of `width` x `height` at `fps` into an
/// MPEG-4 Part 2 stream; the container follows the file extension.
pub(crate) fn write_test_clip(
    path: &Path,
    frames: i64,
    fps: i32,
    width: u32,
    height: u32,
) -> Result<(), ffmpeg::Error> {
    ffmpeg::init()?;

    let time_base = ffmpeg::Rational(1, fps);
    let mut output = ffmpeg::format::output(path)?;
    let global_header = output
        .format()
        .flags()
        .contains(ffmpeg::format::Flags::GLOBAL_HEADER);

    let codec = ffmpeg::encoder::find(ffmpeg::codec::Id::MPEG4).ok_or(ffmpeg::Error::EncoderNotFound)?;

    let context = ffmpeg::codec::context::Context::from_parameters(ffmpeg::codec::Parameters::new())?;
    let mut video = context.encoder().video()?;
    video.set_width(width);
    video.set_height(height);
    video.set_format(ffmpeg::format::Pixel::YUV420P);
    video.set_time_base(time_base);
    video.set_frame_rate(Some(ffmpeg::Rational(fps, 1)));
    video.set_max_b_frames(0);
    if global_header {
        video.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
    }
    let mut encoder = video.open_as(codec)?;

    let stream_index = {
        let mut stream = output.add_stream(codec)?;
        stream.set_parameters(&encoder);
        stream.set_time_base(time_base);
        stream.index()
    };
    output.write_header()?;
    let stream_time_base = output
        .stream(stream_index)
        .map(|stream| stream.time_base())
        .ok_or(ffmpeg::Error::StreamNotFound)?;

    let mut frame = ffmpeg::frame::Video::new(ffmpeg::format::Pixel::YUV420P, width, height);
    let mut packet = ffmpeg::Packet::empty();

    for index in 0..frames {
        let shade = (16 + index * 8).min(235) as u8;
        frame.data_mut(0).fill(shade);
        frame.data_mut(1).fill(128);
        frame.data_mut(2).fill(128);
        frame.set_pts(Some(index));

        encoder.send_frame(&frame)?;
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(stream_index);
            packet.rescale_ts(time_base, stream_time_base);
            packet.write_interleaved(&mut output)?;
        }
    }

    encoder.send_eof()?;
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(stream_index);
        packet.rescale_ts(time_base, stream_time_base);
        packet.write_interleaved(&mut output)?;
    }
    output.write_trailer()?;

    Ok(())
}
