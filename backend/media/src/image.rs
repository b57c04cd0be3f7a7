//! Frame encoding: RGBA frame → PNG → data URL → base64 payload, and PNG
//! decoding for file-backed cameras.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::debug;

use tagscan_core::{CameraError, CaptureError, Frame, InlineImage};

use crate::mime_detect::{is_png, PNG_MIME};

/// Encode a frame as an 8-bit RGBA PNG.
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, CaptureError> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.is_empty() || frame.pixels.len() != expected {
        return Err(CaptureError::EncodeFailed);
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, frame.width, frame.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(|_| CaptureError::EncodeFailed)?;
        writer
            .write_image_data(&frame.pixels)
            .map_err(|_| CaptureError::EncodeFailed)?;
        writer.finish().map_err(|_| CaptureError::EncodeFailed)?;
    }
    Ok(out)
}

pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// The raw payload after the data-URL prefix, if any.
pub fn payload_from_data_url(data_url: &str) -> Option<&str> {
    data_url
        .split_once(',')
        .map(|(_, payload)| payload)
        .filter(|payload| !payload.is_empty())
}

/// Freeze a frame into the payload sent for recognition.
pub fn frame_to_inline_image(frame: &Frame) -> Result<InlineImage, CaptureError> {
    let png = encode_png(frame)?;
    let data_url = to_data_url(PNG_MIME, &png);
    let data = payload_from_data_url(&data_url).ok_or(CaptureError::EncodeFailed)?;
    debug!(width = frame.width, height = frame.height, bytes = png.len(), "Frame encoded");
    Ok(InlineImage {
        mime_type: PNG_MIME.to_string(),
        data: data.to_string(),
    })
}

/// Decode a PNG file into an RGBA frame.
pub fn decode_png(bytes: &[u8]) -> Result<Frame, CameraError> {
    if !is_png(bytes) {
        return Err(CameraError::FrameUnavailable("not a PNG image".into()));
    }
    let bad = |e: png::DecodingError| CameraError::FrameUnavailable(e.to_string());

    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder.read_info().map_err(bad)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(bad)?;
    buf.truncate(info.buffer_size());

    let pixels = match info.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 0xFF])
            .collect(),
        png::ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g, 0xFF]).collect(),
        png::ColorType::Indexed => {
            return Err(CameraError::FrameUnavailable("unexpanded palette image".into()));
        }
    };

    Ok(Frame::new(info.width, info.height, pixels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> Frame {
        let pixels = (0..width * height)
            .flat_map(|i| if i % 2 == 0 { [0, 0, 0, 255] } else { [255, 255, 255, 255] })
            .collect();
        Frame::new(width, height, pixels)
    }

    #[test]
    fn encoded_frame_decodes_to_same_pixels() {
        let frame = checker(4, 3);
        let png = encode_png(&frame).unwrap();
        assert!(is_png(&png));
        assert_eq!(decode_png(&png).unwrap(), frame);
    }

    #[test]
    fn empty_frame_fails_to_encode() {
        assert_eq!(encode_png(&Frame::empty()), Err(CaptureError::EncodeFailed));
    }

    #[test]
    fn short_pixel_buffer_fails_to_encode() {
        let frame = Frame::new(2, 2, vec![0; 3]);
        assert_eq!(encode_png(&frame), Err(CaptureError::EncodeFailed));
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        assert_eq!(payload_from_data_url("data:image/png;base64,AAAA"), Some("AAAA"));
        assert_eq!(payload_from_data_url("data:image/png;base64,"), None);
        assert_eq!(payload_from_data_url("no-comma"), None);
    }

    #[test]
    fn inline_image_is_base64_png() {
        let image = frame_to_inline_image(&checker(2, 2)).unwrap();
        assert_eq!(image.mime_type, "image/png");
        let bytes = STANDARD.decode(&image.data).unwrap();
        assert!(is_png(&bytes));
    }

    #[test]
    fn rgb_png_is_expanded_to_rgba() {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, 1, 1);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[10, 20, 30]).unwrap();
        }
        let frame = decode_png(&out).unwrap();
        assert_eq!(frame.pixels, vec![10, 20, 30, 255]);
    }

    #[test]
    fn non_png_bytes_are_rejected() {
        assert!(matches!(
            decode_png(b"GIF89a...."),
            Err(CameraError::FrameUnavailable(_))
        ));
    }
}
