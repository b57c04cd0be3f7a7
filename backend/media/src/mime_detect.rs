//! MIME type detection for camera frame files.
//!
//! Used by the file-backed camera sources to pick up snapshots.

use std::path::Path;

pub const PNG_MIME: &str = "image/png";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "png"          => PNG_MIME,
        "jpg" | "jpeg" => "image/jpeg",
        "webp"         => "image/webp",
        "bmp"          => "image/bmp",
        _              => "application/octet-stream",
    }
}

/// Whether the bytes start with the PNG signature.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

/// Whether a file can be used as a camera frame (only PNG is decoded).
pub fn is_frame_file(path: &Path) -> bool {
    detect_mime_type(path) == PNG_MIME
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_png_case_insensitively() {
        assert_eq!(detect_mime_type(&PathBuf::from("tag.PNG")), "image/png");
        assert!(is_frame_file(&PathBuf::from("shots/tag.png")));
    }

    #[test]
    fn jpeg_is_not_a_frame_file() {
        assert_eq!(detect_mime_type(&PathBuf::from("photo.jpg")), "image/jpeg");
        assert!(!is_frame_file(&PathBuf::from("photo.jpg")));
    }

    #[test]
    fn unknown_extension_fallback() {
        assert_eq!(detect_mime_type(&PathBuf::from("file.xyz")), "application/octet-stream");
    }

    #[test]
    fn sniffs_png_signature() {
        assert!(is_png(b"\x89PNG\r\n\x1a\n rest"));
        assert!(!is_png(b"GIF89a"));
    }
}
