//! Camera sources, frame encoding, and the capture controller.

pub mod camera;
pub mod capture;
pub mod image;
pub mod mime_detect;

pub use camera::{acquire, DirectoryCamera, StillImageCamera};
pub use capture::{parse_tag_ids, CaptureController, CaptureState, PendingCapture};
pub use image::{decode_png, encode_png, frame_to_inline_image, payload_from_data_url, to_data_url};
pub use mime_detect::{detect_mime_type, is_frame_file, is_png};
