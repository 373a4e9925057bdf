//! Concrete transform steps.
//!
//! Generators ignore their input and draw a fresh image (placeholder,
//! percentage, schedule, barcode, remote image, page capture). Everything
//! else reworks the image it is handed.

pub mod adjust;
pub mod barcode;
pub mod counter;
pub mod percentage;
pub mod placeholder;
pub mod remote;
pub mod resize;
pub mod rotate_flip;
pub mod schedule;
pub mod url_capture;
pub mod watermark;

pub use adjust::{Brightness, Contrast, Gamma, Greyscale, Invert};
pub use barcode::{Barcode, BarcodeKind};
pub use counter::Counter;
pub use percentage::Percentage;
pub use placeholder::Placeholder;
pub use remote::RemoteImage;
pub use resize::{Resize, ResizeMode};
pub use rotate_flip::RotateFlip;
pub use schedule::Schedule;
pub use url_capture::{CaptureRatio, UrlCapture};
pub use watermark::{Watermark, WatermarkPosition};
