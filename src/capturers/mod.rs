pub mod screenshot;

pub use screenshot::{PageCapture, ScreenshotCapturer};
