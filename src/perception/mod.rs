pub mod screen_capture;
pub mod traits;
pub mod transcript;
pub mod types;
