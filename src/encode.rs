//! Video export of rendered frames.

/// MP4 output through the system `ffmpeg`.
pub mod ffmpeg;
