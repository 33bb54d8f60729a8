/// Image and audio decoding.
pub mod decode;
/// Parallel asset loading with placeholder fallback.
pub mod loader;
/// `ffmpeg` helpers for audio decoding.
pub mod media;
/// Resource references and fetchers.
pub mod source;
pub(crate) mod svg_raster;
