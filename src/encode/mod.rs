//! Encoding: capability negotiation and recorders.
//!
//! Recorders consume captured frames in timeline order and return one encoded blob.

/// `ffmpeg`-backed recorder and runtime.
pub mod ffmpeg;
/// Encoding plan negotiation.
pub mod plan;
/// Recorder trait and built-in recorders.
pub mod sink;
