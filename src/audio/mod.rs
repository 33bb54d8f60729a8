/// Mixing graph for narration and looping music.
pub mod mix;
/// Raw speech PCM to WAV conversion.
pub mod pcm;
/// Authoritative render duration.
pub mod timeline;
