/// Constant-rate capture stream.
pub mod capture;
/// Frame loop time sources.
pub mod clock;
/// Monotonic progress reporting.
pub mod progress;
/// Render state machine and entry point.
pub mod render_job;
