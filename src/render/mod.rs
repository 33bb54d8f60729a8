/// Surface trait and frame buffers.
pub mod backend;
/// Caption wrapping and measurement.
pub mod caption;
/// Per-frame draw planning.
pub mod compositor;
/// `vello_cpu` raster surface.
pub mod cpu;
/// Frame geometry.
pub mod layout;
