/// Generative collaborator seam.
pub mod generator;
/// `blob:` reference registry.
pub mod object_url;
/// The `Studio` entry points.
pub mod orchestrator;
