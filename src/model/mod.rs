/// Scenes and renderable content.
pub mod content;
/// Render request snapshot.
pub mod request;
/// Video, avatar and watermark settings.
pub mod settings;
