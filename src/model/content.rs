use serde::{Deserialize, Serialize};

/// One narrated beat: a caption plus an optional image reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Unique id within the content.
    pub id: String,
    /// Caption text shown while the scene is active.
    pub text: String,
    /// Prompt hint used when (re)generating the scene image.
    #[serde(default)]
    pub visual_suggestion: String,
    /// Image reference (`data:` URL, `blob:` reference or path). `None` when not generated yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Scene {
    /// Build a scene without an image.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            visual_suggestion: String::new(),
            image_url: None,
        }
    }

    /// Attach an image reference.
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// `true` when the scene has a non-empty image reference.
    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Ordered scenes plus a title; the unit the compositor walks over.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderableContent {
    /// Content title, also used for download file names.
    pub title: String,
    /// Scenes in playback order.
    pub scenes: Vec<Scene>,
}

impl RenderableContent {
    /// Build content from a title and ordered scenes.
    pub fn new(title: impl Into<String>, scenes: Vec<Scene>) -> Self {
        Self {
            title: title.into(),
            scenes,
        }
    }

    /// Number of scenes.
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Ids of scenes that still need an image.
    pub fn scenes_missing_images(&self) -> Vec<String> {
        self.scenes
            .iter()
            .filter(|s| !s.has_image())
            .map(|s| s.id.clone())
            .collect()
    }

    /// Narration script: all captions joined by single spaces.
    pub fn script(&self) -> String {
        self.scenes
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Set the image of the scene with `id`. Returns `false` when no such scene exists.
    pub fn set_scene_image(&mut self, id: &str, image_url: impl Into<String>) -> bool {
        match self.scenes.iter_mut().find(|s| s.id == id) {
            Some(scene) => {
                scene.image_url = Some(image_url.into());
                true
            }
            None => false,
        }
    }
}
