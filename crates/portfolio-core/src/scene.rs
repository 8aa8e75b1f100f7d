//! Runtime scene registry handed to the conversation controller.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ai;
use crate::config::{Config, SceneSettings};
use crate::error::ChatError;
use crate::prompt::{template_generator, PromptGenerator};
use crate::provider::CompletionProvider;

/// A resolved chat profile: tuning settings, a live client, and an optional
/// preamble generator.
#[derive(Clone)]
pub struct Scene {
    pub settings: SceneSettings,
    pub provider: Arc<dyn CompletionProvider>,
    pub system_prompt: Option<PromptGenerator>,
}

impl Scene {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            settings: SceneSettings::default(),
            provider,
            system_prompt: None,
        }
    }

    pub fn with_settings(mut self, settings: SceneSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_system_prompt(mut self, generator: PromptGenerator) -> Self {
        self.system_prompt = Some(generator);
        self
    }

    pub fn from_settings(settings: SceneSettings) -> Result<Self, ChatError> {
        let provider = ai::client_for(&settings).map_err(|e| ChatError::Config(e.to_string()))?;
        let system_prompt = settings.system_prompt.clone().map(template_generator);

        Ok(Self {
            settings,
            provider,
            system_prompt,
        })
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("settings", &self.settings)
            .field("provider", &self.provider.name())
            .field("system_prompt", &self.system_prompt.is_some())
            .finish()
    }
}

/// Scenes keyed by name.
#[derive(Clone, Debug, Default)]
pub struct ChatConfig {
    scenes: HashMap<String, Scene>,
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        let mut chat_config = Self::new();
        for (name, settings) in &config.scenes {
            chat_config.insert(name.clone(), Scene::from_settings(settings.clone())?);
        }
        Ok(chat_config)
    }

    pub fn with_scene(mut self, name: impl Into<String>, scene: Scene) -> Self {
        self.insert(name, scene);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, scene: Scene) {
        self.scenes.insert(name.into(), scene);
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn scene_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scenes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
