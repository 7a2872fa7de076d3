//! Template lookup
//!
//! A window kind's template comes from the explicit windows configuration
//! first. Kinds missing there are looked up by convention at
//! `"<path_to_windows>/<kind>"` through a [`ResourceProvider`].

use anyhow::Context;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::{WindowTemplate, WindowsConfig};
use crate::error::{Result, StackError};
use crate::window::WindowKind;

/// Source of templates for the convention-based fallback.
pub trait ResourceProvider {
    /// `Ok(None)` when nothing exists at `path`.
    fn load(&self, path: &str) -> anyhow::Result<Option<WindowTemplate>>;
}

/// Templates kept in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct StaticResources {
    entries: HashMap<String, WindowTemplate>,
}

impl StaticResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, template: WindowTemplate) -> &mut Self {
        self.entries.insert(path.into(), template);
        self
    }

    pub fn with(mut self, path: impl Into<String>, template: WindowTemplate) -> Self {
        self.insert(path, template);
        self
    }
}

impl ResourceProvider for StaticResources {
    fn load(&self, path: &str) -> anyhow::Result<Option<WindowTemplate>> {
        Ok(self.entries.get(path).cloned())
    }
}

/// Templates stored as `<root>/<path>.toml`.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn file_for(&self, path: &str) -> PathBuf {
        self.root.join(format!("{}.toml", path))
    }
}

impl ResourceProvider for DirectoryResources {
    fn load(&self, path: &str) -> anyhow::Result<Option<WindowTemplate>> {
        let file = self.file_for(path);
        let contents = match fs::read_to_string(&file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read template: {}", file.display()))
            }
        };

        let template: WindowTemplate = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse template: {}", file.display()))?;
        Ok(Some(template))
    }
}

/// No fallback: every kind must be configured explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResources;

impl ResourceProvider for NoResources {
    fn load(&self, _path: &str) -> anyhow::Result<Option<WindowTemplate>> {
        Ok(None)
    }
}

/// Resolves window kinds to templates.
pub struct TemplateRegistry {
    config: WindowsConfig,
    resources: Box<dyn ResourceProvider>,
}

impl TemplateRegistry {
    pub fn new(config: WindowsConfig, resources: Box<dyn ResourceProvider>) -> Self {
        Self { config, resources }
    }

    pub fn set_config(&mut self, config: WindowsConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &WindowsConfig {
        &self.config
    }

    /// Resolve `kind`: explicit config, then the fallback path.
    pub fn resolve(&self, kind: &WindowKind) -> Result<WindowTemplate> {
        if let Some(template) = self.config.template(kind) {
            debug!("Template for {} found in windows config", kind);
            return Ok(template.clone());
        }

        let path = self.config.path_to_window(kind);
        let loaded = self
            .resources
            .load(&path)
            .map_err(|source| StackError::TemplateLoad {
                kind: kind.clone(),
                source,
            })?;

        match loaded {
            Some(mut template) => {
                warn!("{} missing from windows config; loaded from fallback path '{}'", kind, path);
                // The lookup key wins over whatever the resource declares
                template.kind = kind.clone();
                Ok(template)
            }
            None => Err(StackError::ConfigurationMissing {
                kind: kind.clone(),
                fallback_path: path,
            }),
        }
    }
}
