//! Directory adapters and the registry that picks one per directory URL.

pub mod cards;
pub mod html;
pub mod renderer;

use crate::config::toml_config::{MatcherConfig, FACULTY_CARDS_KIND};
use crate::domain::ports::{DirectoryAdapter, PageRenderer};
use crate::utils::error::{DirectoryError, MatcherError, Result};
use cards::{CardDirectoryAdapter, CardLayout};
use regex::Regex;
use renderer::HttpPageRenderer;
use std::sync::Arc;
use std::time::Duration;

struct Route {
    pattern: Regex,
    adapter: String,
}

/// Maps directory URLs to adapters.
///
/// Lookup order: explicit name, first matching `url_pattern`, then the default.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn DirectoryAdapter>>,
    routes: Vec<Route>,
    default_adapter: String,
}

impl AdapterRegistry {
    pub fn new(default_adapter: Arc<dyn DirectoryAdapter>) -> Self {
        Self {
            default_adapter: default_adapter.name().to_string(),
            adapters: vec![default_adapter],
            routes: Vec::new(),
        }
    }

    /// Adds an adapter, replacing any previous one with the same name.
    pub fn register(&mut self, adapter: Arc<dyn DirectoryAdapter>, url_pattern: Option<Regex>) {
        let name = adapter.name().to_string();
        self.adapters.retain(|existing| existing.name() != name);
        self.adapters.push(adapter);
        if let Some(pattern) = url_pattern {
            self.routes.push(Route {
                pattern,
                adapter: name,
            });
        }
    }

    pub fn set_default(&mut self, name: &str) -> std::result::Result<(), DirectoryError> {
        self.get(name)?;
        self.default_adapter = name.to_string();
        Ok(())
    }

    pub fn get(&self, name: &str) -> std::result::Result<Arc<dyn DirectoryAdapter>, DirectoryError> {
        self.adapters
            .iter()
            .find(|adapter| adapter.name() == name)
            .cloned()
            .ok_or_else(|| DirectoryError::UnknownAdapter {
                name: name.to_string(),
            })
    }

    pub fn resolve(&self, directory_url: &str) -> std::result::Result<Arc<dyn DirectoryAdapter>, DirectoryError> {
        let name = self
            .routes
            .iter()
            .find(|route| route.pattern.is_match(directory_url))
            .map(|route| route.adapter.as_str())
            .unwrap_or(self.default_adapter.as_str());

        tracing::debug!("Directory {} handled by adapter '{}'", directory_url, name);
        self.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|adapter| adapter.name()).collect()
    }

    /// Builds the built-in `faculty-cards` adapter plus every configured site.
    pub fn from_config(config: &MatcherConfig) -> Result<Self> {
        let renderer: Arc<dyn PageRenderer> = Arc::new(HttpPageRenderer::new(
            Duration::from_secs(config.directory.fetch_timeout_seconds),
            config.directory.user_agent.clone(),
        ));

        let builtin = CardDirectoryAdapter::new(FACULTY_CARDS_KIND, &CardLayout::default(), renderer.clone())?;
        let mut registry = Self::new(Arc::new(builtin));

        for site in &config.adapters {
            let adapter = CardDirectoryAdapter::new(site.name.clone(), &site.layout, renderer.clone())?;
            let pattern = site
                .url_pattern
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|e| MatcherError::InvalidConfigValue {
                    field: format!("adapters.{}.url_pattern", site.name),
                    value: site.url_pattern.clone().unwrap_or_default(),
                    reason: e.to_string(),
                })?;
            registry.register(Arc::new(adapter), pattern);
        }

        registry.set_default(&config.directory.default_adapter)?;
        Ok(registry)
    }
}
