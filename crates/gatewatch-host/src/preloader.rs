//! Preloader registration and URL matching.

use crate::{HostError, PageAttachment, PageContext, Result};
use dashmap::DashMap;
use regex::Regex;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Per-page behavior a plugin registers for matching URLs.
pub trait Preloader: Send + Sync {
    /// Called once per matching page, after its initial content load.
    fn attach(&self, ctx: PageContext) -> Result<PageAttachment>;
}

/// A preloader plus the URL patterns it applies to.
#[derive(Clone)]
pub struct PreloaderSpec {
    /// Regex patterns matched against the full page URL.
    pub url_patterns: Vec<String>,
    /// The attach handler.
    pub preloader: Arc<dyn Preloader>,
}

struct RegisteredPreloader {
    patterns: Vec<Regex>,
    preloader: Arc<dyn Preloader>,
}

/// Registered preloaders, keyed by registration id.
pub struct PreloaderRegistry {
    preloaders: DashMap<Uuid, RegisteredPreloader>,
}

impl PreloaderRegistry {
    pub fn new() -> Self {
        Self {
            preloaders: DashMap::new(),
        }
    }

    /// Registers a preloader; patterns are compiled eagerly.
    pub fn add(&self, spec: PreloaderSpec) -> Result<Uuid> {
        let mut patterns = Vec::with_capacity(spec.url_patterns.len());
        for pattern in &spec.url_patterns {
            patterns.push(Regex::new(pattern)?);
        }

        let id = Uuid::new_v4();
        info!(
            target: "gatewatch::host",
            "Registered preloader {} ({} pattern(s))",
            id,
            patterns.len()
        );
        self.preloaders.insert(
            id,
            RegisteredPreloader {
                patterns,
                preloader: spec.preloader,
            },
        );
        Ok(id)
    }

    pub fn remove(&self, id: Uuid) -> Result<()> {
        self.preloaders
            .remove(&id)
            .ok_or(HostError::PreloaderNotFound(id))?;
        info!(target: "gatewatch::host", "Removed preloader {}", id);
        Ok(())
    }

    /// Preloaders whose patterns match the URL.
    pub fn matching(&self, url: &str) -> Vec<Arc<dyn Preloader>> {
        self.preloaders
            .iter()
            .filter(|e| e.patterns.iter().any(|p| p.is_match(url)))
            .map(|e| e.preloader.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.preloaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preloaders.is_empty()
    }
}

impl Default for PreloaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopPreloader;

    impl Preloader for NoopPreloader {
        fn attach(&self, _ctx: PageContext) -> Result<PageAttachment> {
            Ok(PageAttachment::empty())
        }
    }

    fn spec(patterns: &[&str]) -> PreloaderSpec {
        PreloaderSpec {
            url_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            preloader: Arc::new(NoopPreloader),
        }
    }

    #[test]
    fn test_matching_by_url_pattern() {
        let registry = PreloaderRegistry::new();
        registry.add(spec(&[r"^https://seatgeek\.com"])).unwrap();

        assert_eq!(registry.matching("https://seatgeek.com/some/event").len(), 1);
        assert_eq!(registry.matching("https://example.com").len(), 0);
        // Anchored at the start: a lookalike path does not match.
        assert_eq!(
            registry
                .matching("https://evil.example/https://seatgeek.com")
                .len(),
            0
        );
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let registry = PreloaderRegistry::new();
        let err = registry.add(spec(&["["])).unwrap_err();
        assert!(matches!(err, HostError::InvalidUrlPattern(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unregisters() {
        let registry = PreloaderRegistry::new();
        let id = registry.add(spec(&["seatgeek"])).unwrap();
        assert_eq!(registry.len(), 1);

        registry.remove(id).unwrap();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.remove(id).unwrap_err(),
            HostError::PreloaderNotFound(_)
        ));
    }
}
