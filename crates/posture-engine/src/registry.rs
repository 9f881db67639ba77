//! Plugin registry

use posture_core::{Plugin, PluginFactory, Result};
use tracing::{info, warn};

/// A named factory producing one plugin instance per run
pub struct PluginRegistration {
    name: String,
    factory: PluginFactory,
}

impl PluginRegistration {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Plugin>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(factory),
        }
    }

    /// Register a plugin type that builds with `Default`
    pub fn of<P>(name: impl Into<String>) -> Self
    where
        P: Plugin + Default + 'static,
    {
        Self::new(name, || Ok(Box::new(P::default()) as Box<dyn Plugin>))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a fresh plugin instance
    pub fn instantiate(&self) -> Result<Box<dyn Plugin>> {
        (self.factory)()
    }
}

impl std::fmt::Debug for PluginRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistration")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered set of plugin factories, fixed for the lifetime of the process
#[derive(Debug, Default)]
pub struct PluginRegistry {
    registrations: Vec<PluginRegistration>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin. Registrations are never deduplicated.
    pub fn register(&mut self, registration: PluginRegistration) {
        self.registrations.push(registration);
    }

    /// Register every candidate that loaded; failed candidates are logged and left out.
    ///
    /// Returns the number of candidates that were skipped.
    pub fn register_candidates<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = Result<PluginRegistration>>,
    {
        let mut skipped = 0;
        for candidate in candidates {
            match candidate {
                Ok(registration) => self.register(registration),
                Err(e) => {
                    warn!("Plugin failed to load and was not registered: {}", e);
                    skipped += 1;
                }
            }
        }
        info!(
            "Registered {} plugins ({} failed to load)",
            self.registrations.len(),
            skipped
        );
        skipped
    }

    pub fn registrations(&self) -> &[PluginRegistration] {
        &self.registrations
    }

    pub fn names(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posture_core::{PluginOutput, PostureError};

    #[derive(Default)]
    struct Dns;

    impl Plugin for Dns {
        fn provider(&self) -> &str {
            "gcp"
        }

        fn service(&self) -> &str {
            "dns"
        }

        fn run(&mut self) -> Result<Option<PluginOutput>> {
            Ok(Some(PluginOutput::from(Vec::new())))
        }
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = PluginRegistry::new();
        registry.register(PluginRegistration::of::<Dns>("vpc"));
        registry.register(PluginRegistration::of::<Dns>("dns"));
        registry.register(PluginRegistration::of::<Dns>("iam"));
        assert_eq!(registry.names(), vec!["vpc", "dns", "iam"]);
    }

    #[test]
    fn test_duplicates_are_independent_entries() {
        let mut registry = PluginRegistry::new();
        registry.register(PluginRegistration::of::<Dns>("dns"));
        registry.register(PluginRegistration::of::<Dns>("dns"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_failed_candidates_do_not_block_others() {
        let mut registry = PluginRegistry::new();
        let skipped = registry.register_candidates(vec![
            Ok(PluginRegistration::of::<Dns>("dns")),
            Err(PostureError::plugin("gke", "missing dependency")),
            Ok(PluginRegistration::of::<Dns>("kms")),
        ]);
        assert_eq!(skipped, 1);
        assert_eq!(registry.names(), vec!["dns", "kms"]);
    }

    #[test]
    fn test_each_instantiation_is_fresh() {
        let registration = PluginRegistration::of::<Dns>("dns");
        let a = registration.instantiate().unwrap();
        let b = registration.instantiate().unwrap();
        assert_eq!(a.service(), b.service());
    }
}
