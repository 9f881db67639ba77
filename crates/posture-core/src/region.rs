//! Regional applicability gate for plugins

use crate::error::Result;
use crate::traits::Applicability;

/// Region label that designates global-scope checks
pub const GLOBAL_REGION: &str = "global";

/// Directory of regions a provider currently offers
pub trait RegionDirectory: Send + Sync {
    fn regions(&self) -> Result<Vec<String>>;
}

/// Fixed region list
#[derive(Debug, Clone, Default)]
pub struct StaticRegionDirectory {
    regions: Vec<String>,
}

impl StaticRegionDirectory {
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
        }
    }

    /// Google Cloud regions
    pub fn gcp() -> Self {
        Self::new([
            "asia-east1",
            "asia-east2",
            "asia-northeast1",
            "asia-northeast2",
            "asia-northeast3",
            "asia-south1",
            "asia-south2",
            "asia-southeast1",
            "asia-southeast2",
            "australia-southeast1",
            "australia-southeast2",
            "europe-central2",
            "europe-north1",
            "europe-southwest1",
            "europe-west1",
            "europe-west2",
            "europe-west3",
            "europe-west4",
            "europe-west6",
            "europe-west8",
            "europe-west9",
            "northamerica-northeast1",
            "northamerica-northeast2",
            "southamerica-east1",
            "southamerica-west1",
            "us-central1",
            "us-east1",
            "us-east4",
            "us-east5",
            "us-south1",
            "us-west1",
            "us-west2",
            "us-west3",
            "us-west4",
        ])
    }
}

impl RegionDirectory for StaticRegionDirectory {
    fn regions(&self) -> Result<Vec<String>> {
        Ok(self.regions.clone())
    }
}

/// Target region of a plugin instance and whether it only runs globally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionScope {
    pub region: String,
    pub global_only: bool,
}

impl RegionScope {
    pub fn new(region: impl Into<String>, global_only: bool) -> Self {
        Self {
            region: region.into(),
            global_only,
        }
    }

    pub fn is_global(&self) -> bool {
        self.region == GLOBAL_REGION
    }

    /// Decide whether a plugin with this scope should run.
    ///
    /// Global-only plugins run only for the global region. Regional plugins
    /// run only for regions the directory lists; the directory is not
    /// consulted for global-only plugins.
    pub fn check(&self, directory: &dyn RegionDirectory) -> Result<Applicability> {
        if self.global_only {
            return Ok(if self.is_global() {
                Applicability::Applicable
            } else {
                Applicability::NotApplicable(format!(
                    "global-only plugin skipped for region {}",
                    self.region
                ))
            });
        }

        if self.is_global() {
            return Ok(Applicability::NotApplicable(
                "regional plugin skipped for the global region".to_string(),
            ));
        }

        let regions = directory.regions()?;
        if regions.iter().any(|r| r == &self.region) {
            Ok(Applicability::Applicable)
        } else {
            Ok(Applicability::NotApplicable(format!(
                "region {} is not offered by the provider",
                self.region
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PostureError;

    struct FailingDirectory;

    impl RegionDirectory for FailingDirectory {
        fn regions(&self) -> Result<Vec<String>> {
            Err(PostureError::Region("directory unavailable".to_string()))
        }
    }

    #[test]
    fn test_regional_plugin_in_listed_region() {
        let scope = RegionScope::new("us-east1", false);
        let result = scope.check(&StaticRegionDirectory::gcp()).unwrap();
        assert_eq!(result, Applicability::Applicable);
    }

    #[test]
    fn test_regional_plugin_in_unknown_region() {
        let scope = RegionScope::new("mars-north1", false);
        let result = scope.check(&StaticRegionDirectory::gcp()).unwrap();
        assert!(!result.is_applicable());
    }

    #[test]
    fn test_regional_plugin_skips_global() {
        let scope = RegionScope::new(GLOBAL_REGION, false);
        assert!(!scope.check(&StaticRegionDirectory::gcp()).unwrap().is_applicable());
    }

    #[test]
    fn test_global_only_plugin() {
        let directory = FailingDirectory;
        assert!(RegionScope::new(GLOBAL_REGION, true)
            .check(&directory)
            .unwrap()
            .is_applicable());
        assert!(!RegionScope::new("us-east1", true)
            .check(&directory)
            .unwrap()
            .is_applicable());
    }

    #[test]
    fn test_directory_failure_propagates() {
        let scope = RegionScope::new("us-east1", false);
        assert!(matches!(
            scope.check(&FailingDirectory),
            Err(PostureError::Region(_))
        ));
    }
}
