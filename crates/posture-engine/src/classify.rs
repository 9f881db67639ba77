//! Compliance framework classification of findings

use posture_core::Classifications;

/// Frameworks every event carries a (possibly empty) tag for
pub const FRAMEWORKS: [&str; 6] = ["HIPAA", "PCI-DSS", "SOC2", "ISO", "CIS", "NIST"];

/// Maps a test name to compliance framework tags
pub trait Classifier: Send + Sync {
    fn classify(&self, test_name: &str) -> Classifications;
}

impl<F> Classifier for F
where
    F: Fn(&str) -> Classifications + Send + Sync,
{
    fn classify(&self, test_name: &str) -> Classifications {
        self(test_name)
    }
}

/// Placeholder heuristic keyed on test-name length.
///
/// Each framework owns a half-open band of lengths; the bands do not overlap,
/// so every test name is tagged for exactly one framework. The tag reads
/// `<length of first '_' segment>.<total length>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthBandClassifier;

impl LengthBandClassifier {
    const BANDS: [(usize, usize); 6] = [
        (0, 23),
        (23, 32),
        (32, 39),
        (39, 42),
        (42, 49),
        (49, usize::MAX),
    ];
}

impl Classifier for LengthBandClassifier {
    fn classify(&self, test_name: &str) -> Classifications {
        let length = test_name.chars().count();
        let first_part = test_name
            .split('_')
            .next()
            .map(|p| p.chars().count())
            .unwrap_or(0);
        let tag = format!("{}.{}", first_part, length);

        FRAMEWORKS
            .iter()
            .zip(Self::BANDS)
            .map(|(framework, (low, high))| {
                let value = if (low..high).contains(&length) {
                    tag.clone()
                } else {
                    String::new()
                };
                (framework.to_string(), value)
            })
            .collect()
    }
}

/// Emits every framework with an empty tag
#[derive(Debug, Clone, Copy, Default)]
pub struct UnclassifiedClassifier;

impl Classifier for UnclassifiedClassifier {
    fn classify(&self, _test_name: &str) -> Classifications {
        FRAMEWORKS
            .iter()
            .map(|f| (f.to_string(), String::new()))
            .collect()
    }
}
