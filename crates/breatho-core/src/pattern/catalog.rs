use std::collections::HashSet;
use std::sync::LazyLock;

use super::{BreathingPattern, ColorTag};
use crate::error::ValidationError;

static BUILTIN: LazyLock<PatternCatalog> = LazyLock::new(|| PatternCatalog {
    patterns: presets(),
});

fn presets() -> Vec<BreathingPattern> {
    vec![
        BreathingPattern::from_secs(
            "4-7-8",
            "4-7-8 Breathing",
            "A calming technique that helps reduce anxiety and promote sleep",
            [4, 7, 8, 0],
            ColorTag::Blue,
        ),
        BreathingPattern::from_secs(
            "box",
            "Box Breathing",
            "A simple technique to improve focus and reduce stress",
            [4, 4, 4, 4],
            ColorTag::Green,
        ),
        BreathingPattern::from_secs(
            "equal",
            "Equal Breathing",
            "Balanced breathing to calm the mind and body",
            [4, 0, 4, 0],
            ColorTag::Purple,
        ),
    ]
}

/// Ordered, read-only list of breathing patterns.
///
/// The built-in catalog holds the three presets. A catalog with user
/// patterns appended can be built once at startup; neither can be
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    patterns: Vec<BreathingPattern>,
}

impl PatternCatalog {
    /// The process-wide preset catalog.
    pub fn builtin() -> &'static PatternCatalog {
        &BUILTIN
    }

    /// Presets followed by `custom` patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if a custom pattern is invalid or reuses an id
    /// already in the catalog.
    pub fn with_custom(custom: &[BreathingPattern]) -> Result<Self, ValidationError> {
        let mut patterns = presets();
        let mut seen: HashSet<String> = patterns.iter().map(|p| p.id.to_lowercase()).collect();
        for pattern in custom {
            pattern.validate()?;
            if !seen.insert(pattern.id.to_lowercase()) {
                return Err(ValidationError::DuplicatePattern(pattern.id.clone()));
            }
            patterns.push(pattern.clone());
        }
        Ok(Self { patterns })
    }

    pub fn list(&self) -> &[BreathingPattern] {
        &self.patterns
    }

    /// The first entry; every catalog starts with the presets.
    pub fn default_pattern(&self) -> &BreathingPattern {
        &self.patterns[0]
    }

    /// Look up by id (case-insensitive) or by exact display name.
    pub fn get(&self, key: &str) -> Option<&BreathingPattern> {
        let key = key.trim();
        self.patterns
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(key))
            .or_else(|| self.patterns.iter().find(|p| p.name.eq_ignore_ascii_case(key)))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
