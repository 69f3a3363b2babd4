//! Label normalization: exclusion, consolidation, and optional translation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use auris_core::config::AggregationConfig;

use crate::tables;

/// Immutable lookup tables backing a [`Normalizer`].
///
/// Built once at startup from the built-ins plus configuration, then shared
/// read-only across every run via `Arc`.
#[derive(Debug, Default)]
pub struct NormalizerTables {
    excluded: HashSet<String>,
    consolidation: HashMap<String, String>,
    translation: HashMap<String, String>,
}

impl NormalizerTables {
    /// Merge the built-in tables with configured extensions. Configured
    /// consolidation entries win over built-ins for the same raw label.
    pub fn from_config(config: &AggregationConfig) -> Self {
        let mut excluded: HashSet<String> = tables::BUILTIN_EXCLUDED
            .iter()
            .map(|s| s.to_string())
            .collect();
        excluded.extend(config.excluded_events.iter().cloned());

        let mut consolidation: HashMap<String, String> = tables::BUILTIN_CONSOLIDATION
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        for (from, to) in &config.consolidation {
            consolidation.insert(from.clone(), to.clone());
        }

        let translation = tables::BUILTIN_TRANSLATION
            .iter()
            .map(|(label, display)| (label.to_string(), display.to_string()))
            .collect();

        Self {
            excluded,
            consolidation,
            translation,
        }
    }

    /// Empty tables: every label passes through untouched. For tests.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_excluded(&self, label: &str) -> bool {
        self.excluded.contains(label)
    }

    pub fn consolidate<'a>(&'a self, label: &'a str) -> &'a str {
        self.consolidation
            .get(label)
            .map(String::as_str)
            .unwrap_or(label)
    }

    pub fn translate<'a>(&'a self, label: &'a str) -> &'a str {
        self.translation
            .get(label)
            .map(String::as_str)
            .unwrap_or(label)
    }
}

/// Pure function from raw detector labels to canonical display labels.
#[derive(Debug, Clone)]
pub struct Normalizer {
    tables: Arc<NormalizerTables>,
    translate: bool,
}

impl Normalizer {
    pub fn new(tables: Arc<NormalizerTables>, translate: bool) -> Self {
        Self { tables, translate }
    }

    /// Build a normalizer directly from configuration.
    pub fn from_config(config: &AggregationConfig) -> Self {
        Self::new(
            Arc::new(NormalizerTables::from_config(config)),
            config.translate,
        )
    }

    /// Normalize one raw label.
    ///
    /// Returns `None` when the label is excluded; otherwise the consolidated
    /// and (if enabled) translated form. Translation runs after
    /// consolidation so consolidated canonical labels are themselves
    /// translatable.
    pub fn normalize(&self, raw_label: &str) -> Option<String> {
        if self.tables.is_excluded(raw_label) {
            return None;
        }
        let canonical = self.tables.consolidate(raw_label);
        if self.translate {
            Some(self.tables.translate(canonical).to_string())
        } else {
            Some(canonical.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auris_core::config::AggregationConfig;

    fn default_normalizer(translate: bool) -> Normalizer {
        Normalizer::new(
            Arc::new(NormalizerTables::from_config(&AggregationConfig::default())),
            translate,
        )
    }

    #[test]
    fn test_excluded_label_is_dropped() {
        let n = default_normalizer(false);
        assert_eq!(n.normalize("Silence"), None);
        assert_eq!(n.normalize("White noise"), None);
    }

    #[test]
    fn test_consolidation_maps_to_canonical() {
        let n = default_normalizer(false);
        assert_eq!(n.normalize("Water tap, faucet"), Some("Water".to_string()));
        assert_eq!(n.normalize("Pour"), Some("Water".to_string()));
        assert_eq!(n.normalize("Conversation"), Some("Speech".to_string()));
    }

    #[test]
    fn test_unknown_label_passes_through() {
        let n = default_normalizer(false);
        assert_eq!(n.normalize("Theremin"), Some("Theremin".to_string()));
    }

    #[test]
    fn test_translation_runs_after_consolidation() {
        let n = default_normalizer(true);
        // "Pour" consolidates to "Water", which then translates.
        assert_eq!(n.normalize("Pour"), Some("水の音".to_string()));
        assert_eq!(n.normalize("Speech"), Some("会話・発話".to_string()));
    }

    #[test]
    fn test_untranslatable_label_passes_through_with_translation_on() {
        let n = default_normalizer(true);
        assert_eq!(n.normalize("Theremin"), Some("Theremin".to_string()));
    }

    #[test]
    fn test_normalize_is_idempotent_on_canonical_forms() {
        let n = default_normalizer(true);
        for raw in ["Pour", "Conversation", "Cough", "Theremin"] {
            let once = n.normalize(raw).unwrap();
            let twice = n.normalize(&once).unwrap();
            assert_eq!(once, twice, "normalize not idempotent for {}", raw);
        }
    }

    #[test]
    fn test_config_extends_builtin_tables() {
        let mut config = AggregationConfig::default();
        config.excluded_events.push("Theremin".to_string());
        config
            .consolidation
            .insert("Clapping".to_string(), "Applause".to_string());

        let n = Normalizer::from_config(&AggregationConfig {
            translate: false,
            ..config
        });
        assert_eq!(n.normalize("Theremin"), None);
        assert_eq!(n.normalize("Clapping"), Some("Applause".to_string()));
        // Built-ins still apply.
        assert_eq!(n.normalize("Silence"), None);
    }

    #[test]
    fn test_empty_tables_pass_everything_through() {
        let n = Normalizer::new(Arc::new(NormalizerTables::empty()), true);
        assert_eq!(n.normalize("Silence"), Some("Silence".to_string()));
    }
}
