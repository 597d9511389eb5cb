//! Variant Registry
//!
//! Normalizes resolver outputs into a single ordered, deduplicated list of
//! stream variants and tracks which one is active. Merge order encodes
//! resolver priority (primary before secondary), not stream quality.

use crate::{Error, Result, SourceDescriptor, StreamVariant};
use std::collections::HashSet;
use tracing::debug;

/// Ordered, deduplicated stream variants plus the active selection
#[derive(Debug, Clone)]
pub struct VariantRegistry {
    variants: Vec<StreamVariant>,
    active: usize,
}

impl VariantRegistry {
    /// Build a registry from resolver outputs, one batch per resolver in
    /// priority order.
    ///
    /// Descriptors with empty URLs are dropped; duplicate URLs keep the
    /// first occurrence. The default active variant is the persisted
    /// preference when in range, else the first English-labelled variant,
    /// else the first in merge order. Fails with
    /// [`Error::NoVariantsAvailable`] when nothing usable remains.
    pub fn build(
        batches: &[Vec<SourceDescriptor>],
        preferred_index: Option<usize>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut variants = Vec::new();

        for batch in batches {
            for descriptor in batch {
                if descriptor.url.is_empty() {
                    continue;
                }
                if !seen.insert(descriptor.url.clone()) {
                    debug!(url = %descriptor.url, "Dropping duplicate variant");
                    continue;
                }
                variants.push(StreamVariant {
                    index: variants.len(),
                    language: descriptor.language.clone().unwrap_or_default(),
                    url: descriptor.url.clone(),
                    headers: descriptor.headers.clone(),
                    source_tag: descriptor.source_tag.clone(),
                });
            }
        }

        if variants.is_empty() {
            return Err(Error::NoVariantsAvailable);
        }

        let active = Self::default_index(&variants, preferred_index);
        debug!(
            variants = variants.len(),
            active, "Variant registry built"
        );

        Ok(Self { variants, active })
    }

    fn default_index(variants: &[StreamVariant], preferred: Option<usize>) -> usize {
        if let Some(idx) = preferred {
            if idx < variants.len() {
                return idx;
            }
        }
        variants
            .iter()
            .position(|v| v.language.to_lowercase().contains("english"))
            .unwrap_or(0)
    }

    /// All variants in merge order
    pub fn variants(&self) -> &[StreamVariant] {
        &self.variants
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// More than one resolvable variant: the UI builds a variant menu
    /// instead of an embedded audio-track menu.
    pub fn is_multi_variant(&self) -> bool {
        self.variants.len() > 1
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &StreamVariant {
        &self.variants[self.active]
    }

    pub fn get(&self, index: usize) -> Option<&StreamVariant> {
        self.variants.get(index)
    }

    /// Update the active selection; only explicit switches and persisted
    /// preference restores go through here.
    pub fn select(&mut self, index: usize) -> Result<&StreamVariant> {
        if index >= self.variants.len() {
            return Err(Error::VariantOutOfRange {
                index,
                len: self.variants.len(),
            });
        }
        self.active = index;
        Ok(&self.variants[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn descriptor(url: &str, language: Option<&str>, tag: &str) -> SourceDescriptor {
        SourceDescriptor {
            url: url.to_string(),
            language: language.map(str::to_string),
            headers: HashMap::new(),
            source_tag: tag.to_string(),
        }
    }

    #[test]
    fn merge_preserves_first_seen_order_and_dedupes() {
        let primary = vec![
            descriptor("https://a/1.m3u8", Some("Hindi"), "a"),
            descriptor("https://a/2.m3u8", Some("Tamil"), "a"),
        ];
        let secondary = vec![
            // Same URL, different label: first occurrence wins
            descriptor("https://a/2.m3u8", Some("Telugu"), "b"),
            descriptor("https://b/1.m3u8", Some("Hindi"), "b"),
        ];

        let registry = VariantRegistry::build(&[primary, secondary], None).unwrap();
        let urls: Vec<_> = registry.variants().iter().map(|v| v.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://a/1.m3u8", "https://a/2.m3u8", "https://b/1.m3u8"]
        );
        assert_eq!(registry.variants()[1].language, "Tamil");
        assert_eq!(registry.variants()[1].source_tag, "a");
    }

    #[test]
    fn default_prefers_english_label() {
        let primary = vec![descriptor("a1", Some("English"), "a")];
        let secondary = vec![descriptor("b1", Some("Spanish"), "b")];

        let registry = VariantRegistry::build(&[primary, secondary], None).unwrap();
        assert_eq!(registry.active_index(), 0);
        assert_eq!(registry.active().language, "English");

        // English in a later slot still wins over merge order
        let primary = vec![descriptor("a1", Some("Spanish"), "a")];
        let secondary = vec![descriptor("b1", Some("english (US)"), "b")];
        let registry = VariantRegistry::build(&[primary, secondary], None).unwrap();
        assert_eq!(registry.active_index(), 1);
    }

    #[test]
    fn persisted_preference_overrides_language_heuristic() {
        let batch = vec![
            descriptor("a1", Some("English"), "a"),
            descriptor("a2", Some("French"), "a"),
        ];
        let registry = VariantRegistry::build(&[batch], Some(1)).unwrap();
        assert_eq!(registry.active_index(), 1);
    }

    #[test]
    fn out_of_range_preference_falls_back() {
        let batch = vec![
            descriptor("a1", Some("French"), "a"),
            descriptor("a2", Some("English"), "a"),
        ];
        let registry = VariantRegistry::build(&[batch], Some(9)).unwrap();
        assert_eq!(registry.active_index(), 1);
    }

    #[test]
    fn empty_urls_are_unusable() {
        let batch = vec![descriptor("", Some("English"), "a")];
        assert!(matches!(
            VariantRegistry::build(&[batch], None),
            Err(Error::NoVariantsAvailable)
        ));
        assert!(matches!(
            VariantRegistry::build(&[], None),
            Err(Error::NoVariantsAvailable)
        ));
    }

    #[test]
    fn select_validates_range() {
        let batch = vec![descriptor("a1", None, "a")];
        let mut registry = VariantRegistry::build(&[batch], None).unwrap();
        assert!(registry.select(0).is_ok());
        assert!(matches!(
            registry.select(3),
            Err(Error::VariantOutOfRange { index: 3, len: 1 })
        ));
    }
}
