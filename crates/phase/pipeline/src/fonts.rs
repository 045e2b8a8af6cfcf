use std::collections::HashMap;

pub type FontResolver = Box<dyn FnMut(&str) -> String + Send>;

/// Two-level font lookup: an explicit user mapping table consulted first,
/// then a cache over the host's nearest-family resolver.
pub struct FontCache {
    mappings: HashMap<String, String>,
    resolved: HashMap<String, String>,
    resolver: FontResolver,
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new(Box::new(|family| family.to_owned()))
    }
}

impl FontCache {
    pub fn new(resolver: FontResolver) -> Self {
        Self {
            mappings: HashMap::new(),
            resolved: HashMap::new(),
            resolver,
        }
    }

    pub fn resolve(&mut self, family: &str) -> String {
        if let Some(mapped) = self.mappings.get(family) {
            return mapped.clone();
        }
        if let Some(resolved) = self.resolved.get(family) {
            return resolved.clone();
        }
        let resolved = (self.resolver)(family);
        self.resolved.insert(family.to_owned(), resolved.clone());
        resolved
    }

    pub fn set_mapping(&mut self, family: &str, mapped: &str) {
        self.mappings.insert(family.to_owned(), mapped.to_owned());
    }

    pub fn reset_mappings(&mut self) {
        self.mappings.clear();
        self.resolved.clear();
    }

    pub fn mappings(&self) -> &HashMap<String, String> {
        &self.mappings
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn explicit_mapping__EXPECT__wins_over_resolver() {
        // Given
        let mut cache = FontCache::new(Box::new(|_| "Resolved".to_owned()));
        cache.set_mapping("Inter", "Helvetica");

        // When / Then
        assert_eq!("Helvetica", cache.resolve("Inter"));
        assert_eq!("Resolved", cache.resolve("Roboto"));
    }

    #[test]
    fn repeated_resolution__EXPECT__resolver_called_once_per_family() {
        // Given
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut cache = FontCache::new(Box::new(move |family| {
            counter.fetch_add(1, Ordering::SeqCst);
            family.to_owned()
        }));

        // When
        cache.resolve("Inter");
        cache.resolve("Inter");
        cache.resolve("Inter");

        // Then
        assert_eq!(1, calls.load(Ordering::SeqCst));
    }

    #[test]
    fn reset__EXPECT__drops_both_levels() {
        // Given
        let mut cache = FontCache::default();
        cache.set_mapping("Inter", "Helvetica");
        cache.resolve("Roboto");

        // When
        cache.reset_mappings();

        // Then
        assert!(cache.mappings().is_empty());
        assert_eq!("Inter", cache.resolve("Inter"));
    }
}
