use crate::types::Site;
use std::collections::HashSet;

/// Set of URLs already reported for one job.
#[derive(Debug, Default, Clone)]
pub struct SiteDeduplicator {
    seen: HashSet<String>,
}

impl SiteDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a site's URL is offered, `false` afterwards.
    pub fn is_new(&mut self, site: &Site) -> bool {
        self.seen.insert(site.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting_is_new() {
        let mut dedup = SiteDeduplicator::new();
        assert!(dedup.is_new(&Site::new("Rust", "https://rust-lang.org")));
        assert!(!dedup.is_new(&Site::new("Rust", "https://rust-lang.org")));
    }

    #[test]
    fn test_same_url_different_title_is_duplicate() {
        let mut dedup = SiteDeduplicator::new();
        assert!(dedup.is_new(&Site::new("Rust", "https://rust-lang.org")));
        assert!(!dedup.is_new(&Site::new("Rust Language", "https://rust-lang.org")));
    }

    #[test]
    fn test_distinct_urls_are_tracked_independently() {
        let mut dedup = SiteDeduplicator::new();
        assert!(dedup.is_new(&Site::new("A", "https://a.example")));
        assert!(dedup.is_new(&Site::new("B", "https://b.example")));
        assert!(!dedup.is_new(&Site::new("A", "https://a.example")));
        assert!(dedup.is_new(&Site::new("C", "https://c.example")));
    }
}
