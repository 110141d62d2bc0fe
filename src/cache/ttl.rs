//! TTL Policy Module
//!
//! Fixed time-to-live per entity kind. TTL depends on the kind only, never
//! on payload content.

use std::time::Duration;

use crate::cache::EntityKind;
use crate::error::{CacheError, Result};

/// Default profile TTL in seconds
pub const DEFAULT_PROFILE_TTL: u64 = 3600;
/// Default category list TTL in seconds
pub const DEFAULT_CATEGORIES_TTL: u64 = 1800;
/// Default product page TTL in seconds
pub const DEFAULT_PRODUCTS_TTL: u64 = 600;
/// Default review page TTL in seconds
pub const DEFAULT_REVIEWS_TTL: u64 = 600;

// == TTL Policy ==
/// Time-to-live table, one duration per [`EntityKind`].
///
/// Ordering is enforced at construction: profile >= categories >= products,
/// and categories >= reviews. Profiles change least often upstream and
/// listings most often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    profile: Duration,
    categories: Duration,
    products: Duration,
    reviews: Duration,
}

impl TtlPolicy {
    // == Constructor ==
    /// Creates a policy, rejecting zero TTLs and broken ordering.
    pub fn new(
        profile: Duration,
        categories: Duration,
        products: Duration,
        reviews: Duration,
    ) -> Result<Self> {
        if [profile, categories, products, reviews].contains(&Duration::ZERO) {
            return Err(CacheError::InvalidRequest(
                "TTL values must be greater than zero".to_string(),
            ));
        }
        if profile < categories || categories < products || categories < reviews {
            return Err(CacheError::InvalidRequest(format!(
                "TTL ordering violated: profile={}s categories={}s products={}s reviews={}s",
                profile.as_secs(),
                categories.as_secs(),
                products.as_secs(),
                reviews.as_secs()
            )));
        }

        Ok(Self {
            profile,
            categories,
            products,
            reviews,
        })
    }

    /// Creates a policy from whole seconds.
    pub fn from_secs(profile: u64, categories: u64, products: u64, reviews: u64) -> Result<Self> {
        Self::new(
            Duration::from_secs(profile),
            Duration::from_secs(categories),
            Duration::from_secs(products),
            Duration::from_secs(reviews),
        )
    }

    // == Lookup ==
    /// Returns the TTL for `kind`.
    pub fn ttl(&self, kind: EntityKind) -> Duration {
        match kind {
            EntityKind::Profile => self.profile,
            EntityKind::Categories => self.categories,
            EntityKind::Products => self.products,
            EntityKind::Reviews => self.reviews,
        }
    }

    /// TTL for `kind` in milliseconds, as used by entry timestamps.
    pub fn ttl_ms(&self, kind: EntityKind) -> u64 {
        self.ttl(kind).as_millis() as u64
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            profile: Duration::from_secs(DEFAULT_PROFILE_TTL),
            categories: Duration::from_secs(DEFAULT_CATEGORIES_TTL),
            products: Duration::from_secs(DEFAULT_PRODUCTS_TTL),
            reviews: Duration::from_secs(DEFAULT_REVIEWS_TTL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ordering() {
        let policy = TtlPolicy::default();
        assert!(policy.ttl(EntityKind::Profile) >= policy.ttl(EntityKind::Categories));
        assert!(policy.ttl(EntityKind::Categories) >= policy.ttl(EntityKind::Products));
        assert!(policy.ttl(EntityKind::Categories) >= policy.ttl(EntityKind::Reviews));
    }

    #[test]
    fn test_default_is_valid_policy() {
        let policy = TtlPolicy::from_secs(
            DEFAULT_PROFILE_TTL,
            DEFAULT_CATEGORIES_TTL,
            DEFAULT_PRODUCTS_TTL,
            DEFAULT_REVIEWS_TTL,
        )
        .unwrap();
        assert_eq!(policy, TtlPolicy::default());
    }

    #[test]
    fn test_rejects_zero() {
        let result = TtlPolicy::from_secs(60, 30, 0, 10);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_rejects_inverted_ordering() {
        assert!(TtlPolicy::from_secs(10, 60, 5, 5).is_err());
        assert!(TtlPolicy::from_secs(60, 30, 45, 5).is_err());
        assert!(TtlPolicy::from_secs(60, 30, 5, 45).is_err());
    }

    #[test]
    fn test_ttl_ms() {
        let policy = TtlPolicy::from_secs(4, 3, 2, 1).unwrap();
        assert_eq!(policy.ttl_ms(EntityKind::Profile), 4_000);
        assert_eq!(policy.ttl_ms(EntityKind::Reviews), 1_000);
    }
}
