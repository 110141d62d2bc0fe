//! Entity Kind Module
//!
//! The four cached data shapes and the storage tables each one owns.

use std::fmt;

use serde::Serialize;

// == Entity Kind ==
/// One of the cached storefront data shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Store profile, stored under every alias of the store
    Profile,
    /// One page of the product listing
    Products,
    /// Consolidated category list
    Categories,
    /// One page of reviews with aggregate rating stats
    Reviews,
}

impl EntityKind {
    /// Every kind, in sweep order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Profile,
        EntityKind::Products,
        EntityKind::Categories,
        EntityKind::Reviews,
    ];

    /// Key prefix and primary table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Profile => "profile",
            EntityKind::Products => "products",
            EntityKind::Categories => "categories",
            EntityKind::Reviews => "reviews",
        }
    }

    /// Whether keys of this kind carry a page number.
    pub fn is_paginated(&self) -> bool {
        matches!(self, EntityKind::Products | EntityKind::Reviews)
    }

    /// Position in [`EntityKind::ALL`].
    pub(crate) fn index(&self) -> usize {
        match self {
            EntityKind::Profile => 0,
            EntityKind::Products => 1,
            EntityKind::Categories => 2,
            EntityKind::Reviews => 3,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, kind) in EntityKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_paginated_kinds() {
        assert!(EntityKind::Products.is_paginated());
        assert!(EntityKind::Reviews.is_paginated());
        assert!(!EntityKind::Profile.is_paginated());
        assert!(!EntityKind::Categories.is_paginated());
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&EntityKind::Categories).unwrap();
        assert_eq!(json, "\"categories\"");
    }
}
