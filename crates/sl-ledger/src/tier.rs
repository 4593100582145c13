//! Read-only tier catalog, built once when the ledger is created

use std::collections::HashMap;

use sl_common::{SubscriptionTier, TierId};
use sl_config::TierConfig;

use crate::error::CatalogError;

#[derive(Debug, Clone, Default)]
pub struct TierCatalog {
    tiers: HashMap<TierId, SubscriptionTier>,
}

impl TierCatalog {
    /// Build a catalog, rejecting duplicate ids and non-positive prices or durations
    pub fn new<I>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (TierId, SubscriptionTier)>,
    {
        let mut tiers = HashMap::new();
        for (id, tier) in entries {
            if tier.price == 0 {
                return Err(CatalogError::InvalidPrice(id));
            }
            if tier.duration <= 0 {
                return Err(CatalogError::InvalidDuration(id));
            }
            if tiers.insert(id, tier).is_some() {
                return Err(CatalogError::DuplicateTier(id));
            }
        }
        Ok(Self { tiers })
    }

    pub fn from_config(tiers: &[TierConfig]) -> Result<Self, CatalogError> {
        Self::new(tiers.iter().map(|t| (t.id, t.to_tier())))
    }

    pub fn get(&self, id: TierId) -> Option<&SubscriptionTier> {
        self.tiers.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// All tiers ordered by id
    pub fn list(&self) -> Vec<(TierId, SubscriptionTier)> {
        let mut tiers: Vec<_> = self
            .tiers
            .iter()
            .map(|(id, tier)| (*id, tier.clone()))
            .collect();
        tiers.sort_by_key(|(id, _)| *id);
        tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_config::AppConfig;

    fn tier(price: u64, duration: i64) -> SubscriptionTier {
        SubscriptionTier {
            price,
            duration,
            benefits: "Plan".to_string(),
        }
    }

    #[test]
    fn test_default_config_catalog() {
        let catalog = TierCatalog::from_config(&AppConfig::default().tiers).unwrap();
        assert_eq!(catalog.len(), 2);
        let basic = catalog.get(1).unwrap();
        assert_eq!(basic.price, 100);
        assert_eq!(basic.duration, 2_592_000);
        assert_eq!(basic.benefits, "Basic Plan");
        assert!(catalog.get(99).is_none());
    }

    #[test]
    fn test_list_is_sorted() {
        let catalog = TierCatalog::new(vec![(5, tier(1, 1)), (2, tier(1, 1)), (9, tier(1, 1))]).unwrap();
        let ids: Vec<_> = catalog.list().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn test_rejects_invalid_entries() {
        assert_eq!(
            TierCatalog::new(vec![(1, tier(0, 10))]).unwrap_err(),
            CatalogError::InvalidPrice(1)
        );
        assert_eq!(
            TierCatalog::new(vec![(1, tier(10, 0))]).unwrap_err(),
            CatalogError::InvalidDuration(1)
        );
        assert_eq!(
            TierCatalog::new(vec![(1, tier(10, 10)), (1, tier(20, 20))]).unwrap_err(),
            CatalogError::DuplicateTier(1)
        );
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = TierCatalog::default();
        assert!(catalog.is_empty());
        assert!(catalog.list().is_empty());
    }
}
