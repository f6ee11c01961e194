use std::collections::BTreeSet;

use press_types::ContentId;
use serde::{Deserialize, Serialize};

/// How the feed's id list is assembled from the registry and the local cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationPolicy {
    /// The registry listing, as is.
    #[default]
    ChainOnly,
    /// Registry ids that are cached locally, followed by cached ids the
    /// registry does not list. Falls back to cached ids alone when the
    /// registry cannot be listed.
    ChainPlusLocalAdditive,
}

impl ReconciliationPolicy {
    /// Merge a registry listing with the locally cached ids.
    ///
    /// Registry order is kept for the first part; local-only ids follow in
    /// key order.
    pub fn merge(self, chain: Vec<ContentId>, local: &BTreeSet<ContentId>) -> Vec<ContentId> {
        match self {
            Self::ChainOnly => chain,
            Self::ChainPlusLocalAdditive => {
                let listed: BTreeSet<ContentId> = chain.iter().copied().collect();
                let mut ids: Vec<ContentId> =
                    chain.into_iter().filter(|id| local.contains(id)).collect();
                ids.extend(local.iter().filter(|id| !listed.contains(id)).copied());
                ids
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> ContentId {
        ContentId::from_hash([n; 32])
    }

    #[test]
    fn chain_only_ignores_cache() {
        let local = [id(9)].into_iter().collect();
        let merged = ReconciliationPolicy::ChainOnly.merge(vec![id(3), id(1)], &local);
        assert_eq!(merged, vec![id(3), id(1)]);
    }

    #[test]
    fn additive_filters_chain_and_appends_local_only() {
        let local = [id(1), id(5), id(4)].into_iter().collect();
        let merged = ReconciliationPolicy::ChainPlusLocalAdditive
            .merge(vec![id(3), id(1), id(2)], &local);
        assert_eq!(merged, vec![id(1), id(4), id(5)]);
    }

    #[test]
    fn additive_with_empty_chain_is_local_keys() {
        let local = [id(2), id(1)].into_iter().collect();
        let merged = ReconciliationPolicy::ChainPlusLocalAdditive.merge(Vec::new(), &local);
        assert_eq!(merged, vec![id(1), id(2)]);
    }
}
