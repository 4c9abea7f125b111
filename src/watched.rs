use alloy_primitives::Address;
use std::collections::BTreeSet;

/// Curve contracts whose purchase events are scanned. Ordered so the address
/// list sent in each log query is stable from block to block.
#[derive(Debug, Default, Clone)]
pub struct WatchedAddresses {
    curves: BTreeSet<Address>,
}

impl WatchedAddresses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, curve: Address) -> bool {
        self.curves.insert(curve)
    }

    pub fn contains(&self, curve: &Address) -> bool {
        self.curves.contains(curve)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// The watched set plus `extra`, deduplicated and ordered.
    pub fn query_addresses(&self, extra: &[Address]) -> Vec<Address> {
        let mut addresses = self.curves.clone();
        addresses.extend(extra.iter().copied());
        addresses.into_iter().collect()
    }
}

impl FromIterator<Address> for WatchedAddresses {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            curves: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn query_addresses_merges_without_mutating() {
        let a = address!("0x00000000000000000000000000000000000000aa");
        let b = address!("0x00000000000000000000000000000000000000bb");
        let watched: WatchedAddresses = [b].into_iter().collect();

        assert_eq!(watched.query_addresses(&[a, b]), vec![a, b]);
        assert_eq!(watched.len(), 1);
        assert!(!watched.contains(&a));
    }

    #[test]
    fn insert_reports_new_addresses_only() {
        let a = address!("0x00000000000000000000000000000000000000aa");
        let mut watched = WatchedAddresses::new();
        assert!(watched.is_empty());
        assert!(watched.insert(a));
        assert!(!watched.insert(a));
    }
}
