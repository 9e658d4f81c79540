use std::collections::HashSet;
use std::sync::LazyLock;

use crate::version::VersionEpoch;

/// Standalone engine timeline. The last three releases are open-ended so any
/// point build observed for them maps onto the declared epoch.
pub static STANDALONE_EPOCHS: [VersionEpoch; 12] = [
    VersionEpoch::new(7, 0),
    VersionEpoch::new(8, 0),
    VersionEpoch::new(9, 0),
    VersionEpoch::new(10, 0),
    VersionEpoch::new(10, 50),
    VersionEpoch::new(11, 0),
    VersionEpoch::new(12, 0),
    VersionEpoch::new(13, 0),
    VersionEpoch::new(14, 0),
    VersionEpoch::open_ended(15, 0),
    VersionEpoch::open_ended(16, 0),
    VersionEpoch::open_ended(17, 0),
];

/// Cloud-hosted engine timeline.
pub static CLOUD_EPOCHS: [VersionEpoch; 3] = [
    VersionEpoch::new(10, 0),
    VersionEpoch::new(11, 0),
    VersionEpoch::open_ended(12, 0),
];

/// Cloud warehouse timeline. A single epoch for now; tables for it are still
/// built through the general path.
pub static WAREHOUSE_EPOCHS: [VersionEpoch; 1] = [VersionEpoch::open_ended(10, 0)];

/// Properties every introspectable class is assumed to have even without a
/// static declaration: identity name, schema qualifier, canonical path.
pub static IMPLICIT_PROPERTIES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut s = HashSet::new();
    s.insert("Name");
    s.insert("Schema");
    s.insert("Urn");
    s
});

pub fn is_structurally_implicit(name: &str) -> bool {
    IMPLICIT_PROPERTIES.contains(name)
}

/// Generator and table-dump format versions.
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const TABLE_FORMAT_VERSION: &str = "1.0";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{DeploymentFamily, EpochMask};

    #[test]
    fn timelines_are_strictly_increasing() {
        for family in DeploymentFamily::ALL {
            let epochs = family.epochs();
            assert!(!epochs.is_empty());
            assert!(epochs.len() <= EpochMask::CAPACITY);
            assert!(epochs.windows(2).all(|w| w[0] < w[1]), "{family}");
        }
    }

    #[test]
    fn last_epoch_is_open_ended() {
        for family in DeploymentFamily::ALL {
            assert!(family.epochs().last().unwrap().is_open_ended(), "{family}");
        }
    }

    #[test]
    fn implicit_names_are_case_sensitive() {
        assert!(is_structurally_implicit("Urn"));
        assert!(!is_structurally_implicit("urn"));
        assert!(!is_structurally_implicit("Owner"));
    }
}
