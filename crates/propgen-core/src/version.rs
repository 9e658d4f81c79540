use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalogs::{CLOUD_EPOCHS, STANDALONE_EPOCHS, WAREHOUSE_EPOCHS};

/// `major.minor` with an optional `.patch`; `max` or `*` marks an open-ended patch.
static RE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.(\d+)(?:\.(\d+|max|\*))?\s*$").unwrap());

// ---------------------------------------------------------------------------
// Version epochs
// ---------------------------------------------------------------------------

/// One release point on a deployment family's timeline.
///
/// Ordering is lexicographic on (major, minor, patch). The newest epochs of a
/// family carry [`VersionEpoch::PATCH_INFINITY`] so that every observed point
/// build of that release sorts at or below the declared epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionEpoch {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl VersionEpoch {
    pub const PATCH_INFINITY: u16 = u16::MAX;

    pub const fn new(major: u16, minor: u16) -> Self {
        Self {
            major,
            minor,
            patch: 0,
        }
    }

    pub const fn with_patch(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// An epoch whose patch level is "infinity".
    pub const fn open_ended(major: u16, minor: u16) -> Self {
        Self::with_patch(major, minor, Self::PATCH_INFINITY)
    }

    pub fn is_open_ended(&self) -> bool {
        self.patch == Self::PATCH_INFINITY
    }
}

impl fmt::Display for VersionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            0 => write!(f, "{}.{}", self.major, self.minor),
            Self::PATCH_INFINITY => write!(f, "{}.{}.max", self.major, self.minor),
            patch => write!(f, "{}.{}.{}", self.major, self.minor, patch),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version \"{0}\": expected major.minor[.patch]")]
pub struct ParseVersionError(pub String);

impl FromStr for VersionEpoch {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RE_VERSION
            .captures(s)
            .ok_or_else(|| ParseVersionError(s.to_string()))?;
        let number = |i: usize| -> Result<u16, ParseVersionError> {
            caps[i]
                .parse::<u16>()
                .map_err(|_| ParseVersionError(s.to_string()))
        };
        let major = number(1)?;
        let minor = number(2)?;
        let patch = match caps.get(3).map(|m| m.as_str()) {
            None => 0,
            Some("max") | Some("*") => Self::PATCH_INFINITY,
            Some(_) => number(3)?,
        };
        Ok(Self::with_patch(major, minor, patch))
    }
}

impl TryFrom<String> for VersionEpoch {
    type Error = ParseVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionEpoch> for String {
    fn from(value: VersionEpoch) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Deployment families
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineType {
    Standalone,
    Cloud,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineEdition {
    Unknown,
    Warehouse,
}

/// An independently versioned target environment.
///
/// Families never share registries or indices; each owns the epoch list
/// returned by [`DeploymentFamily::epochs`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentFamily {
    Standalone,
    Cloud,
    CloudWarehouse,
}

impl DeploymentFamily {
    /// Families in generation order. Earlier families take precedence when a
    /// property is exposed by more than one.
    pub const ALL: [DeploymentFamily; 3] = [
        DeploymentFamily::Standalone,
        DeploymentFamily::Cloud,
        DeploymentFamily::CloudWarehouse,
    ];

    pub fn epochs(self) -> &'static [VersionEpoch] {
        match self {
            DeploymentFamily::Standalone => &STANDALONE_EPOCHS,
            DeploymentFamily::Cloud => &CLOUD_EPOCHS,
            DeploymentFamily::CloudWarehouse => &WAREHOUSE_EPOCHS,
        }
    }

    pub fn engine_type(self) -> EngineType {
        match self {
            DeploymentFamily::Standalone => EngineType::Standalone,
            DeploymentFamily::Cloud | DeploymentFamily::CloudWarehouse => EngineType::Cloud,
        }
    }

    pub fn edition(self) -> EngineEdition {
        match self {
            DeploymentFamily::CloudWarehouse => EngineEdition::Warehouse,
            _ => EngineEdition::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentFamily::Standalone => "standalone",
            DeploymentFamily::Cloud => "cloud",
            DeploymentFamily::CloudWarehouse => "cloud-warehouse",
        }
    }

    /// Index of the declared epoch an observed version belongs to: the first
    /// declared epoch that is not older than `version`. Versions newer than
    /// the whole timeline belong to none.
    pub fn epoch_containing(self, version: VersionEpoch) -> Option<usize> {
        self.epochs().iter().position(|epoch| *epoch >= version)
    }

    /// Exact position of a declared epoch, ignoring the patch level.
    pub fn epoch_index(self, epoch: VersionEpoch) -> Option<usize> {
        self.epochs()
            .iter()
            .position(|e| e.major == epoch.major && e.minor == epoch.minor)
    }
}

impl fmt::Display for DeploymentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown deployment family \"{0}\" (expected standalone, cloud or cloud-warehouse)")]
pub struct ParseFamilyError(pub String);

impl FromStr for DeploymentFamily {
    type Err = ParseFamilyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standalone" => Ok(DeploymentFamily::Standalone),
            "cloud" => Ok(DeploymentFamily::Cloud),
            "cloud-warehouse" => Ok(DeploymentFamily::CloudWarehouse),
            other => Err(ParseFamilyError(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Epoch bitmasks
// ---------------------------------------------------------------------------

/// Set of epoch positions on one family's timeline.
///
/// Bit `i` stands for `family.epochs()[i]`, so adding an epoch to a catalog
/// never requires a new flag. [`EpochMask::ALL`] is the "every version"
/// sentinel used for unversioned properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochMask(u64);

impl EpochMask {
    pub const EMPTY: EpochMask = EpochMask(0);
    pub const ALL: EpochMask = EpochMask(u64::MAX);
    pub const CAPACITY: usize = u64::BITS as usize;

    pub fn single(index: usize) -> Self {
        let mut mask = Self::EMPTY;
        mask.insert(index);
        mask
    }

    pub fn insert(&mut self, index: usize) {
        debug_assert!(index < Self::CAPACITY, "epoch index {index} out of range");
        self.0 |= 1u64 << index;
    }

    pub fn contains(self, index: usize) -> bool {
        index < Self::CAPACITY && self.0 & (1u64 << index) != 0
    }

    /// Lowest set position, i.e. the epoch a property first appeared in.
    pub fn first(self) -> Option<usize> {
        (self.0 != 0).then(|| self.0.trailing_zeros() as usize)
    }

    pub fn is_all(self) -> bool {
        self == Self::ALL
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set positions below `limit`, ascending.
    pub fn iter(self, limit: usize) -> impl Iterator<Item = usize> {
        (0..limit.min(Self::CAPACITY)).filter(move |&i| self.contains(i))
    }
}
