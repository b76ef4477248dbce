//! Error types for the `housing-market` crate.
//!
//! Every variant here is a consistency fault: a request that contradicts the
//! current inventory state. Callers inside the year loop log and count them
//! and carry on; the offending operation leaves all state untouched.

use housing_types::{DwellingId, RegionId, ResidencyError, ZoneId};

/// Errors that can occur during inventory and geography operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketError {
    /// No dwelling with this id exists in the inventory.
    #[error("dwelling not found: {0}")]
    DwellingNotFound(DwellingId),

    /// A dwelling with this id is already present.
    #[error("duplicate dwelling id: {0}")]
    DuplicateDwelling(DwellingId),

    /// The id belonged to a dwelling removed earlier in this run.
    #[error("dwelling id {0} was retired and cannot be reused")]
    RetiredDwellingId(DwellingId),

    /// The dwelling id counter cannot advance any further.
    #[error("dwelling id space exhausted")]
    IdSpaceExhausted,

    /// A zone is not part of the geography.
    #[error("zone not found: {0}")]
    UnknownZone(ZoneId),

    /// A region is not part of the geography.
    #[error("region not found: {0}")]
    UnknownRegion(RegionId),

    /// A zone was assigned to a region twice.
    #[error("zone {zone} is already assigned to region {region}")]
    DuplicateZone {
        /// The zone being re-assigned.
        zone: ZoneId,
        /// The region it already belongs to.
        region: RegionId,
    },

    /// A dwelling expected in a region's vacancy list is not there.
    #[error("dwelling {dwelling} is not indexed as vacant in region {region}")]
    NotIndexedAsVacant {
        /// The dwelling.
        dwelling: DwellingId,
        /// The region whose list was searched.
        region: RegionId,
    },

    /// A dwelling is already present in a vacancy list.
    #[error("dwelling {dwelling} is already indexed as vacant in region {region}")]
    AlreadyIndexedAsVacant {
        /// The dwelling.
        dwelling: DwellingId,
        /// The region whose list holds it.
        region: RegionId,
    },

    /// A raw resident id from setup data is not valid.
    #[error("dwelling {dwelling}: {source}")]
    InvalidResident {
        /// The dwelling.
        dwelling: DwellingId,
        /// The conversion failure.
        source: ResidencyError,
    },

    /// A quality level lies outside `1..=levels`.
    #[error("dwelling {dwelling} has quality {quality} outside 1..={levels}")]
    QualityOutOfRange {
        /// The dwelling.
        dwelling: DwellingId,
        /// The rejected quality.
        quality: u8,
        /// Number of configured quality levels.
        levels: u8,
    },
}
