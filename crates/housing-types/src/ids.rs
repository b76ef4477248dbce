//! Type-safe identifier wrappers around plain integers.
//!
//! Every entity in the market has a strongly-typed ID to prevent accidental
//! mixing of identifiers at compile time. Dwelling ids are handed out by the
//! inventory's monotonic counter and are never reused within a run; zone and
//! region ids come from the setup collaborator and are fixed for a run.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around an integer with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Wrap a raw identifier value.
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Return the inner integer value.
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a dwelling. Assigned monotonically, never reused.
    DwellingId(u64)
}

define_id! {
    /// Unique identifier for a household.
    HouseholdId(u64)
}

define_id! {
    /// Unique identifier for a person within the synthetic population.
    PersonId(u64)
}

define_id! {
    /// Identifier for a traffic analysis zone.
    ZoneId(u32)
}

define_id! {
    /// Identifier for a region (an aggregation of zones).
    RegionId(u32)
}

impl DwellingId {
    /// Return the identifier immediately following this one, or `None`
    /// if the id space is exhausted.
    pub const fn checked_next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(next) => Some(Self(next)),
            None => None,
        }
    }
}
