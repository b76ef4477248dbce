//! Core entity structs for the housing market simulation.
//!
//! Covers dwellings and their residency state, the zone/region geography,
//! and the read-only household and person records the relocation model
//! consumes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::enums::{DwellingType, HouseholdSizeClass, IncomeCategory, Occupation};
use crate::ids::{DwellingId, HouseholdId, PersonId, RegionId, ZoneId};

/// Raw resident id marking a dwelling as vacant in setup data.
pub const VACANT_SENTINEL: i64 = -1;

/// Raw resident id reserved by the setup format; never valid for a dwelling.
pub const RESERVED_SENTINEL: i64 = -2;

// ---------------------------------------------------------------------------
// Residency
// ---------------------------------------------------------------------------

/// Errors converting a raw resident id into a [`Residency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResidencyError {
    /// The raw value is neither the vacant sentinel nor a positive household id.
    #[error("invalid raw resident id {0} (expected -1 or a positive household id)")]
    InvalidRaw(i64),
}

/// Occupancy state of a dwelling.
///
/// A dwelling is always in exactly one of the two states. Setup files carry
/// this as a raw integer where [`VACANT_SENTINEL`] means vacant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Residency {
    /// No household lives here.
    Vacant,
    /// Occupied by the given household.
    Occupied(HouseholdId),
}

impl Residency {
    /// Convert a raw resident id from setup data.
    ///
    /// # Errors
    ///
    /// Returns [`ResidencyError::InvalidRaw`] for zero, the reserved `-2`
    /// sentinel and any other negative value besides `-1`.
    pub fn from_raw(raw: i64) -> Result<Self, ResidencyError> {
        if raw == VACANT_SENTINEL {
            return Ok(Self::Vacant);
        }
        match u64::try_from(raw) {
            Ok(id) if id > 0 => Ok(Self::Occupied(HouseholdId::new(id))),
            _ => Err(ResidencyError::InvalidRaw(raw)),
        }
    }

    /// Convert back to the raw setup representation.
    pub fn to_raw(self) -> i64 {
        match self {
            Self::Vacant => VACANT_SENTINEL,
            Self::Occupied(id) => i64::try_from(id.into_inner()).unwrap_or(i64::MAX),
        }
    }

    /// Whether no household lives in the dwelling.
    pub const fn is_vacant(self) -> bool {
        matches!(self, Self::Vacant)
    }

    /// The occupying household, if any.
    pub const fn household(self) -> Option<HouseholdId> {
        match self {
            Self::Vacant => None,
            Self::Occupied(id) => Some(id),
        }
    }
}

// ---------------------------------------------------------------------------
// Dwelling
// ---------------------------------------------------------------------------

/// Planar coordinate of a dwelling (projected, metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
}

/// A single dwelling unit.
///
/// The identity and zone never change after creation. Residency changes only
/// through the inventory, which keeps the vacancy index in step with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dwelling {
    /// Unique, never-reused identifier.
    pub id: DwellingId,
    /// Zone the dwelling is located in.
    pub zone: ZoneId,
    /// Optional micro-location.
    pub coordinate: Option<Coordinate>,
    /// Structural type.
    pub dwelling_type: DwellingType,
    /// Number of bedrooms.
    pub bedrooms: u32,
    /// Quality level, 1 (lowest) to the configured number of levels.
    pub quality: u8,
    /// Monthly price (rent or rent-equivalent).
    pub price: u32,
    /// Year of construction.
    pub year_built: u16,
    /// Current occupancy.
    pub residency: Residency,
}

impl Dwelling {
    /// Whether the dwelling is currently vacant.
    pub const fn is_vacant(&self) -> bool {
        self.residency.is_vacant()
    }
}

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A traffic analysis zone. Belongs to exactly one region for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone identifier.
    pub id: ZoneId,
    /// Region containing this zone.
    pub region: RegionId,
}

/// A region: the coarse unit of the first relocation choice stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Region identifier.
    pub id: RegionId,
    /// Member zones.
    pub zones: BTreeSet<ZoneId>,
}

// ---------------------------------------------------------------------------
// Households
// ---------------------------------------------------------------------------

/// Scenario-specific extension value attached to a household.
///
/// This is an escape hatch for attributes a particular scenario needs; core
/// attributes are typed fields on [`Household`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean flag.
    Flag(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating-point number.
    Real(f64),
    /// Free text.
    Text(String),
}

/// A household member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Person identifier.
    pub id: PersonId,
    /// Labour-market status.
    pub occupation: Occupation,
    /// Annual income.
    pub income: u32,
    /// Workplace zone, if employed with a known job location.
    pub job_zone: Option<ZoneId>,
    /// Optional demographic group label (scenario-defined).
    pub group: Option<String>,
}

impl Person {
    /// Workplace zone of an employed person with a known job.
    pub fn commute_destination(&self) -> Option<ZoneId> {
        match self.occupation {
            Occupation::Employed => self.job_zone,
            _ => None,
        }
    }
}

/// Household type: size bracket crossed with income bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HouseholdType {
    /// Size bracket.
    pub size: HouseholdSizeClass,
    /// Income bracket.
    pub income: IncomeCategory,
}

/// A household as seen by the relocation model (read-only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    /// Household identifier.
    pub id: HouseholdId,
    /// Members.
    pub persons: Vec<Person>,
    /// Number of cars owned.
    pub autos: u32,
    /// Dwelling currently occupied, if any.
    pub dwelling: Option<DwellingId>,
    /// Optional demographic group label (scenario-defined).
    pub group: Option<String>,
    /// Scenario-specific extension attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Household {
    /// Number of members.
    pub fn size(&self) -> u32 {
        u32::try_from(self.persons.len()).unwrap_or(u32::MAX)
    }

    /// Sum of member incomes.
    pub fn income(&self) -> u32 {
        self.persons
            .iter()
            .fold(0_u32, |total, person| total.saturating_add(person.income))
    }

    /// Workplace zones of employed members, in member order.
    pub fn job_zones(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.persons.iter().filter_map(Person::commute_destination)
    }

    /// Look up a scenario extension attribute.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: u64, occupation: Occupation, income: u32, job_zone: Option<u32>) -> Person {
        Person {
            id: PersonId::new(id),
            occupation,
            income,
            job_zone: job_zone.map(ZoneId::new),
            group: None,
        }
    }

    #[test]
    fn residency_from_raw_sentinels() {
        assert_eq!(Residency::from_raw(-1), Ok(Residency::Vacant));
        assert_eq!(
            Residency::from_raw(5),
            Ok(Residency::Occupied(HouseholdId::new(5)))
        );
        assert_eq!(
            Residency::from_raw(RESERVED_SENTINEL),
            Err(ResidencyError::InvalidRaw(-2))
        );
        assert_eq!(Residency::from_raw(0), Err(ResidencyError::InvalidRaw(0)));
    }

    #[test]
    fn region_serializes_its_member_zones() {
        let region = Region {
            id: RegionId::new(3),
            zones: [ZoneId::new(31), ZoneId::new(30)].into_iter().collect(),
        };
        let json = serde_json::to_string(&region).unwrap_or_default();
        assert_eq!(json, r#"{"id":3,"zones":[30,31]}"#);
    }

    #[test]
    fn residency_raw_roundtrip() {
        assert_eq!(Residency::Vacant.to_raw(), VACANT_SENTINEL);
        assert_eq!(Residency::Occupied(HouseholdId::new(9)).to_raw(), 9);
    }

    #[test]
    fn household_income_and_job_zones() {
        let household = Household {
            id: HouseholdId::new(1),
            persons: vec![
                person(1, Occupation::Employed, 30_000, Some(4)),
                person(2, Occupation::Student, 0, Some(9)),
                person(3, Occupation::Employed, 12_000, None),
            ],
            autos: 1,
            dwelling: None,
            group: None,
            attributes: BTreeMap::new(),
        };
        assert_eq!(household.size(), 3);
        assert_eq!(household.income(), 42_000);
        let zones: Vec<ZoneId> = household.job_zones().collect();
        assert_eq!(zones, vec![ZoneId::new(4)]);
    }

    #[test]
    fn attribute_values_deserialize_untagged() {
        let parsed: Result<BTreeMap<String, AttributeValue>, _> =
            serde_json::from_str(r#"{"ev_owner": true, "tenure": 12, "label": "x"}"#);
        let parsed = parsed.unwrap_or_default();
        assert_eq!(parsed.get("ev_owner"), Some(&AttributeValue::Flag(true)));
        assert_eq!(parsed.get("tenure"), Some(&AttributeValue::Integer(12)));
        assert_eq!(
            parsed.get("label"),
            Some(&AttributeValue::Text(String::from("x")))
        );
    }
}
