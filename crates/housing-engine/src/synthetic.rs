//! Deterministic synthetic market for standalone runs.
//!
//! Setup data (dwellings, households, travel times, accessibility) normally
//! comes from scenario files read by collaborators outside this workspace.
//! The engine binary instead generates a small market from the configured
//! seed: zones laid out on a line, travel time growing with distance, and
//! a configurable share of dwellings left vacant.

use std::collections::BTreeMap;
use std::sync::Arc;

use housing_choice::{AccessibilityTable, TravelTimeTable};
use housing_core::config::{MarketConfig, SyntheticConfig};
use housing_market::{DwellingInventory, Geography};
use housing_types::{
    Dwelling, DwellingId, DwellingType, Household, HouseholdId, Occupation, Person, PersonId,
    RegionId, Residency, ZoneId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::EngineError;

/// Minutes between neighbouring zones.
const MINUTES_PER_ZONE_STEP: f64 = 4.0;

/// Minutes within a zone.
const INTRA_ZONE_MINUTES: f64 = 5.0;

/// Demographic labels handed out to households.
const GROUP_LABELS: [&str; 2] = ["group_a", "group_b"];

/// A generated market ready for [`MarketState::setup`].
///
/// [`MarketState::setup`]: housing_core::year::MarketState::setup
#[derive(Debug)]
pub struct SyntheticMarket {
    /// Dwellings and vacancy index.
    pub inventory: DwellingInventory,
    /// Households, one per occupied dwelling.
    pub households: Vec<Household>,
    /// Zone-to-zone travel times.
    pub travel_times: TravelTimeTable,
    /// Zone and region accessibility.
    pub accessibility: AccessibilityTable,
}

/// Generate a market from `seed`.
///
/// # Errors
///
/// Returns [`EngineError::Market`] if the inventory rejects a generated
/// dwelling and [`EngineError::Synthetic`] if identifiers run out.
pub fn generate(
    synthetic: &SyntheticConfig,
    market: &MarketConfig,
    seed: u64,
) -> Result<SyntheticMarket, EngineError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let zones = zone_layout(synthetic)?;
    let geography = Arc::new(Geography::from_zones(zones.iter().copied())?);
    let zone_ids: Vec<ZoneId> = zones.iter().map(|(zone, _)| *zone).collect();

    let travel_times = travel_table(&geography, &zone_ids);
    let accessibility = accessibility_table(&zones);

    let mut inventory = DwellingInventory::new(Arc::clone(&geography), market.quality_levels);
    let mut households = Vec::new();
    let mut dwellings = Vec::new();
    for index in 1..=u64::from(synthetic.dwellings) {
        let zone = *pick(&mut rng, &zone_ids)?;
        let vacant = rng.random::<f64>() < synthetic.vacancy_share;
        let residency = if vacant {
            Residency::Vacant
        } else {
            let household = synthetic_household(&mut rng, index, DwellingId::new(index), &zone_ids)?;
            households.push(household);
            Residency::Occupied(HouseholdId::new(index))
        };
        dwellings.push(synthetic_dwelling(&mut rng, index, zone, market.quality_levels, residency)?);
    }
    inventory.load(dwellings)?;

    info!(
        regions = geography.region_count(),
        zones = geography.zone_count(),
        dwellings = inventory.len(),
        households = households.len(),
        seed,
        "Synthetic market generated"
    );

    Ok(SyntheticMarket {
        inventory,
        households,
        travel_times,
        accessibility,
    })
}

/// Zones numbered `region * 100 + k`, in layout order.
fn zone_layout(synthetic: &SyntheticConfig) -> Result<Vec<(ZoneId, RegionId)>, EngineError> {
    let mut zones = Vec::new();
    for region in 1..=synthetic.regions {
        for k in 1..=synthetic.zones_per_region {
            let id = region
                .checked_mul(100)
                .and_then(|base| base.checked_add(k))
                .ok_or_else(|| synthetic_error("zone id overflow"))?;
            zones.push((ZoneId::new(id), RegionId::new(region)));
        }
    }
    Ok(zones)
}

fn travel_table(geography: &Geography, zones: &[ZoneId]) -> TravelTimeTable {
    let mut table = TravelTimeTable::new(geography, f64::from(u16::MAX));
    for (i, origin) in zones.iter().enumerate() {
        for (j, destination) in zones.iter().enumerate().skip(i) {
            let steps = j.abs_diff(i) as f64;
            table.insert(*origin, *destination, INTRA_ZONE_MINUTES + steps * MINUTES_PER_ZONE_STEP);
        }
    }
    table
}

/// Accessibility (0-100 scale) falls off linearly from the first zone of the
/// layout.
fn accessibility_table(zones: &[(ZoneId, RegionId)]) -> AccessibilityTable {
    let count = zones.len().max(1) as f64;
    let mut table = AccessibilityTable::default();
    let mut regional: BTreeMap<RegionId, (f64, f64)> = BTreeMap::new();
    for (position, (zone, region)) in zones.iter().enumerate() {
        let auto = 100.0 * (1.0 - position as f64 / count);
        table.auto.insert(*zone, auto);
        table.transit.insert(*zone, auto * 0.6);
        let entry = regional.entry(*region).or_insert((0.0, 0.0));
        entry.0 += auto;
        entry.1 += 1.0;
    }
    table.regional = regional
        .into_iter()
        .map(|(region, (sum, n))| (region, sum / n))
        .collect();
    table
}

fn synthetic_dwelling(
    rng: &mut StdRng,
    id: u64,
    zone: ZoneId,
    quality_levels: u8,
    residency: Residency,
) -> Result<Dwelling, EngineError> {
    let dwelling_type = *pick(rng, &DwellingType::ALL)?;
    let bedrooms: u32 = rng.random_range(1..=4);
    let quality: u8 = rng.random_range(1..=quality_levels.max(1));
    let price = 300_u32
        .saturating_add(bedrooms.saturating_mul(150))
        .saturating_add(u32::from(quality).saturating_mul(100))
        .saturating_add(rng.random_range(0..200));
    Ok(Dwelling {
        id: DwellingId::new(id),
        zone,
        coordinate: None,
        dwelling_type,
        bedrooms,
        quality,
        price,
        year_built: rng.random_range(1950..=2010),
        residency,
    })
}

fn synthetic_household(
    rng: &mut StdRng,
    id: u64,
    dwelling: DwellingId,
    zones: &[ZoneId],
) -> Result<Household, EngineError> {
    let size: u64 = rng.random_range(1..=4);
    let first_person = id
        .checked_mul(10)
        .ok_or_else(|| synthetic_error("person id overflow"))?;
    let mut persons = Vec::new();
    for member in 0..size {
        let occupation = if member == 0 || rng.random::<f64>() < 0.4 {
            Occupation::Employed
        } else if rng.random::<f64>() < 0.5 {
            Occupation::Student
        } else {
            Occupation::Retired
        };
        let (income, job_zone) = match occupation {
            Occupation::Employed => (rng.random_range(8_000..=45_000), Some(*pick(rng, zones)?)),
            _ => (0, None),
        };
        persons.push(Person {
            id: PersonId::new(first_person.saturating_add(member)),
            occupation,
            income,
            job_zone,
            group: None,
        });
    }
    Ok(Household {
        id: HouseholdId::new(id),
        persons,
        autos: rng.random_range(0..=2),
        dwelling: Some(dwelling),
        group: Some((*pick(rng, &GROUP_LABELS)?).to_owned()),
        attributes: BTreeMap::new(),
    })
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> Result<&'a T, EngineError> {
    if items.is_empty() {
        return Err(synthetic_error("nothing to pick from"));
    }
    let index = rng.random_range(0..items.len());
    items
        .get(index)
        .ok_or_else(|| synthetic_error("pick out of range"))
}

fn synthetic_error(message: &str) -> EngineError {
    EngineError::Synthetic {
        message: message.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use housing_market::audit_vacancy_index;

    use super::*;

    fn config() -> SyntheticConfig {
        SyntheticConfig {
            regions: 3,
            zones_per_region: 2,
            dwellings: 200,
            vacancy_share: 0.1,
        }
    }

    #[test]
    fn same_seed_same_market() {
        let a = generate(&config(), &MarketConfig::default(), 9).unwrap();
        let b = generate(&config(), &MarketConfig::default(), 9).unwrap();
        assert_eq!(a.households, b.households);
        let prices_a: Vec<u32> = a.inventory.all().map(|d| d.price).collect();
        let prices_b: Vec<u32> = b.inventory.all().map(|d| d.price).collect();
        assert_eq!(prices_a, prices_b);
    }

    #[test]
    fn every_occupied_dwelling_has_its_household() {
        let market = generate(&config(), &MarketConfig::default(), 3).unwrap();
        assert_eq!(market.inventory.len(), 200);
        let occupied = market.inventory.all().filter(|d| !d.is_vacant()).count();
        assert_eq!(occupied, market.households.len());
        for household in &market.households {
            let dwelling = market.inventory.get(household.dwelling.unwrap()).unwrap();
            assert_eq!(dwelling.residency, Residency::Occupied(household.id));
        }
        assert!(audit_vacancy_index(&market.inventory).is_consistent());
    }

    #[test]
    fn dwellings_sit_in_laid_out_zones() {
        let market = generate(&config(), &MarketConfig::default(), 5).unwrap();
        let zones: Vec<ZoneId> = zone_layout(&config()).unwrap().into_iter().map(|(zone, _)| zone).collect();
        assert!(market.inventory.all().all(|d| zones.contains(&d.zone)));
        let regions: Vec<RegionId> = market.inventory.geography().region_ids().collect();
        assert_eq!(regions.len(), 3);
    }

    #[test]
    fn zones_are_numbered_per_region() {
        let zones = zone_layout(&config()).unwrap();
        assert_eq!(zones.len(), 6);
        assert_eq!(zones.first(), Some(&(ZoneId::new(101), RegionId::new(1))));
        assert_eq!(zones.last(), Some(&(ZoneId::new(302), RegionId::new(3))));
    }
}
