//! Share of rents paid by each income category.
//!
//! Built once at setup from the occupied dwellings: the price of every
//! occupied dwelling is bucketed into a rent category (`price / width`,
//! capped at the top category) and counted under the income category of its
//! resident household. The highest income category additionally counts one
//! dwelling in the top rent category, so the most expensive segment is
//! always affordable to someone.
//!
//! The table is an explicit value owned by the [`MarketReference`] and
//! passed by reference to the utility strategies; it is never global.
//!
//! [`MarketReference`]: crate::reference::MarketReference

use std::collections::BTreeMap;

use housing_types::{HouseholdId, IncomeCategory};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inventory::DwellingInventory;

/// Default price span of one rent category.
pub const DEFAULT_RENT_CATEGORY_WIDTH: u32 = 200;

/// Default index of the top rent category.
pub const DEFAULT_RENT_CATEGORIES: u32 = 25;

/// Rent category shares per income category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RentShareTable {
    /// Price span of one rent category.
    width: u32,
    /// Index of the top rent category; categories run `0..=top`.
    top: u32,
    /// Shares indexed by rent category, per income category.
    shares: BTreeMap<IncomeCategory, Vec<f64>>,
}

impl RentShareTable {
    /// Compute the table from the occupied dwellings of `inventory`.
    ///
    /// `income_of` resolves a resident household to its income category;
    /// dwellings whose resident cannot be resolved are skipped.
    pub fn compute<F>(inventory: &DwellingInventory, width: u32, top: u32, income_of: F) -> Self
    where
        F: Fn(HouseholdId) -> Option<IncomeCategory>,
    {
        let slots = usize::try_from(top).unwrap_or(usize::MAX).saturating_add(1);
        let mut counts: BTreeMap<IncomeCategory, Vec<u64>> = IncomeCategory::ALL
            .iter()
            .map(|category| (*category, vec![0; slots]))
            .collect();

        let mut unresolved = 0_u64;
        for dwelling in inventory.all() {
            let Some(household) = dwelling.residency.household() else {
                continue;
            };
            let Some(income) = income_of(household) else {
                unresolved = unresolved.saturating_add(1);
                continue;
            };
            let category = Self::category_for(dwelling.price, width, top);
            if let Some(count) = counts
                .get_mut(&income)
                .and_then(|row| row.get_mut(category))
            {
                *count = count.saturating_add(1);
            }
        }
        if let Some(top_count) = counts
            .get_mut(&IncomeCategory::HIGHEST)
            .and_then(|row| row.last_mut())
        {
            *top_count = top_count.saturating_add(1);
        }

        let shares = counts
            .into_iter()
            .map(|(income, row)| {
                let sum: u64 = row.iter().sum();
                let shares = row
                    .iter()
                    .map(|&count| {
                        if sum == 0 {
                            0.0
                        } else {
                            count as f64 / sum as f64
                        }
                    })
                    .collect();
                (income, shares)
            })
            .collect();

        debug!(width, top, unresolved, "Rent shares by income category computed");
        Self { width, top, shares }
    }

    /// Rent category of a price: `price / width`, capped at the top category.
    pub fn category_for(price: u32, width: u32, top: u32) -> usize {
        let category = price.checked_div(width).unwrap_or(top).min(top);
        usize::try_from(category).unwrap_or(usize::MAX)
    }

    /// Rent category of a price under this table's bucketing.
    pub fn category_of(&self, price: u32) -> usize {
        Self::category_for(price, self.width, self.top)
    }

    /// Share of an income category's rents falling in one rent category.
    pub fn share(&self, income: IncomeCategory, rent_category: usize) -> f64 {
        self.shares
            .get(&income)
            .and_then(|row| row.get(rent_category))
            .copied()
            .unwrap_or(0.0)
    }

    /// Share of an income category's rents at or below the category of
    /// `price`.
    pub fn cumulative_share(&self, income: IncomeCategory, price: u32) -> f64 {
        let category = self.category_of(price);
        self.shares.get(&income).map_or(0.0, |row| {
            row.iter().take(category.saturating_add(1)).sum()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use housing_types::{Dwelling, DwellingId, DwellingType, RegionId, Residency, ZoneId};

    use super::*;
    use crate::geography::Geography;

    fn rented(id: u64, price: u32, household: u64) -> Dwelling {
        Dwelling {
            id: DwellingId::new(id),
            zone: ZoneId::new(1),
            coordinate: None,
            dwelling_type: DwellingType::MultiFamilyLarge,
            bedrooms: 1,
            quality: 1,
            price,
            year_built: 1975,
            residency: if household == 0 {
                Residency::Vacant
            } else {
                Residency::Occupied(HouseholdId::new(household))
            },
        }
    }

    fn table() -> RentShareTable {
        let geography = Geography::from_zones([(ZoneId::new(1), RegionId::new(1))]);
        let mut inventory = DwellingInventory::new(Arc::new(geography.unwrap_or_default()), 4);
        let loaded = inventory.load([
            rented(1, 150, 1),
            rented(2, 450, 2),
            rented(3, 9_000, 3),
            rented(4, 300, 0),
        ]);
        assert!(loaded.is_ok());
        RentShareTable::compute(
            &inventory,
            DEFAULT_RENT_CATEGORY_WIDTH,
            DEFAULT_RENT_CATEGORIES,
            |household| match household.into_inner() {
                1 | 2 => Some(IncomeCategory::Low),
                3 => Some(IncomeCategory::High),
                _ => None,
            },
        )
    }

    #[test]
    fn rent_category_is_capped() {
        assert_eq!(RentShareTable::category_for(199, 200, 25), 0);
        assert_eq!(RentShareTable::category_for(450, 200, 25), 2);
        assert_eq!(RentShareTable::category_for(1_000_000, 200, 25), 25);
        assert_eq!(RentShareTable::category_for(10, 0, 25), 25);
    }

    #[test]
    fn shares_per_income_category() {
        let table = table();
        assert!((table.share(IncomeCategory::Low, 0) - 0.5).abs() < 1e-12);
        assert!((table.share(IncomeCategory::Low, 2) - 0.5).abs() < 1e-12);
        assert!((table.share(IncomeCategory::High, 25) - 1.0).abs() < 1e-12);
        assert!((table.cumulative_share(IncomeCategory::Low, 300) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_income_category_has_zero_shares() {
        let table = table();
        assert!(table.share(IncomeCategory::Medium, 0).abs() < f64::EPSILON);
        assert!(table.cumulative_share(IncomeCategory::Medium, 5_000).abs() < f64::EPSILON);
    }

    #[test]
    fn highest_category_always_affords_top_rent() {
        let table = table();
        assert!((table.share(IncomeCategory::VeryHigh, 25) - 1.0).abs() < 1e-12);
    }
}
