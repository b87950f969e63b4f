//! Reconciliation of listing and detail observations

use super::{DetailRecord, MergedRecord, PartialRecord};
use std::collections::HashMap;

/// Folds one listing page's cards into the run-wide accumulator
///
/// A URL already present keeps its populated fields; the new card only fills
/// the gaps (see [`PartialRecord::absorb`]).
pub fn fold_listing(
    accumulator: &mut HashMap<String, PartialRecord>,
    page: HashMap<String, PartialRecord>,
) {
    for (url, partial) in page {
        match accumulator.get_mut(&url) {
            Some(existing) => existing.absorb(partial),
            None => {
                accumulator.insert(url, partial);
            }
        }
    }
}

impl MergedRecord {
    /// Merges a detail record with the listing card for the same URL
    ///
    /// Detail values win when non-empty. An empty detail value never erases a
    /// populated listing value, which is what keeps `avg_cost_2_people` and
    /// `features` alive: detail pages do not carry them.
    pub fn merge(partial: Option<&PartialRecord>, detail: DetailRecord) -> Self {
        let Some(partial) = partial else {
            return Self::from(detail);
        };

        let mut merged = Self::from(detail);
        prefer_detail(&mut merged.address, &partial.address);
        prefer_detail(&mut merged.phones, &partial.phones);
        prefer_detail(&mut merged.cuisine, &partial.cuisine);
        prefer_detail(&mut merged.working_hours, &partial.working_hours);
        prefer_detail(&mut merged.avg_cost_2_people, &partial.avg_cost_2_people);
        prefer_detail(&mut merged.features, &partial.features);
        merged
    }
}

fn prefer_detail(detail: &mut String, listing: &Option<String>) {
    if detail.is_empty() {
        if let Some(value) = listing {
            detail.clone_from(value);
        }
    }
}
