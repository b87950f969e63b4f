//! Restaurant record model
//!
//! A restaurant is observed twice: once as a card on a listing page
//! ([`PartialRecord`]) and once on its own detail page ([`DetailRecord`]).
//! Both are keyed by the absolute detail-page URL. [`MergedRecord`] is the
//! reconciled row written to the output table.

mod merge;

pub use merge::fold_listing;

/// Output table columns, in order
pub const COLUMNS: [&str; 18] = [
    "name",
    "address",
    "phones",
    "cuisine",
    "category",
    "working_hours",
    "avg_cost_2_people",
    "features",
    "description",
    "facebook",
    "instagram",
    "twitter",
    "foursquare",
    "email",
    "latitude",
    "longitude",
    "images",
    "url",
];

/// Fields that can appear on a listing card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingField {
    AvgCost,
    Features,
    Cuisine,
    WorkingHours,
    Address,
    Phones,
}

/// Summary data scraped from one listing card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRecord {
    pub avg_cost_2_people: Option<String>,
    pub features: Option<String>,
    pub cuisine: Option<String>,
    pub working_hours: Option<String>,
    pub address: Option<String>,
    pub phones: Option<String>,
}

impl PartialRecord {
    pub fn get(&self, field: ListingField) -> Option<&str> {
        match field {
            ListingField::AvgCost => self.avg_cost_2_people.as_deref(),
            ListingField::Features => self.features.as_deref(),
            ListingField::Cuisine => self.cuisine.as_deref(),
            ListingField::WorkingHours => self.working_hours.as_deref(),
            ListingField::Address => self.address.as_deref(),
            ListingField::Phones => self.phones.as_deref(),
        }
    }

    pub fn slot_mut(&mut self, field: ListingField) -> &mut Option<String> {
        match field {
            ListingField::AvgCost => &mut self.avg_cost_2_people,
            ListingField::Features => &mut self.features,
            ListingField::Cuisine => &mut self.cuisine,
            ListingField::WorkingHours => &mut self.working_hours,
            ListingField::Address => &mut self.address,
            ListingField::Phones => &mut self.phones,
        }
    }

    /// Sets a field, ignoring empty values
    pub fn set(&mut self, field: ListingField, value: String) {
        if !value.is_empty() {
            *self.slot_mut(field) = Some(value);
        }
    }

    /// Fills every field that is still unset from a later observation
    ///
    /// Values already present are kept, so the first card seen for a URL
    /// decides each field and later cards only contribute what it lacked.
    pub fn absorb(&mut self, later: PartialRecord) {
        fill(&mut self.avg_cost_2_people, later.avg_cost_2_people);
        fill(&mut self.features, later.features);
        fill(&mut self.cuisine, later.cuisine);
        fill(&mut self.working_hours, later.working_hours);
        fill(&mut self.address, later.address);
        fill(&mut self.phones, later.phones);
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    let vacant = slot.as_deref().map_or(true, str::is_empty);
    if vacant {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            *slot = Some(value);
        }
    }
}

/// Everything scraped from a restaurant's detail page
///
/// Empty strings mean "not found on the page".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRecord {
    pub url: String,
    pub name: String,
    pub address: String,
    pub phones: String,
    pub cuisine: String,
    pub category: String,
    pub working_hours: String,
    /// Listing-only; always empty from a detail page
    pub avg_cost_2_people: String,
    /// Listing-only; always empty from a detail page
    pub features: String,
    pub description: String,
    pub facebook: String,
    pub instagram: String,
    pub twitter: String,
    pub foursquare: String,
    pub email: String,
    pub latitude: String,
    pub longitude: String,
    pub images: String,
}

impl DetailRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// One output row: a detail record reconciled with its listing card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedRecord {
    pub name: String,
    pub address: String,
    pub phones: String,
    pub cuisine: String,
    pub category: String,
    pub working_hours: String,
    pub avg_cost_2_people: String,
    pub features: String,
    pub description: String,
    pub facebook: String,
    pub instagram: String,
    pub twitter: String,
    pub foursquare: String,
    pub email: String,
    pub latitude: String,
    pub longitude: String,
    pub images: String,
    pub url: String,
}

impl MergedRecord {
    /// Cell values in [`COLUMNS`] order
    pub fn values(&self) -> [&str; 18] {
        [
            self.name.as_str(),
            self.address.as_str(),
            self.phones.as_str(),
            self.cuisine.as_str(),
            self.category.as_str(),
            self.working_hours.as_str(),
            self.avg_cost_2_people.as_str(),
            self.features.as_str(),
            self.description.as_str(),
            self.facebook.as_str(),
            self.instagram.as_str(),
            self.twitter.as_str(),
            self.foursquare.as_str(),
            self.email.as_str(),
            self.latitude.as_str(),
            self.longitude.as_str(),
            self.images.as_str(),
            self.url.as_str(),
        ]
    }

    /// Looks up a cell by column name
    pub fn get(&self, column: &str) -> Option<&str> {
        COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|idx| self.values()[idx])
    }
}

impl From<DetailRecord> for MergedRecord {
    fn from(detail: DetailRecord) -> Self {
        Self {
            name: detail.name,
            address: detail.address,
            phones: detail.phones,
            cuisine: detail.cuisine,
            category: detail.category,
            working_hours: detail.working_hours,
            avg_cost_2_people: detail.avg_cost_2_people,
            features: detail.features,
            description: detail.description,
            facebook: detail.facebook,
            instagram: detail.instagram,
            twitter: detail.twitter,
            foursquare: detail.foursquare,
            email: detail.email,
            latitude: detail.latitude,
            longitude: detail.longitude,
            images: detail.images,
            url: detail.url,
        }
    }
}
