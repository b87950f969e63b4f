//! Descriptive statistics over a written restaurant table
//!
//! Every figure is computed from column presence and simple parsing of the
//! text values; nothing here touches the network.

use crate::output::csv::Row;
use crate::output::{OutputError, OutputResult};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const TOP_CUISINES: usize = 5;
const TOP_FEATURES: usize = 10;
const BUDGET_LIMIT: f64 = 15.0;
const PREMIUM_LIMIT: f64 = 40.0;

/// A value and how many rows mention it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryInsights {
    pub total_restaurants: usize,
    /// Mean fill rate of name, address and phones, in percent
    pub essential_completeness: f64,
    /// Mean fill rate of cuisine, working hours and features, in percent
    pub business_completeness: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CuisineInsights {
    pub total_unique_cuisines: usize,
    pub top: Vec<Ranked>,
    pub restaurants_with_cuisine: usize,
    pub percentage: f64,
    pub multi_cuisine_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceCategories {
    pub budget: usize,
    pub mid_range: usize,
    pub premium: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PricingInsights {
    pub restaurants_with_pricing: usize,
    pub average_cost: f64,
    pub median_cost: f64,
    pub min_cost: f64,
    pub max_cost: f64,
    pub categories: PriceCategories,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureInsights {
    pub total_unique_features: usize,
    pub top: Vec<Ranked>,
    pub restaurants_with_features: usize,
    pub max_features: usize,
    pub avg_features: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeographicInsights {
    pub restaurants_with_gps: usize,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<BoundingBox>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlatformShare {
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SocialInsights {
    pub facebook: PlatformShare,
    pub instagram: PlatformShare,
    pub foursquare: PlatformShare,
    /// Rows with both a Facebook and an Instagram link
    pub multi_platform: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HoursInsights {
    pub restaurants_with_hours: usize,
    pub percentage: f64,
    /// Rows whose hours mention "24"
    pub around_the_clock: usize,
}

/// All insights for one table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Insights {
    pub summary: SummaryInsights,
    pub cuisine: CuisineInsights,
    pub pricing: PricingInsights,
    pub features: FeatureInsights,
    pub geographic: GeographicInsights,
    pub social_media: SocialInsights,
    pub hours: HoursInsights,
}

/// Computes insights over header-keyed rows
///
/// A table with no rows yields all-zero insights.
pub fn compute_insights(rows: &[Row]) -> OutputResult<Insights> {
    let total = rows.len();
    let filled = |column: &str| rows.iter().filter(|row| has(row, column)).count();
    let share = |count: usize| percentage(count, total);

    let summary = SummaryInsights {
        total_restaurants: total,
        essential_completeness: round_to(
            mean(&[share(filled("name")), share(filled("address")), share(filled("phones"))]),
            1,
        ),
        business_completeness: round_to(
            mean(&[
                share(filled("cuisine")),
                share(filled("working_hours")),
                share(filled("features")),
            ]),
            1,
        ),
    };

    let cuisines = tally(rows, "cuisine");
    let with_cuisine = filled("cuisine");
    let cuisine = CuisineInsights {
        total_unique_cuisines: cuisines.len(),
        top: cuisines.iter().take(TOP_CUISINES).cloned().collect(),
        restaurants_with_cuisine: with_cuisine,
        percentage: round_to(share(with_cuisine), 1),
        multi_cuisine_count: rows
            .iter()
            .filter(|row| value(row, "cuisine").contains(';'))
            .count(),
    };

    let features = tally(rows, "features");
    let feature_counts: Vec<usize> = rows
        .iter()
        .filter(|row| has(row, "features"))
        .map(|row| value(row, "features").matches(';').count() + 1)
        .collect();
    let feature = FeatureInsights {
        total_unique_features: features.len(),
        top: features.iter().take(TOP_FEATURES).cloned().collect(),
        restaurants_with_features: feature_counts.len(),
        max_features: feature_counts.iter().copied().max().unwrap_or(0),
        avg_features: round_to(
            mean(&feature_counts.iter().map(|&c| c as f64).collect::<Vec<_>>()),
            1,
        ),
    };

    let facebook = filled("facebook");
    let instagram = filled("instagram");
    let foursquare = filled("foursquare");
    let social_media = SocialInsights {
        facebook: PlatformShare {
            count: facebook,
            percentage: round_to(share(facebook), 1),
        },
        instagram: PlatformShare {
            count: instagram,
            percentage: round_to(share(instagram), 1),
        },
        foursquare: PlatformShare {
            count: foursquare,
            percentage: round_to(share(foursquare), 1),
        },
        multi_platform: rows
            .iter()
            .filter(|row| has(row, "facebook") && has(row, "instagram"))
            .count(),
    };

    let with_hours = filled("working_hours");
    let hours = HoursInsights {
        restaurants_with_hours: with_hours,
        percentage: round_to(share(with_hours), 1),
        around_the_clock: rows
            .iter()
            .filter(|row| value(row, "working_hours").contains("24"))
            .count(),
    };

    Ok(Insights {
        summary,
        cuisine,
        pricing: pricing(rows)?,
        features: feature,
        geographic: geographic(rows),
        social_media,
        hours,
    })
}

fn pricing(rows: &[Row]) -> OutputResult<PricingInsights> {
    let numbers = Regex::new(r"\d+").map_err(|e| OutputError::Format(e.to_string()))?;

    let mut prices: Vec<f64> = rows
        .iter()
        .filter_map(|row| {
            let amounts: Vec<f64> = numbers
                .find_iter(value(row, "avg_cost_2_people"))
                .filter_map(|m| m.as_str().parse::<f64>().ok())
                .collect();
            (!amounts.is_empty()).then(|| mean(&amounts))
        })
        .collect();

    if prices.is_empty() {
        return Ok(PricingInsights::default());
    }

    prices.sort_by(|a, b| a.total_cmp(b));

    let categories = PriceCategories {
        budget: prices.iter().filter(|&&p| p < BUDGET_LIMIT).count(),
        mid_range: prices
            .iter()
            .filter(|&&p| (BUDGET_LIMIT..=PREMIUM_LIMIT).contains(&p))
            .count(),
        premium: prices.iter().filter(|&&p| p > PREMIUM_LIMIT).count(),
    };

    Ok(PricingInsights {
        restaurants_with_pricing: prices.len(),
        average_cost: round_to(mean(&prices), 2),
        median_cost: round_to(median(&prices), 2),
        min_cost: round_to(prices[0], 2),
        max_cost: round_to(prices[prices.len() - 1], 2),
        categories,
    })
}

fn geographic(rows: &[Row]) -> GeographicInsights {
    let points: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| {
            let lat = value(row, "latitude").trim().parse::<f64>().ok()?;
            let lon = value(row, "longitude").trim().parse::<f64>().ok()?;
            (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
        })
        .collect();

    let coverage = points.first().map(|&(lat, lon)| {
        let mut bounds = BoundingBox {
            lat_min: lat,
            lat_max: lat,
            lon_min: lon,
            lon_max: lon,
        };
        for &(lat, lon) in &points[1..] {
            bounds.lat_min = bounds.lat_min.min(lat);
            bounds.lat_max = bounds.lat_max.max(lat);
            bounds.lon_min = bounds.lon_min.min(lon);
            bounds.lon_max = bounds.lon_max.max(lon);
        }
        BoundingBox {
            lat_min: round_to(bounds.lat_min, 4),
            lat_max: round_to(bounds.lat_max, 4),
            lon_min: round_to(bounds.lon_min, 4),
            lon_max: round_to(bounds.lon_max, 4),
        }
    });

    GeographicInsights {
        restaurants_with_gps: points.len(),
        percentage: round_to(percentage(points.len(), rows.len()), 1),
        coverage,
    }
}

/// Counts every `;`-separated item of a column, most frequent first
///
/// Ties keep the order in which items were first seen.
fn tally(rows: &[Row], column: &str) -> Vec<Ranked> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    let items = rows
        .iter()
        .flat_map(|row| value(row, column).split(';'))
        .map(str::trim)
        .filter(|item| !item.is_empty());

    for item in items {
        let count = counts.entry(item.to_string()).or_insert_with(|| {
            order.push(item.to_string());
            0
        });
        *count += 1;
    }

    let mut ranked: Vec<Ranked> = order
        .into_iter()
        .map(|name| {
            let count = counts[&name];
            Ranked { name, count }
        })
        .collect();
    // Stable sort keeps first-seen order among equal counts
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

fn value<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

fn has(row: &Row, column: &str) -> bool {
    !value(row, column).trim().is_empty()
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Median of an ascending, non-empty slice
fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Prints insights to stdout in a formatted manner
pub fn print_insights(insights: &Insights) {
    println!("=== Restaurant Insights ===\n");

    let summary = &insights.summary;
    println!("Summary:");
    println!("  Total restaurants: {}", summary.total_restaurants);
    println!("  Essential data completeness: {:.1}%", summary.essential_completeness);
    println!("  Business details completeness: {:.1}%", summary.business_completeness);
    println!();

    let cuisine = &insights.cuisine;
    println!("Cuisine:");
    println!("  Unique cuisine types: {}", cuisine.total_unique_cuisines);
    for ranked in &cuisine.top {
        println!("    {}: {}", ranked.name, ranked.count);
    }
    println!(
        "  With cuisine: {} ({:.1}%)",
        cuisine.restaurants_with_cuisine, cuisine.percentage
    );
    println!("  Multi-cuisine: {}", cuisine.multi_cuisine_count);
    println!();

    let pricing = &insights.pricing;
    if pricing.restaurants_with_pricing > 0 {
        println!("Pricing (2 people, manat):");
        println!("  Average: {:.2}", pricing.average_cost);
        println!("  Median: {:.2}", pricing.median_cost);
        println!("  Range: {:.2}-{:.2}", pricing.min_cost, pricing.max_cost);
        println!(
            "  Budget / mid-range / premium: {} / {} / {}",
            pricing.categories.budget, pricing.categories.mid_range, pricing.categories.premium
        );
        println!();
    }

    let features = &insights.features;
    println!("Features:");
    println!("  Unique features: {}", features.total_unique_features);
    for ranked in &features.top {
        println!("    {}: {}", ranked.name, ranked.count);
    }
    if features.restaurants_with_features > 0 {
        println!(
            "  Features per restaurant: {:.1} avg, {} max",
            features.avg_features, features.max_features
        );
    }
    println!();

    let geo = &insights.geographic;
    println!("Geographic:");
    println!("  With GPS: {} ({:.1}%)", geo.restaurants_with_gps, geo.percentage);
    if let Some(bounds) = &geo.coverage {
        println!(
            "  Coverage: lat {:.4}..{:.4}, lon {:.4}..{:.4}",
            bounds.lat_min, bounds.lat_max, bounds.lon_min, bounds.lon_max
        );
    }
    println!();

    let social = &insights.social_media;
    println!("Social Media:");
    println!("  Facebook: {} ({:.1}%)", social.facebook.count, social.facebook.percentage);
    println!("  Instagram: {} ({:.1}%)", social.instagram.count, social.instagram.percentage);
    println!("  Foursquare: {} ({:.1}%)", social.foursquare.count, social.foursquare.percentage);
    println!("  Facebook and Instagram: {}", social.multi_platform);
    println!();

    let hours = &insights.hours;
    println!("Operating Hours:");
    println!("  With hours: {} ({:.1}%)", hours.restaurants_with_hours, hours.percentage);
    println!("  Open around the clock: {}", hours.around_the_clock);
}

/// Writes insights as pretty-printed JSON
pub fn write_insights_json(insights: &Insights, path: &Path) -> OutputResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, insights)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
