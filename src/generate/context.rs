//! Narrative context derived from address keywords, coordinates, zoning and
//! construction year

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Coordinates, PropertyRecord};

struct District {
    pattern: Regex,
    label: &'static str,
    sentence: &'static str,
}

static DISTRICTS: Lazy<Vec<District>> = Lazy::new(|| {
    vec![
        District {
            pattern: Regex::new(r"(?i)miracle\s+mile|ponce\s+de\s+leon").unwrap(),
            label: "Miracle Mile District",
            sentence: "This property is part of the vibrant Miracle Mile district, known for its shopping, dining, and cultural attractions.",
        },
        District {
            pattern: Regex::new(r"(?i)biltmore|granada").unwrap(),
            label: "Biltmore Area",
            sentence: "Located in the prestigious Biltmore area, known for its historic architecture and luxury properties.",
        },
        District {
            pattern: Regex::new(r"(?i)gables\s+by\s+the\s+sea|snapper\s+creek").unwrap(),
            label: "Gables by the Sea",
            sentence: "This property is in the scenic Gables by the Sea area, offering waterfront views and a peaceful atmosphere.",
        },
        District {
            pattern: Regex::new(r"(?i)coral\s+way").unwrap(),
            label: "Coral Way",
            sentence: "Situated along the historic Coral Way, a tree-lined boulevard connecting Coral Gables to Miami.",
        },
    ]
});

const DEFAULT_DISTRICT: &str = "Coral Gables";
const DEFAULT_COMMUNITY: &str = "This property is part of the Coral Gables community, known for its Mediterranean architecture and tree-lined streets.";

/// Coordinate boxes as (min_lon, max_lon, min_lat, max_lat, description);
/// the first matching box wins.
const AREAS: &[(f64, f64, f64, f64, &str)] = &[
    (-80.3, -80.2, 25.7, 25.8, "in the heart of Coral Gables"),
    (-80.3, -80.2, 25.6, 25.7, "in the southern area of Coral Gables"),
    (-80.2, -80.1, 25.7, 25.8, "in the eastern section of Coral Gables"),
];

/// Construction years before this are described as historic
const HISTORIC_BEFORE: i32 = 1950;
/// Construction years before this are "constructed", later ones "built"
const MID_CENTURY_BEFORE: i32 = 1980;

fn district(address: &str) -> Option<&'static District> {
    DISTRICTS.iter().find(|d| d.pattern.is_match(address))
}

/// District sentence for an address, falling back to the general community
pub fn community_context(address: &str) -> &'static str {
    district(address).map_or(DEFAULT_COMMUNITY, |d| d.sentence)
}

/// Short district name for an address, `Coral Gables` when none matches
pub fn district_label(address: &str) -> &'static str {
    district(address).map_or(DEFAULT_DISTRICT, |d| d.label)
}

/// Community context for a record; records without an address get the
/// general sentence only when a neighborhood is known.
pub fn record_context(record: &PropertyRecord) -> Option<&'static str> {
    match (&record.address, &record.neighborhood) {
        (Some(address), _) => Some(community_context(address)),
        (None, Some(_)) => Some(DEFAULT_COMMUNITY),
        (None, None) => None,
    }
}

/// Named area for a coordinate pair, if it falls in a known box
pub fn area_description(coords: Coordinates) -> Option<&'static str> {
    AREAS
        .iter()
        .find(|(min_lon, max_lon, min_lat, max_lat, _)| {
            (*min_lon..=*max_lon).contains(&coords.longitude)
                && (*min_lat..=*max_lat).contains(&coords.latitude)
        })
        .map(|area| area.4)
}

/// `in the heart of Coral Gables at coordinates 25.750000, -80.260000`, or
/// just the coordinate phrase outside the known areas
pub fn location_description(coords: Coordinates) -> String {
    let at = format!(
        "at coordinates {:.6}, {:.6}",
        coords.latitude, coords.longitude
    );
    match area_description(coords) {
        Some(area) => format!("{area} {at}"),
        None => at,
    }
}

/// Sentence describing the zoning, with a plain-language class for
/// residential, commercial and industrial codes
pub fn zoning_sentence(zoning: &str) -> String {
    let lower = zoning.to_lowercase();
    if lower.contains("residential") {
        format!("This is a residential property, zoned as {zoning}")
    } else if lower.contains("commercial") {
        format!("This is a commercial property, zoned as {zoning}")
    } else if lower.contains("industrial") {
        format!("This is an industrial facility, zoned as {zoning}")
    } else {
        format!("The property is zoned as {zoning}")
    }
}

/// Sentence describing the construction year
pub fn year_built_sentence(year: i32) -> String {
    if year < HISTORIC_BEFORE {
        format!("The building was constructed in {year}, making it a historic property")
    } else if year < MID_CENTURY_BEFORE {
        format!("The building was constructed in {year}")
    } else {
        format!("The building was built in {year}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_district_keywords() {
        assert!(community_context("250 Miracle Mile").contains("Miracle Mile district"));
        assert!(community_context("2300 PONCE DE LEON BLVD").contains("Miracle Mile"));
        assert!(community_context("1200 Anastasia Ave Biltmore").contains("Biltmore"));
        assert!(community_context("3 Snapper Creek Rd").contains("Gables by the Sea"));
        assert!(community_context("4000 CORAL WAY").contains("Coral Way"));
        assert_eq!(community_context("12 Alhambra Cir"), DEFAULT_COMMUNITY);
    }

    #[test]
    fn test_district_labels() {
        assert_eq!(district_label("120 MIRACLE MILE"), "Miracle Mile District");
        assert_eq!(district_label("1000 GRANADA BLVD"), "Biltmore Area");
        assert_eq!(district_label("4000 CORAL WAY"), "Coral Way");
        assert_eq!(district_label("12 Alhambra Cir"), "Coral Gables");
    }

    #[test]
    fn test_record_context() {
        let record = PropertyRecord::new(0);
        assert!(record_context(&record).is_none());
    }

    #[test]
    fn test_coordinate_areas() {
        assert_eq!(
            area_description(Coordinates::new(25.75, -80.26)),
            Some("in the heart of Coral Gables")
        );
        assert_eq!(
            area_description(Coordinates::new(25.65, -80.27)),
            Some("in the southern area of Coral Gables")
        );
        assert_eq!(
            area_description(Coordinates::new(25.72, -80.15)),
            Some("in the eastern section of Coral Gables")
        );
        assert_eq!(area_description(Coordinates::new(25.9, -80.1)), None);

        assert_eq!(
            location_description(Coordinates::new(25.75, -80.26)),
            "in the heart of Coral Gables at coordinates 25.750000, -80.260000"
        );
        assert_eq!(
            location_description(Coordinates::new(26.1, -80.14)),
            "at coordinates 26.100000, -80.140000"
        );
    }

    #[test]
    fn test_construction_year_phrasing() {
        assert_eq!(
            year_built_sentence(1926),
            "The building was constructed in 1926, making it a historic property"
        );
        assert_eq!(year_built_sentence(1962), "The building was constructed in 1962");
        assert_eq!(year_built_sentence(1998), "The building was built in 1998");
    }

    #[test]
    fn test_zoning_phrasing() {
        assert_eq!(
            zoning_sentence("Single Family Residential"),
            "This is a residential property, zoned as Single Family Residential"
        );
        assert!(zoning_sentence("Commercial Limited").starts_with("This is a commercial property"));
        assert!(zoning_sentence("INDUSTRIAL").starts_with("This is an industrial facility"));
        assert_eq!(zoning_sentence("MX1"), "The property is zoned as MX1");
    }
}
