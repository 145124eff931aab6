use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const UNKNOWN: &str = "Unknown";

const SOURCE_TO_COUNTRY: &[(&str, &str)] = &[
    ("aljazeera", "Qatar"),
    ("atlantic", "USA"),
    ("batimes", "Argentina"),
    ("bbc", "UK"),
    ("china_daily", "China"),
    ("cnn", "USA"),
    ("daily_nation", "Kenya"),
    ("daily_post", "Nigeria"),
    ("dailymail", "UK"),
    ("dw", "Germany"),
    ("economist", "UK"),
    ("folha", "Brazil"),
    ("fox", "USA"),
    ("guardian", "UK"),
    ("independent", "UK"),
    ("newshub", "New Zealand"),
    ("nytimes", "USA"),
    ("nzherald", "New Zealand"),
    ("skyau", "Australia"),
    ("stuff", "New Zealand"),
    ("washington_post", "USA"),
    ("yomiuri", "Japan"),
];

const COUNTRY_TO_REGION: &[(&str, &str)] = &[
    ("Qatar", "Middle East"),
    ("USA", "North America"),
    ("Argentina", "South America"),
    ("UK", "Europe"),
    ("China", "Asia"),
    ("Kenya", "Africa"),
    ("Nigeria", "Africa"),
    ("Germany", "Europe"),
    ("Brazil", "South America"),
    ("New Zealand", "Oceania"),
    ("Australia", "Oceania"),
    ("Japan", "Asia"),
];

/// Static source → country → region lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegionTable {
    source_to_country: BTreeMap<String, String>,
    country_to_region: BTreeMap<String, String>,
}

impl Default for RegionTable {
    fn default() -> Self {
        Self {
            source_to_country: owned_pairs(SOURCE_TO_COUNTRY),
            country_to_region: owned_pairs(COUNTRY_TO_REGION),
        }
    }
}

impl RegionTable {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse region table {}", path.display()))
    }

    /// Country and region for a source; each falls back to `Unknown`.
    pub fn locate(&self, source: &str) -> (String, String) {
        let country = self
            .source_to_country
            .get(source)
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string());
        let region = self
            .country_to_region
            .get(&country)
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string());
        (country, region)
    }
}

fn owned_pairs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_maps_known_sources_through_country_to_region() {
        let table = RegionTable::default();
        assert_eq!(
            table.locate("daily_nation"),
            ("Kenya".to_string(), "Africa".to_string())
        );
        assert_eq!(
            table.locate("skyau"),
            ("Australia".to_string(), "Oceania".to_string())
        );
    }

    #[test]
    fn locate_falls_back_to_unknown() {
        let table = RegionTable::default();
        assert_eq!(
            table.locate("local_gazette"),
            (UNKNOWN.to_string(), UNKNOWN.to_string())
        );
    }

    #[test]
    fn load_reads_json_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("regions.json");
        std::fs::write(
            &path,
            r#"{
              "source_to_country": {"lemonde": "France", "orphan": "Atlantis"},
              "country_to_region": {"France": "Europe"}
            }"#,
        )
        .expect("write regions");

        let table = RegionTable::load(&path).expect("regions load");
        assert_eq!(
            table.locate("lemonde"),
            ("France".to_string(), "Europe".to_string())
        );
        assert_eq!(
            table.locate("orphan"),
            ("Atlantis".to_string(), UNKNOWN.to_string())
        );
        assert_eq!(table.locate("bbc").0, UNKNOWN);
    }
}
