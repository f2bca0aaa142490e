//! Static country → continent lookup.
//!
//! The built-in table covers ISO 3166 alpha-2 codes and the common English
//! country names; a JSON object can extend or override it.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ConsolidateError, Result};
use crate::models::ConsolidatedDataset;

const AFRICA: &str = "Africa";
const ASIA: &str = "Asia";
const EUROPE: &str = "Europe";
const NORTH_AMERICA: &str = "North America";
const SOUTH_AMERICA: &str = "South America";
const OCEANIA: &str = "Oceania";

/// (alpha-2 code, English name, continent).
const COUNTRIES: &[(&str, &str, &str)] = &[
    // Africa
    ("DZ", "Algeria", AFRICA),
    ("AO", "Angola", AFRICA),
    ("BJ", "Benin", AFRICA),
    ("BW", "Botswana", AFRICA),
    ("BF", "Burkina Faso", AFRICA),
    ("CM", "Cameroon", AFRICA),
    ("CI", "Ivory Coast", AFRICA),
    ("CD", "Democratic Republic of the Congo", AFRICA),
    ("EG", "Egypt", AFRICA),
    ("ET", "Ethiopia", AFRICA),
    ("GH", "Ghana", AFRICA),
    ("KE", "Kenya", AFRICA),
    ("MA", "Morocco", AFRICA),
    ("MZ", "Mozambique", AFRICA),
    ("NA", "Namibia", AFRICA),
    ("NG", "Nigeria", AFRICA),
    ("RW", "Rwanda", AFRICA),
    ("SN", "Senegal", AFRICA),
    ("ZA", "South Africa", AFRICA),
    ("TZ", "Tanzania", AFRICA),
    ("TN", "Tunisia", AFRICA),
    ("UG", "Uganda", AFRICA),
    ("ZM", "Zambia", AFRICA),
    ("ZW", "Zimbabwe", AFRICA),
    // Asia
    ("AE", "United Arab Emirates", ASIA),
    ("BD", "Bangladesh", ASIA),
    ("CN", "China", ASIA),
    ("HK", "Hong Kong", ASIA),
    ("ID", "Indonesia", ASIA),
    ("IL", "Israel", ASIA),
    ("IN", "India", ASIA),
    ("JP", "Japan", ASIA),
    ("KR", "South Korea", ASIA),
    ("KZ", "Kazakhstan", ASIA),
    ("LK", "Sri Lanka", ASIA),
    ("MY", "Malaysia", ASIA),
    ("PH", "Philippines", ASIA),
    ("PK", "Pakistan", ASIA),
    ("QA", "Qatar", ASIA),
    ("SA", "Saudi Arabia", ASIA),
    ("SG", "Singapore", ASIA),
    ("TH", "Thailand", ASIA),
    ("TW", "Taiwan", ASIA),
    ("VN", "Vietnam", ASIA),
    // Europe
    ("AT", "Austria", EUROPE),
    ("BE", "Belgium", EUROPE),
    ("BG", "Bulgaria", EUROPE),
    ("CH", "Switzerland", EUROPE),
    ("CZ", "Czech Republic", EUROPE),
    ("DE", "Germany", EUROPE),
    ("DK", "Denmark", EUROPE),
    ("EE", "Estonia", EUROPE),
    ("ES", "Spain", EUROPE),
    ("FI", "Finland", EUROPE),
    ("FR", "France", EUROPE),
    ("GB", "United Kingdom", EUROPE),
    ("GR", "Greece", EUROPE),
    ("HR", "Croatia", EUROPE),
    ("HU", "Hungary", EUROPE),
    ("IE", "Ireland", EUROPE),
    ("IS", "Iceland", EUROPE),
    ("IT", "Italy", EUROPE),
    ("LT", "Lithuania", EUROPE),
    ("LU", "Luxembourg", EUROPE),
    ("LV", "Latvia", EUROPE),
    ("NL", "Netherlands", EUROPE),
    ("NO", "Norway", EUROPE),
    ("PL", "Poland", EUROPE),
    ("PT", "Portugal", EUROPE),
    ("RO", "Romania", EUROPE),
    ("RS", "Serbia", EUROPE),
    ("SE", "Sweden", EUROPE),
    ("SI", "Slovenia", EUROPE),
    ("SK", "Slovakia", EUROPE),
    ("TR", "Turkey", EUROPE),
    ("UA", "Ukraine", EUROPE),
    // North America
    ("CA", "Canada", NORTH_AMERICA),
    ("CR", "Costa Rica", NORTH_AMERICA),
    ("CU", "Cuba", NORTH_AMERICA),
    ("DO", "Dominican Republic", NORTH_AMERICA),
    ("GT", "Guatemala", NORTH_AMERICA),
    ("JM", "Jamaica", NORTH_AMERICA),
    ("MX", "Mexico", NORTH_AMERICA),
    ("PA", "Panama", NORTH_AMERICA),
    ("US", "United States", NORTH_AMERICA),
    // South America
    ("AR", "Argentina", SOUTH_AMERICA),
    ("BO", "Bolivia", SOUTH_AMERICA),
    ("BR", "Brazil", SOUTH_AMERICA),
    ("CL", "Chile", SOUTH_AMERICA),
    ("CO", "Colombia", SOUTH_AMERICA),
    ("EC", "Ecuador", SOUTH_AMERICA),
    ("PE", "Peru", SOUTH_AMERICA),
    ("PY", "Paraguay", SOUTH_AMERICA),
    ("UY", "Uruguay", SOUTH_AMERICA),
    ("VE", "Venezuela", SOUTH_AMERICA),
    // Oceania
    ("AU", "Australia", OCEANIA),
    ("FJ", "Fiji", OCEANIA),
    ("NZ", "New Zealand", OCEANIA),
    ("PG", "Papua New Guinea", OCEANIA),
];

/// Country (code or name) → continent name.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinentMap {
    map: HashMap<String, String>,
}

impl Default for ContinentMap {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ContinentMap {
    /// The built-in table, keyed by both alpha-2 code and English name.
    pub fn builtin() -> Self {
        let mut map = HashMap::with_capacity(COUNTRIES.len() * 2);
        for &(code, name, continent) in COUNTRIES {
            map.insert(code.to_string(), continent.to_string());
            map.insert(name.to_string(), continent.to_string());
        }
        Self { map }
    }

    /// A table holding only `entries`.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            map: entries.into_iter().collect(),
        }
    }

    /// Merge a JSON object of `country → continent` on top of this table.
    pub fn extend_from_json(&mut self, json: &str) -> Result<usize> {
        let overrides: HashMap<String, String> = serde_json::from_str(json)?;
        let added = overrides.len();
        self.map.extend(overrides);
        Ok(added)
    }

    /// Built-in table extended with the JSON object stored at `path`.
    pub fn builtin_with_overrides(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConsolidateError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut map = Self::builtin();
        let added = map.extend_from_json(&content)?;
        tracing::info!(
            "Loaded {} continent overrides from {}",
            added,
            path.display()
        );
        Ok(map)
    }

    pub fn get(&self, country: &str) -> Option<&str> {
        self.map.get(country).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Set `Continent` on every row. Unmapped or missing countries stay `None`.
    pub fn apply(&self, dataset: &mut ConsolidatedDataset) {
        for row in &mut dataset.rows {
            row.continent = row
                .country
                .as_deref()
                .and_then(|c| self.get(c))
                .map(str::to_string);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
