use anyhow::Result;
use serde::Deserialize;
use sqlseed::{Batch, SqlValue, TaskSpec};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use super::{parse_line, us_state_id, Feature};

const US_COUNTY_NAMESPACE: Uuid = Uuid::from_u128(0x8b3fa54b_f47d_4e85_a177_962ce30129cf);

/// Postal abbreviations of territories; their counties have no state row
pub const TERRITORY_ABBREVIATIONS: [&str; 5] = ["GU", "PR", "VI", "AS", "MP"];

const DISTRICT_OF_COLUMBIA: &str = "DC";

const UPSERT_US_COUNTY: &str = r#"
INSERT INTO "UsCounty" (
    "id", "stateId", "territoryId", "stcoFipsCode",
    "longName", "shortName", "shapeGeoJSON", "deprecated"
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT ("id") DO UPDATE SET
    "stateId" = $2,
    "territoryId" = $3,
    "stcoFipsCode" = $4,
    "longName" = $5,
    "shortName" = $6,
    "shapeGeoJSON" = $7,
    "deprecated" = $8
"#;

#[derive(Debug, Deserialize)]
struct Properties {
    stusab: String,
    geoid: String,
    namelsad: String,
    name: String,
}

/// Stable id of a county from its long name ("Los Angeles County") and
/// state abbreviation
pub fn us_county_id(long_name: &str, state_abbr: &str) -> Uuid {
    Uuid::new_v5(
        &US_COUNTY_NAMESPACE,
        format!("{},{}", long_name, state_abbr).as_bytes(),
    )
}

/// Seeds `"UsCounty"` from GeoJSON features. Must run after the states.
pub fn us_counties(path: impl Into<PathBuf>) -> TaskSpec {
    TaskSpec::new(path, Arc::new(handle_us_county))
}

pub fn handle_us_county(batch: &mut Batch, line: &[u8]) -> Result<()> {
    let feature: Feature<Properties> = parse_line(line, "US county feature")?;
    let props = feature.properties;

    let state_id = state_id_for(&props.stusab);

    batch.queue(
        UPSERT_US_COUNTY,
        [
            SqlValue::from(us_county_id(&props.namelsad, &props.stusab)),
            SqlValue::from(state_id),
            SqlValue::Uuid(None),
            SqlValue::from(props.geoid),
            SqlValue::from(props.namelsad),
            SqlValue::from(props.name),
            SqlValue::from(feature.geometry),
            SqlValue::from(false),
        ],
    );
    Ok(())
}

fn state_id_for(state_abbr: &str) -> Option<Uuid> {
    if state_abbr == DISTRICT_OF_COLUMBIA || TERRITORY_ABBREVIATIONS.contains(&state_abbr) {
        None
    } else {
        Some(us_state_id(state_abbr))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn county_line(stusab: &str) -> String {
        json!({
            "properties": {
                "stusab": stusab,
                "geoid": "06037",
                "namelsad": "Los Angeles County",
                "name": "Los Angeles"
            },
            "geometry": {"type": "Polygon", "coordinates": []}
        })
        .to_string()
    }

    fn queue(line: &str) -> Vec<SqlValue> {
        let mut batch = Batch::new();
        handle_us_county(&mut batch, line.as_bytes()).unwrap();
        assert_eq!(batch.len(), 1);
        batch.queries()[0].arguments().to_vec()
    }

    #[test]
    fn test_county_id_is_deterministic() {
        assert_eq!(
            us_county_id("Los Angeles County", "CA").to_string(),
            "33b88b9f-4a75-5e99-9bc5-6ed706d16bf4"
        );
        assert_ne!(
            us_county_id("Washington County", "OR"),
            us_county_id("Washington County", "UT")
        );
    }

    #[test]
    fn test_state_county_links_to_state() {
        let args = queue(&county_line("CA"));

        assert_eq!(args[0], SqlValue::from(us_county_id("Los Angeles County", "CA")));
        assert_eq!(args[1], SqlValue::from(us_state_id("CA")));
        assert_eq!(args[2], SqlValue::Uuid(None));
        assert_eq!(args[3], SqlValue::from("06037"));
        assert_eq!(args[4], SqlValue::from("Los Angeles County"));
        assert_eq!(args[5], SqlValue::from("Los Angeles"));
        assert_eq!(args[7], SqlValue::Bool(Some(false)));
    }

    #[test]
    fn test_territories_and_dc_have_no_state() {
        for abbr in TERRITORY_ABBREVIATIONS.iter().chain(&[DISTRICT_OF_COLUMBIA]) {
            let args = queue(&county_line(abbr));
            assert!(args[1].is_null(), "{} county got a state id", abbr);
        }
    }
}
