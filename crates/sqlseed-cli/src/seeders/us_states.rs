use anyhow::Result;
use serde::Deserialize;
use sqlseed::{Batch, SqlValue, TaskSpec};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use super::{parse_line, Feature};

const US_STATE_NAMESPACE: Uuid = Uuid::from_u128(0xcf8fa300_d478_4b1d_8c2c_60db1ef1c6c8);

const UPSERT_US_STATE: &str = r#"
INSERT INTO "UsState" ("id", "alpha", "name", "fipsCode", "shapeGeoJSON")
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT ("id") DO UPDATE SET
    "alpha" = $2,
    "name" = $3,
    "fipsCode" = $4,
    "shapeGeoJSON" = $5
"#;

#[derive(Debug, Deserialize)]
struct Properties {
    alpha: String,
    name: String,
    #[serde(rename = "fips-code")]
    fips_code: String,
}

/// Stable id of the state with postal abbreviation `alpha`
pub fn us_state_id(alpha: &str) -> Uuid {
    Uuid::new_v5(&US_STATE_NAMESPACE, alpha.as_bytes())
}

/// Seeds `"UsState"` from GeoJSON features
pub fn us_states(path: impl Into<PathBuf>) -> TaskSpec {
    TaskSpec::new(path, Arc::new(handle_us_state))
}

pub fn handle_us_state(batch: &mut Batch, line: &[u8]) -> Result<()> {
    let feature: Feature<Properties> = parse_line(line, "US state feature")?;
    let props = feature.properties;

    batch.queue(
        UPSERT_US_STATE,
        [
            SqlValue::from(us_state_id(&props.alpha)),
            SqlValue::from(props.alpha),
            SqlValue::from(props.name),
            SqlValue::from(props.fips_code),
            SqlValue::from(feature.geometry),
        ],
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_id_is_deterministic() {
        assert_eq!(
            us_state_id("CA").to_string(),
            "55b28c8e-0e78-55a2-8930-5692ab5b2e94"
        );
        assert_eq!(us_state_id("CA"), us_state_id("CA"));
        assert_ne!(us_state_id("CA"), us_state_id("NV"));
    }

    #[test]
    fn test_queues_upsert_with_geometry() {
        let line = json!({
            "type": "Feature",
            "properties": {"alpha": "CA", "name": "California", "fips-code": "06"},
            "geometry": {"type": "Point", "coordinates": [-119.4, 36.7]}
        })
        .to_string();

        let mut batch = Batch::new();
        handle_us_state(&mut batch, line.as_bytes()).unwrap();

        let args = batch.queries()[0].arguments();
        assert_eq!(args[0], SqlValue::from(us_state_id("CA")));
        assert_eq!(args[1], SqlValue::from("CA"));
        assert_eq!(args[3], SqlValue::from("06"));
        assert_eq!(
            args[4],
            SqlValue::from(json!({"type": "Point", "coordinates": [-119.4, 36.7]}))
        );
    }

    #[test]
    fn test_missing_geometry_is_json_null() {
        let line = br#"{"properties": {"alpha": "CA", "name": "California", "fips-code": "06"}}"#;

        let mut batch = Batch::new();
        handle_us_state(&mut batch, line).unwrap();

        assert_eq!(batch.queries()[0].arguments()[4], SqlValue::Json(Some(serde_json::Value::Null)));
    }
}
