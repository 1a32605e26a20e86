use anyhow::Result;
use serde::Deserialize;
use sqlseed::{Batch, SqlValue, TaskSpec};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use super::{parse_line, Feature};

const ESRI_LANDFORM_POLYGON_NAMESPACE: Uuid =
    Uuid::from_u128(0xe0fefc56_9345_439a_a85e_164e447dfa2a);

const UPSERT_ESRI_LANDFORM_POLYGON: &str = r#"
INSERT INTO "EsriLandformPolygon" ("id", "name", "featureCodeId", "gazId", "geoJSON")
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT ("id") DO UPDATE SET
    "name" = $2,
    "featureCodeId" = $3,
    "gazId" = $4,
    "geoJSON" = $5
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct Properties {
    permanent_identifier: String,
    name: String,
    fcode: i32,
    gaz_id: i32,
}

pub fn esri_landform_polygon_id(permanent_identifier: &str) -> Uuid {
    Uuid::new_v5(&ESRI_LANDFORM_POLYGON_NAMESPACE, permanent_identifier.as_bytes())
}

/// Seeds `"EsriLandformPolygon"` from GeoJSON features
pub fn esri_landform_polygons(path: impl Into<PathBuf>) -> TaskSpec {
    TaskSpec::new(path, Arc::new(handle_esri_landform_polygon))
}

pub fn handle_esri_landform_polygon(batch: &mut Batch, line: &[u8]) -> Result<()> {
    let feature: Feature<Properties> = parse_line(line, "landform polygon feature")?;
    let props = feature.properties;

    batch.queue(
        UPSERT_ESRI_LANDFORM_POLYGON,
        [
            SqlValue::from(esri_landform_polygon_id(&props.permanent_identifier)),
            SqlValue::from(props.name),
            SqlValue::from(props.fcode),
            SqlValue::from(props.gaz_id),
            SqlValue::from(feature.geometry),
        ],
    );
    Ok(())
}
