//! Bundled seeders
//!
//! Each seeder turns one JSON line of its dataset into an upsert. The
//! GeoJSON-backed seeders derive row ids with UUIDv5 so that a parent and
//! its children agree on keys without looking anything up.

mod esri_landform_polygons;
mod us_counties;
mod us_states;
mod users;

pub use esri_landform_polygons::{
    esri_landform_polygon_id, esri_landform_polygons, handle_esri_landform_polygon,
};
pub use us_counties::{handle_us_county, us_counties, us_county_id, TERRITORY_ABBREVIATIONS};
pub use us_states::{handle_us_state, us_state_id, us_states};
pub use users::{handle_user, users};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sqlseed::TaskSpec;
use std::path::Path;

pub const USERS_FILE: &str = "users.gz";
pub const US_STATES_FILE: &str = "us-states.gz";
pub const US_COUNTIES_FILE: &str = "us-counties.gz";
pub const ESRI_LANDFORM_POLYGONS_FILE: &str = "esri-landform-polygons.gz";

/// The seeding forest for a data directory.
///
/// Counties reference states, so they run as a child of the states seeder.
/// Users and landform polygons are independent roots.
pub fn default_tree(data_dir: impl AsRef<Path>) -> Vec<TaskSpec> {
    let dir = data_dir.as_ref();

    vec![
        users(dir.join(USERS_FILE)),
        us_states(dir.join(US_STATES_FILE)).with_child(us_counties(dir.join(US_COUNTIES_FILE))),
        esri_landform_polygons(dir.join(ESRI_LANDFORM_POLYGONS_FILE)),
    ]
}

/// A GeoJSON feature with typed properties and opaque geometry
#[derive(Debug, Deserialize)]
struct Feature<P> {
    properties: P,
    #[serde(default)]
    geometry: serde_json::Value,
}

fn parse_line<T: DeserializeOwned>(line: &[u8], what: &str) -> Result<T> {
    serde_json::from_slice(line).with_context(|| format!("Failed to parse {} from line", what))
}
