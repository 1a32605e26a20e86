//! Tables written by the bundled seeders

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{debug, info};

/// `(table, DDL)` in creation order; referenced tables come first
pub const TABLES: &[(&str, &str)] = &[
    (
        "User",
        r#"
CREATE TABLE IF NOT EXISTS "User" (
    "id" INTEGER NOT NULL,
    "name" TEXT NOT NULL,

    CONSTRAINT "User_pkey" PRIMARY KEY ("id")
)"#,
    ),
    (
        "EsriLandformPolygon",
        r#"
CREATE TABLE IF NOT EXISTS "EsriLandformPolygon" (
    "id" UUID NOT NULL,
    "featureCodeId" INTEGER NOT NULL,
    "gazId" INTEGER NOT NULL,
    "name" TEXT NOT NULL,
    "geoJSON" JSONB NOT NULL,

    CONSTRAINT "EsriLandformPolygon_pkey" PRIMARY KEY ("id")
)"#,
    ),
    (
        "UsState",
        r#"
CREATE TABLE IF NOT EXISTS "UsState" (
    "id" UUID NOT NULL,
    "fipsCode" TEXT NOT NULL,
    "alpha" TEXT NOT NULL,
    "name" TEXT NOT NULL,
    "shapeGeoJSON" JSONB NOT NULL,
    "districtOfColumbiaId" UUID,

    CONSTRAINT "UsState_pkey" PRIMARY KEY ("id")
)"#,
    ),
    (
        "UsCounty",
        r#"
CREATE TABLE IF NOT EXISTS "UsCounty" (
    "id" UUID NOT NULL,
    "stcoFipsCode" TEXT NOT NULL,
    "shortName" TEXT NOT NULL,
    "longName" TEXT NOT NULL,
    "deprecated" BOOLEAN NOT NULL DEFAULT false,
    "shapeGeoJSON" JSONB NOT NULL,
    "stateId" UUID,
    "districtOfColumbiaId" UUID,
    "territoryId" UUID,

    CONSTRAINT "UsCounty_pkey" PRIMARY KEY ("id"),
    CONSTRAINT "UsCounty_stateId_fkey" FOREIGN KEY ("stateId") REFERENCES "UsState"("id")
)"#,
    ),
];

/// Create every seeded table that does not exist yet
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    for (table, ddl) in TABLES {
        debug!(table, "Creating table");
        sqlx::query(*ddl)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create \"{}\" table", table))?;
    }

    info!(tables = TABLES.len(), "Schema initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(table: &str) -> usize {
        TABLES
            .iter()
            .position(|(name, _)| *name == table)
            .unwrap_or_else(|| panic!("no DDL for {}", table))
    }

    #[test]
    fn test_referenced_tables_created_first() {
        assert!(position("UsState") < position("UsCounty"));
    }

    #[test]
    fn test_ddl_is_idempotent() {
        for (table, ddl) in TABLES {
            assert!(
                ddl.contains(&format!("CREATE TABLE IF NOT EXISTS \"{}\"", table)),
                "{} DDL is not idempotent",
                table
            );
        }
    }
}
