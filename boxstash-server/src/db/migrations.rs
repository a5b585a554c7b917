//! Schema migrations for boxes and items
//!
//! Idempotent: every statement uses `IF NOT EXISTS`, so this runs on each startup.

use sqlx::PgPool;

use super::DbError;

const STATEMENTS: &[(&str, &str)] = &[
    (
        "boxes",
        r#"
        CREATE TABLE IF NOT EXISTS boxes (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL CHECK (length(btrim(name)) > 0),
            location VARCHAR(255),
            description TEXT,
            nfc_id VARCHAR(255),
            capacity INTEGER NOT NULL DEFAULT 0 CHECK (capacity >= 0),
            current_items INTEGER NOT NULL DEFAULT 0 CHECK (current_items >= 0),
            image_url VARCHAR(500),
            scan_count INTEGER NOT NULL DEFAULT 0,
            last_scanned TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT boxes_nfc_id_key UNIQUE (nfc_id)
        )
        "#,
    ),
    (
        "items",
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL CHECK (length(btrim(name)) > 0),
            description TEXT,
            box_id UUID,
            category VARCHAR(100) NOT NULL DEFAULT 'other',
            quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity >= 0),
            unit VARCHAR(32) NOT NULL DEFAULT 'pcs',
            low_stock_threshold INTEGER NOT NULL DEFAULT 1 CHECK (low_stock_threshold >= 0),
            status TEXT GENERATED ALWAYS AS (
                CASE
                    WHEN quantity <= 0 THEN 'empty'
                    WHEN quantity <= low_stock_threshold THEN 'low'
                    ELSE 'sufficient'
                END
            ) STORED,
            condition_status TEXT NOT NULL DEFAULT 'good'
                CHECK (condition_status IN ('excellent', 'good', 'fair', 'poor')),
            purchase_date DATE,
            purchase_price DOUBLE PRECISION CHECK (purchase_price >= 0),
            warranty_until DATE,
            tags TEXT[] NOT NULL DEFAULT '{}',
            specifications JSONB NOT NULL DEFAULT '{}'::jsonb,
            notes TEXT,
            photos JSONB NOT NULL DEFAULT '[]'::jsonb,
            documents JSONB NOT NULL DEFAULT '[]'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT items_box_id_fkey FOREIGN KEY (box_id)
                REFERENCES boxes(id) ON DELETE RESTRICT
        )
        "#,
    ),
    (
        "boxes_updated_at_idx",
        "CREATE INDEX IF NOT EXISTS boxes_updated_at_idx ON boxes (updated_at DESC)",
    ),
    (
        "boxes_location_idx",
        "CREATE INDEX IF NOT EXISTS boxes_location_idx ON boxes (location)",
    ),
    (
        "items_box_id_idx",
        "CREATE INDEX IF NOT EXISTS items_box_id_idx ON items (box_id)",
    ),
    (
        "items_category_idx",
        "CREATE INDEX IF NOT EXISTS items_category_idx ON items (category)",
    ),
    (
        "items_status_idx",
        "CREATE INDEX IF NOT EXISTS items_status_idx ON items (status)",
    ),
    (
        "items_updated_at_idx",
        "CREATE INDEX IF NOT EXISTS items_updated_at_idx ON items (updated_at DESC)",
    ),
    (
        "items_created_at_idx",
        "CREATE INDEX IF NOT EXISTS items_created_at_idx ON items (created_at DESC)",
    ),
    (
        "items_tags_idx",
        "CREATE INDEX IF NOT EXISTS items_tags_idx ON items USING GIN (tags)",
    ),
];

/// Run all migrations in order
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("running migrations");

    for (name, sql) in STATEMENTS {
        tracing::debug!(migration = name, "applying");
        sqlx::query(sql).execute(pool).await?;
    }

    tracing::info!(count = STATEMENTS.len(), "migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_are_idempotent() {
        for (name, sql) in STATEMENTS {
            assert!(sql.contains("IF NOT EXISTS"), "{name} is not idempotent");
        }
    }

    #[test]
    fn constraint_names_match_error_mapping() {
        let all: String = STATEMENTS.iter().map(|(_, sql)| *sql).collect();
        assert!(all.contains(super::super::error::NFC_UNIQUE_CONSTRAINT));
        assert!(all.contains(super::super::error::ITEM_BOX_FK));
    }
}
