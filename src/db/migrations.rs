use anyhow::{bail, Context, Result};
use rusqlite::Connection;

const CURRENT_SCHEMA_VERSION: i32 = 1;

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS decisions (
    document_id TEXT NOT NULL,
    target_id   INTEGER NOT NULL,
    character   TEXT NOT NULL,
    reliability REAL NOT NULL,
    decided_at  TEXT NOT NULL,
    PRIMARY KEY (document_id, target_id)
);

CREATE INDEX IF NOT EXISTS idx_decisions_document ON decisions(document_id);
";

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version > CURRENT_SCHEMA_VERSION {
        bail!(
            "database version ({}) is newer than supported schema ({})",
            version,
            CURRENT_SCHEMA_VERSION
        );
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        match next_version {
            1 => tx
                .execute_batch(SCHEMA_V1)
                .context("failed to apply schema v1")?,
            _ => bail!("unknown migration target version: {next_version}"),
        }
        version = next_version;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    Ok(())
}
