use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Ordered schema steps. Versions are applied once each, in order.
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    r"
        CREATE TABLE IF NOT EXISTS state_slots (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    ",
)];

pub(super) async fn apply_pending(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
        ",
    )
    .execute(pool)
    .await?;

    let current: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await?;
    let current = current.unwrap_or(0);

    for &(version, statement) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
        let mut tx = pool.begin().await?;
        sqlx::query(statement).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)")
            .bind(version)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    Ok(())
}
