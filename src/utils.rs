use sqlx::SqlitePool;

pub(crate) async fn is_table_exists(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<bool, sqlx::Error> {
    Ok(
        sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?
            .is_some(),
    )
}

/// Seconds since the epoch, the unit of every stored timestamp.
pub(crate) fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

pub(crate) fn days_ago(days: u32) -> i64 {
    (chrono::Utc::now() - chrono::Duration::days(i64::from(days))).timestamp()
}
