use crate::{
    error::ScrapeError,
    listing::ListingRecord,
    utils::{days_ago, is_table_exists, now_timestamp},
};
use futures::TryStreamExt;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::path::Path;
use tracing::debug;

const SEEN_TABLE: &str = "seen_listings";

/// Listings already notified, keyed by URL, so a later run only reports what
/// is new.
pub struct SeenStore {
    pool: SqlitePool,
}

impl SeenStore {
    pub async fn new(path: &Path) -> Result<SeenStore, ScrapeError> {
        let opt = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        SeenStore::connect_with(opt).await
    }

    pub async fn connect_with(opt: SqliteConnectOptions) -> Result<SeenStore, ScrapeError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opt)
            .await?;
        let store = SeenStore { pool };

        if !is_table_exists(&store.pool, SEEN_TABLE).await? {
            store.create_table().await?;
        }

        Ok(store)
    }

    async fn create_table(&self) -> Result<(), ScrapeError> {
        let query = format!(
            r#"
                CREATE TABLE {} (
                    url TEXT PRIMARY KEY,
                    developer TEXT,
                    name TEXT,
                    seen_at INTEGER
                )
            "#,
            SEEN_TABLE
        );
        sqlx::query(query.as_str()).execute(&self.pool).await?;
        debug!("Created {}", SEEN_TABLE);
        Ok(())
    }

    pub async fn is_seen<S: AsRef<str>>(&self, url: S) -> Result<bool, ScrapeError> {
        let query = format!("SELECT url FROM {} WHERE url = ?", SEEN_TABLE);
        Ok(sqlx::query(&query)
            .bind(url.as_ref().trim())
            .fetch_optional(&self.pool)
            .await?
            .is_some())
    }

    pub async fn insert(&self, record: &ListingRecord) -> Result<(), ScrapeError> {
        self.insert_at(record, now_timestamp()).await
    }

    async fn insert_at(&self, record: &ListingRecord, seen_at: i64) -> Result<(), ScrapeError> {
        let query = format!(
            "INSERT OR IGNORE INTO {} (url, developer, name, seen_at) VALUES (?, ?, ?, ?)",
            SEEN_TABLE
        );
        sqlx::query(&query)
            .bind(record.url.trim())
            .bind(record.developer)
            .bind(record.name.as_str())
            .bind(seen_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Drops the records already in the store, keeping the order.
    pub async fn unseen(
        &self,
        records: Vec<ListingRecord>,
    ) -> Result<Vec<ListingRecord>, ScrapeError> {
        let mut fresh = Vec::with_capacity(records.len());
        for record in records {
            if self.is_seen(&record.url).await? {
                debug!("Already notified {}", record.url);
            } else {
                fresh.push(record);
            }
        }
        Ok(fresh)
    }

    pub async fn urls(&self) -> Result<Vec<String>, ScrapeError> {
        let mut urls: Vec<String> = vec![];
        let query = format!("SELECT url FROM {} ORDER BY seen_at", SEEN_TABLE);
        let mut rows = sqlx::query(&query).fetch(&self.pool);
        while let Some(row) = rows.try_next().await? {
            urls.push(row.try_get("url")?);
        }

        Ok(urls)
    }

    /// Removes rows first seen more than `days` days ago, returns how many.
    pub async fn prune_older_than(&self, days: u32) -> Result<u64, ScrapeError> {
        let query = format!("DELETE FROM {} WHERE seen_at < ?", SEEN_TABLE);
        let done = sqlx::query(&query)
            .bind(days_ago(days))
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    pub async fn count(&self) -> Result<i64, ScrapeError> {
        let query = format!("SELECT COUNT(*) AS n FROM {}", SEEN_TABLE);
        let row = sqlx::query(&query).fetch_one(&self.pool).await?;
        Ok(row.try_get("n")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Status;
    use pretty_assertions::assert_eq;

    async fn store() -> SeenStore {
        let opt: SqliteConnectOptions = "sqlite::memory:".parse().expect("valid options");
        SeenStore::connect_with(opt).await.expect("in-memory store")
    }

    fn record(url: &str) -> ListingRecord {
        ListingRecord {
            developer: "AEDAS",
            name: "Turia".to_string(),
            location: "Valencia".to_string(),
            price: Some(249_000),
            bedrooms: Some(3),
            status: Status::OnSale,
            label: None,
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn seen_urls_are_filtered_out() {
        let store = store().await;
        store.insert(&record("https://a.es/1")).await.unwrap();
        store.insert(&record("https://a.es/1")).await.unwrap();

        assert!(store.is_seen("https://a.es/1").await.unwrap());
        assert!(!store.is_seen("https://a.es/2").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);

        let fresh = store
            .unseen(vec![record("https://a.es/1"), record("https://a.es/2")])
            .await
            .unwrap();
        assert_eq!(fresh, vec![record("https://a.es/2")]);
    }

    #[tokio::test]
    async fn pruning_keeps_recent_rows() {
        let store = store().await;
        store
            .insert_at(&record("https://a.es/old"), days_ago(10))
            .await
            .unwrap();
        store.insert(&record("https://a.es/new")).await.unwrap();

        assert_eq!(store.prune_older_than(7).await.unwrap(), 1);
        assert_eq!(store.urls().await.unwrap(), vec!["https://a.es/new"]);
    }
}
