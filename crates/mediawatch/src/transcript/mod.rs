//! Transcript store: the single append-only `(timestamp, speaker, word)`
//! table the external speech extractor writes into and operators query
//! offline. Everything beyond this one table (full-text search, speaker
//! identity management) is out of scope.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::errors::CoreResult;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TranscriptWord {
    pub timestamp: DateTime<Utc>,
    pub speaker: String,
    pub word: String,
}

#[derive(Clone)]
pub struct TranscriptStore {
    pool: SqlitePool,
}

impl TranscriptStore {
    pub async fn connect(database_path: &str) -> CoreResult<Self> {
        let url = format!("sqlite://{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new().max_connections(5).connect(&url).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS transcript_words (
                timestamp TEXT NOT NULL,
                speaker TEXT NOT NULL,
                word TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_transcript_words_timestamp ON transcript_words(timestamp)")
            .execute(&pool)
            .await?;
        Ok(Self { pool })
    }

    pub async fn insert_word(&self, timestamp: DateTime<Utc>, speaker: &str, word: &str) -> CoreResult<()> {
        sqlx::query("INSERT INTO transcript_words (timestamp, speaker, word) VALUES (?, ?, ?)")
            .bind(timestamp.to_rfc3339())
            .bind(speaker)
            .bind(word)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn words_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> CoreResult<Vec<TranscriptWord>> {
        let rows = sqlx::query_as::<_, TranscriptWord>(
            "SELECT timestamp, speaker, word FROM transcript_words
             WHERE timestamp >= ? AND timestamp <= ?
             ORDER BY timestamp ASC",
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
