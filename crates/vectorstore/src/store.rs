use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use sentinel_common::types::AttackType;

use crate::vector::{attack_type_to_label, SecurityVector};
use crate::StoreError;

/// PostgreSQL + pgvector client for the security vector corpus.
pub struct VectorStore {
    pool: PgPool,
}

impl VectorStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        tracing::info!(
            url = %crate::mask_database_url(database_url),
            "connecting to vector store"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.health_check().await?;
        tracing::info!("vector store connection established");
        Ok(store)
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        tracing::info!("running vector store migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        tracing::info!("vector store migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert one vector. A duplicate `text_hash` is a no-op, not an
    /// error — the same prompt text seen twice shouldn't grow the corpus.
    pub async fn insert(&self, vector: &SecurityVector) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO security_vectors (id, text, text_hash, embedding, label_text, label, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (text_hash) DO NOTHING
            "#,
        )
        .bind(vector.id.0)
        .bind(&vector.text)
        .bind(&vector.text_hash)
        .bind(Vector::from(vector.embedding.clone()))
        .bind(vector.attack_type.as_str())
        .bind(attack_type_to_label(vector.attack_type))
        .bind(vector.created_at)
        .bind(vector.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    /// Insert a batch inside one transaction. Returns the number of rows
    /// actually inserted (excludes hash conflicts).
    pub async fn insert_batch(&self, vectors: &[SecurityVector]) -> Result<usize, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let mut inserted = 0usize;
        for vector in vectors {
            let result = sqlx::query(
                r#"
                INSERT INTO security_vectors (id, text, text_hash, embedding, label_text, label, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (text_hash) DO NOTHING
                "#,
            )
            .bind(vector.id.0)
            .bind(&vector.text)
            .bind(&vector.text_hash)
            .bind(Vector::from(vector.embedding.clone()))
            .bind(vector.attack_type.as_str())
            .bind(attack_type_to_label(vector.attack_type))
            .bind(vector.created_at)
            .bind(vector.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
            inserted += result.rows_affected() as usize;
        }
        tx.commit().await.map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(inserted)
    }

    /// Cosine-similarity search over the corpus, nearest first. Also
    /// records the search into the rolling stats row — callers don't
    /// need to do this separately.
    pub async fn find_similar(
        &self,
        query_embedding: &[f32],
        limit: i64,
    ) -> Result<Vec<(SecurityVector, f32)>, StoreError> {
        let started = std::time::Instant::now();
        let query_vec = Vector::from(query_embedding.to_vec());

        let rows = sqlx::query_as::<_, SecurityVectorRow>(
            r#"
            SELECT id, text, text_hash, embedding, label_text, created_at, updated_at,
                   1 - (embedding <=> $1::vector) AS similarity
            FROM security_vectors
            ORDER BY embedding <=> $1::vector
            LIMIT $2
            "#,
        )
        .bind(query_vec)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        self.record_search(started.elapsed().as_secs_f64() * 1000.0).await;

        Ok(rows.into_iter().map(|row| row.into_vector_and_score()).collect())
    }

    async fn record_search(&self, elapsed_ms: f64) {
        let result = sqlx::query(
            r#"
            UPDATE vector_search_stats
            SET avg_search_time_ms = (avg_search_time_ms * search_count + $1) / (search_count + 1),
                search_count = search_count + 1,
                updated_at = now()
            WHERE id = true
            "#,
        )
        .bind(elapsed_ms)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to update vector search stats");
        }
    }

    /// Below `threshold` rows, a sequential scan is fine and an ANN index
    /// would just be overhead to maintain. Above it, build an ivfflat
    /// index if one doesn't already exist.
    pub async fn create_index(&self, threshold: u64) -> Result<(), StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM security_vectors")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        if (count as u64) < threshold {
            tracing::debug!(count, threshold, "corpus below ANN index threshold, skipping");
            return Ok(());
        }

        tracing::info!(count, "building ivfflat index on security_vectors");
        sqlx::query(
            "CREATE INDEX CONCURRENTLY IF NOT EXISTS security_vectors_embedding_idx \
             ON security_vectors USING ivfflat (embedding vector_cosine_ops)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    pub async fn get_stats(&self) -> Result<VectorStoreStats, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM security_vectors")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let row: Option<(i64, f64)> = sqlx::query_as(
            "SELECT search_count, avg_search_time_ms FROM vector_search_stats WHERE id = true",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let (search_count, avg_search_time_ms) = row.unwrap_or((0, 0.0));

        Ok(VectorStoreStats {
            total_vectors: total as u64,
            search_count: search_count as u64,
            avg_search_time_ms,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct VectorStoreStats {
    pub total_vectors: u64,
    pub search_count: u64,
    pub avg_search_time_ms: f64,
}

#[derive(sqlx::FromRow)]
struct SecurityVectorRow {
    id: Uuid,
    text: String,
    text_hash: String,
    embedding: Vector,
    label_text: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    similarity: f32,
}

impl SecurityVectorRow {
    fn into_vector_and_score(self) -> (SecurityVector, f32) {
        let vector = SecurityVector {
            id: sentinel_common::ids::VectorId::from_uuid(self.id),
            text: self.text,
            text_hash: self.text_hash,
            embedding: self.embedding.to_vec(),
            attack_type: AttackType::from_label(&self.label_text),
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (vector, self.similarity)
    }
}
