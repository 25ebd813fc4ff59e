use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use pgvector::{Vector, VectorExpressionMethods};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::repositories::vector_store::check_point_shape;
use crate::domain::repositories::{
    CollectionInfo, CollectionStatus, ScoredPoint, StoredPoint, VectorStore, VectorStoreError,
};
use crate::domain::value_objects::{ContentHash, EmbeddingVector, ModelTag};
use crate::infrastructure::database::DbPool;
use crate::infrastructure::database::models::{
    CollectionModel, NewCollectionModel, NewPointModel, PointModel,
};
use crate::infrastructure::database::schema::{vector_collections, vector_points};

const CREATE_HASH_INDEX: &str = "CREATE INDEX IF NOT EXISTS vector_points_content_hash_idx \
     ON vector_points (collection, content_hash)";

/// pgvector-backed store. Every query runs on the blocking pool with its own
/// pooled connection.
pub struct PostgresVectorStore {
    pool: DbPool,
    hash_index: OnceCell<()>,
}

impl PostgresVectorStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            hash_index: OnceCell::new(),
        }
    }

    /// Two processes racing on `CREATE INDEX IF NOT EXISTS` can both miss the
    /// catalog check; the loser sees a unique violation on the index name.
    async fn ensure_hash_index(&self) -> Result<(), VectorStoreError> {
        self.hash_index
            .get_or_try_init(|| async {
                self.run("create content hash index", |conn| {
                    match diesel::sql_query(CREATE_HASH_INDEX).execute(conn) {
                        Ok(_) => Ok(()),
                        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                })
                .await
            })
            .await?;
        Ok(())
    }

    async fn run<T, F>(&self, action: &'static str, query: F) -> Result<T, VectorStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                VectorStoreError::Database(format!("Failed to get database connection: {}", e))
            })?;
            query(&mut conn)
                .map_err(|e| VectorStoreError::Database(format!("Failed to {}: {}", action, e)))
        })
        .await
        .map_err(|e| VectorStoreError::Database(format!("Task join error: {}", e)))?
    }

    async fn require_collection(&self, collection: &str) -> Result<CollectionInfo, VectorStoreError> {
        self.collection_info(collection)
            .await?
            .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.to_string()))
    }
}

fn check_shape(
    collection: &str,
    info: &CollectionInfo,
    dimension: usize,
    model: &ModelTag,
) -> Result<(), VectorStoreError> {
    if info.dimension != dimension {
        return Err(VectorStoreError::DimensionMismatch {
            collection: collection.to_string(),
            expected: info.dimension,
            actual: dimension,
        });
    }
    if &info.model != model {
        return Err(VectorStoreError::ModelMismatch {
            collection: collection.to_string(),
            expected: info.model.to_string(),
            actual: model.to_string(),
        });
    }
    Ok(())
}

/// Collapses repeated ids, keeping the last write and the first position.
fn dedupe_last_wins(points: Vec<StoredPoint>) -> Vec<StoredPoint> {
    let mut slots: HashMap<Uuid, usize> = HashMap::new();
    let mut unique: Vec<StoredPoint> = Vec::with_capacity(points.len());
    for point in points {
        match slots.get(&point.id) {
            Some(&slot) => unique[slot] = point,
            None => {
                slots.insert(point.id, unique.len());
                unique.push(point);
            }
        }
    }
    unique
}

/// Scores come from the stored vectors so both backends agree on values;
/// the database only decides the order.
fn score_rows(
    query: &EmbeddingVector,
    rows: Vec<PointModel>,
) -> Result<Vec<ScoredPoint>, VectorStoreError> {
    rows.into_iter()
        .map(|row| {
            let point = StoredPoint::try_from(row)?;
            let score = query
                .cosine_similarity(&point.vector)
                .map_err(|e| VectorStoreError::InvalidPayload(e.to_string()))?;
            Ok(ScoredPoint { point, score })
        })
        .collect()
}

#[async_trait]
impl VectorStore for PostgresVectorStore {
    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
        model: &ModelTag,
    ) -> Result<CollectionStatus, VectorStoreError> {
        let row = NewCollectionModel::new(collection, dimension, model)?;

        let inserted = self
            .run("create collection", move |conn| {
                diesel::insert_into(vector_collections::table)
                    .values(&row)
                    .on_conflict(vector_collections::name)
                    .do_nothing()
                    .execute(conn)
            })
            .await?;

        if inserted == 1 {
            info!("Created collection '{}' ({} dims, {})", collection, dimension, model);
            return Ok(CollectionStatus::Created);
        }

        let existing = self.require_collection(collection).await?;
        check_shape(collection, &existing, dimension, model)?;
        Ok(CollectionStatus::AlreadyExists)
    }

    async fn collection_info(
        &self,
        collection: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let name = collection.to_string();
        let row = self
            .run("find collection", move |conn| {
                vector_collections::table
                    .filter(vector_collections::name.eq(name))
                    .select(CollectionModel::as_select())
                    .first(conn)
                    .optional()
            })
            .await?;

        row.map(CollectionInfo::try_from).transpose()
    }

    async fn upsert_batch(
        &self,
        collection: &str,
        points: Vec<StoredPoint>,
    ) -> Result<(), VectorStoreError> {
        let Some(first) = points.first() else {
            return Ok(());
        };

        let shape = CollectionInfo {
            name: collection.to_string(),
            dimension: first.vector.dimension(),
            model: first.vector.model().clone(),
        };
        for point in &points {
            check_point_shape(collection, &shape, &point.vector)?;
            if point.id != point.content_hash.point_id() {
                return Err(VectorStoreError::InvalidPayload(format!(
                    "point {} does not derive from hash {}",
                    point.id, point.content_hash
                )));
            }
        }
        self.ensure_collection(collection, shape.dimension, &shape.model)
            .await?;

        let rows: Vec<NewPointModel> = dedupe_last_wins(points)
            .into_iter()
            .map(|point| NewPointModel::new(collection, point))
            .collect();
        let written = rows.len();

        self.run("upsert points", move |conn| {
            diesel::insert_into(vector_points::table)
                .values(&rows)
                .on_conflict((vector_points::collection, vector_points::id))
                .do_update()
                .set((
                    vector_points::content_hash.eq(excluded(vector_points::content_hash)),
                    vector_points::embedding.eq(excluded(vector_points::embedding)),
                    vector_points::model_version.eq(excluded(vector_points::model_version)),
                    vector_points::payload.eq(excluded(vector_points::payload)),
                    vector_points::updated_at.eq(excluded(vector_points::updated_at)),
                ))
                .execute(conn)
        })
        .await?;

        debug!("Upserted {} point(s) into '{}'", written, collection);
        Ok(())
    }

    async fn exists(&self, collection: &str, hash: &ContentHash) -> Result<bool, VectorStoreError> {
        self.ensure_hash_index().await?;
        let name = collection.to_string();
        let hash = hash.as_str().to_string();
        self.run("check point", move |conn| {
            diesel::select(exists(
                vector_points::table
                    .filter(vector_points::collection.eq(name))
                    .filter(vector_points::content_hash.eq(hash)),
            ))
            .get_result::<bool>(conn)
        })
        .await
    }

    async fn get(
        &self,
        collection: &str,
        hash: &ContentHash,
    ) -> Result<Option<StoredPoint>, VectorStoreError> {
        self.ensure_hash_index().await?;
        let name = collection.to_string();
        let hash = hash.as_str().to_string();
        let row = self
            .run("find point", move |conn| {
                vector_points::table
                    .filter(vector_points::collection.eq(name))
                    .filter(vector_points::content_hash.eq(hash))
                    .select(PointModel::as_select())
                    .first(conn)
                    .optional()
            })
            .await?;

        row.map(StoredPoint::try_from).transpose()
    }

    async fn search(
        &self,
        collection: &str,
        query: &EmbeddingVector,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, VectorStoreError> {
        let info = self.require_collection(collection).await?;
        check_point_shape(collection, &info, query)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let name = collection.to_string();
        let query_vector = Vector::from(query.values().to_vec());
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = self
            .run("search points", move |conn| {
                vector_points::table
                    .filter(vector_points::collection.eq(name))
                    .order((
                        vector_points::embedding.cosine_distance(query_vector),
                        vector_points::seq.asc(),
                    ))
                    .limit(limit)
                    .select(PointModel::as_select())
                    .load(conn)
            })
            .await?;

        score_rows(query, rows)
    }

    async fn count(&self, collection: &str) -> Result<usize, VectorStoreError> {
        self.require_collection(collection).await?;
        let name = collection.to_string();
        let total = self
            .run("count points", move |conn| {
                vector_points::table
                    .filter(vector_points::collection.eq(name))
                    .count()
                    .get_result::<i64>(conn)
            })
            .await?;
        Ok(usize::try_from(total).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn point(text: &str, title: &str) -> StoredPoint {
        StoredPoint::new(
            ContentHash::from_text(text),
            EmbeddingVector::new(ModelTag::new("m", "1"), vec![1.0, 0.0]),
            json!({ "title": title }),
        )
    }

    #[test]
    fn test_dedupe_keeps_last_write_in_first_slot() {
        let points = vec![point("a", "first"), point("b", "other"), point("a", "second")];
        let unique = dedupe_last_wins(points);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].payload["title"], "second");
        assert_eq!(unique[1].payload["title"], "other");
    }

    #[test]
    fn test_rows_are_scored_from_stored_vectors() {
        let hash = ContentHash::from_text("job");
        let rows = vec![PointModel {
            collection: "jds1".to_string(),
            id: hash.point_id(),
            content_hash: hash.as_str().to_string(),
            embedding: Vector::from(vec![0.0, 2.0]),
            model_version: "m@1".to_string(),
            payload: json!({}),
            seq: 1,
            updated_at: Utc::now(),
        }];
        let query = EmbeddingVector::new(ModelTag::new("m", "1"), vec![0.0, 1.0]);

        let scored = score_rows(&query, rows).unwrap();
        assert_eq!(scored.len(), 1);
        assert!((scored[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let info = CollectionInfo {
            name: "jds1".to_string(),
            dimension: 2,
            model: ModelTag::new("m", "1"),
        };
        assert!(check_shape("jds1", &info, 2, &ModelTag::new("m", "1")).is_ok());
        assert!(matches!(
            check_shape("jds1", &info, 3, &ModelTag::new("m", "1")),
            Err(VectorStoreError::DimensionMismatch { expected: 2, actual: 3, .. })
        ));
        assert!(matches!(
            check_shape("jds1", &info, 2, &ModelTag::new("m", "2")),
            Err(VectorStoreError::ModelMismatch { .. })
        ));
    }
}
