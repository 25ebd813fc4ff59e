use chrono::{DateTime, Utc};
use diesel::prelude::*;
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::repositories::{StoredPoint, VectorStoreError};
use crate::domain::value_objects::{ContentHash, EmbeddingVector, ModelTag};
use crate::infrastructure::database::schema::vector_points;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = vector_points)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PointModel {
    pub collection: String,
    pub id: Uuid,
    pub content_hash: String,
    pub embedding: Vector,
    pub model_version: String,
    pub payload: serde_json::Value,
    pub seq: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = vector_points)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPointModel {
    pub collection: String,
    pub id: Uuid,
    pub content_hash: String,
    pub embedding: Vector,
    pub model_version: String,
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl NewPointModel {
    pub fn new(collection: &str, point: StoredPoint) -> Self {
        Self {
            collection: collection.to_string(),
            id: point.id,
            content_hash: point.content_hash.as_str().to_string(),
            model_version: point.vector.model().to_string(),
            embedding: Vector::from(point.vector.into_values()),
            payload: point.payload,
            updated_at: point.updated_at,
        }
    }
}

impl TryFrom<PointModel> for StoredPoint {
    type Error = VectorStoreError;

    fn try_from(model: PointModel) -> Result<Self, Self::Error> {
        let content_hash = ContentHash::new(model.content_hash)
            .map_err(|e| VectorStoreError::InvalidPayload(format!("point {}: {}", model.id, e)))?;
        let tag = ModelTag::parse(&model.model_version).ok_or_else(|| {
            VectorStoreError::InvalidPayload(format!(
                "point {}: invalid model tag '{}'",
                model.id, model.model_version
            ))
        })?;

        Ok(StoredPoint {
            id: model.id,
            content_hash,
            vector: EmbeddingVector::new(tag, model.embedding.to_vec()),
            payload: model.payload,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model_row(hash: &ContentHash) -> PointModel {
        PointModel {
            collection: "jds1".to_string(),
            id: hash.point_id(),
            content_hash: hash.as_str().to_string(),
            embedding: Vector::from(vec![0.5, 0.5]),
            model_version: "all-mpnet-base-v2@1".to_string(),
            payload: json!({ "title": "Data Engineer" }),
            seq: 7,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_point() {
        let hash = ContentHash::from_text("job");
        let point = StoredPoint::try_from(model_row(&hash)).unwrap();
        assert_eq!(point.content_hash, hash);
        assert_eq!(point.vector.model(), &ModelTag::new("all-mpnet-base-v2", "1"));
        assert_eq!(point.vector.values(), &[0.5, 0.5]);
    }

    #[test]
    fn test_untagged_row_is_invalid() {
        let hash = ContentHash::from_text("job");
        let mut row = model_row(&hash);
        row.model_version = "legacy".to_string();
        assert!(matches!(
            StoredPoint::try_from(row),
            Err(VectorStoreError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_new_row_carries_model_tag() {
        let hash = ContentHash::from_text("job");
        let point = StoredPoint::new(
            hash.clone(),
            EmbeddingVector::new(ModelTag::new("m", "2"), vec![1.0]),
            json!({}),
        );
        let row = NewPointModel::new("jds1", point);
        assert_eq!(row.model_version, "m@2");
        assert_eq!(row.content_hash, hash.as_str());
    }
}
