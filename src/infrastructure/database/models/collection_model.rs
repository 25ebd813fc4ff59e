use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::repositories::{CollectionInfo, VectorStoreError};
use crate::domain::value_objects::ModelTag;
use crate::infrastructure::database::schema::vector_collections;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = vector_collections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CollectionModel {
    pub name: String,
    pub dimension: i32,
    pub model_version: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = vector_collections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewCollectionModel {
    pub name: String,
    pub dimension: i32,
    pub model_version: String,
}

impl NewCollectionModel {
    pub fn new(name: &str, dimension: usize, model: &ModelTag) -> Result<Self, VectorStoreError> {
        let dimension = i32::try_from(dimension)
            .map_err(|_| VectorStoreError::InvalidPayload(format!("dimension {} too large", dimension)))?;
        Ok(Self {
            name: name.to_string(),
            dimension,
            model_version: model.to_string(),
        })
    }
}

impl TryFrom<CollectionModel> for CollectionInfo {
    type Error = VectorStoreError;

    fn try_from(model: CollectionModel) -> Result<Self, Self::Error> {
        let tag = ModelTag::parse(&model.model_version).ok_or_else(|| {
            VectorStoreError::InvalidPayload(format!(
                "collection {}: invalid model tag '{}'",
                model.name, model.model_version
            ))
        })?;

        Ok(CollectionInfo {
            dimension: usize::try_from(model.dimension).unwrap_or_default(),
            name: model.name,
            model: tag,
        })
    }
}
