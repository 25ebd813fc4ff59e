use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::services::{MatchStrategy, Matcher};
use crate::domain::repositories::vector_store::check_point_shape;
use crate::domain::repositories::{
    CollectionInfo, CollectionStatus, ScoredPoint, StoredPoint, VectorStore, VectorStoreError,
};
use crate::domain::value_objects::{ContentHash, EmbeddingVector, ModelTag};

#[derive(Debug, Clone)]
struct Collection {
    info: CollectionInfo,
    /// Insertion order; an overwrite keeps the point's original slot.
    points: Vec<StoredPoint>,
    index: HashMap<Uuid, usize>,
}

impl Collection {
    fn new(info: CollectionInfo) -> Self {
        Self {
            info,
            points: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn upsert(&mut self, point: StoredPoint) {
        match self.index.get(&point.id) {
            Some(&slot) => self.points[slot] = point,
            None => {
                self.index.insert(point.id, self.points.len());
                self.points.push(point);
            }
        }
    }

    fn get(&self, hash: &ContentHash) -> Option<&StoredPoint> {
        self.index
            .get(&hash.point_id())
            .map(|&slot| &self.points[slot])
    }
}

#[derive(Serialize, Deserialize)]
struct CollectionFile {
    name: String,
    dimension: usize,
    model: ModelTag,
    points: Vec<StoredPoint>,
}

impl From<&Collection> for CollectionFile {
    fn from(collection: &Collection) -> Self {
        Self {
            name: collection.info.name.clone(),
            dimension: collection.info.dimension,
            model: collection.info.model.clone(),
            points: collection.points.clone(),
        }
    }
}

impl From<CollectionFile> for Collection {
    fn from(file: CollectionFile) -> Self {
        let mut collection = Collection::new(CollectionInfo {
            name: file.name,
            dimension: file.dimension,
            model: file.model,
        });
        for point in file.points {
            collection.upsert(point);
        }
        collection
    }
}

/// Embedded vector store. Collections live in memory behind one lock and,
/// when opened on a directory, are written through to `<name>.json` after
/// every change (temp file + rename). Readers never observe a half-applied
/// batch.
pub struct LocalVectorStore {
    root: Option<PathBuf>,
    collections: RwLock<HashMap<String, Collection>>,
    matcher: Matcher,
}

impl LocalVectorStore {
    pub fn in_memory() -> Self {
        Self {
            root: None,
            collections: RwLock::new(HashMap::new()),
            matcher: Matcher::default(),
        }
    }

    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, VectorStoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| VectorStoreError::Io(format!("{}: {}", root.display(), e)))?;

        let mut collections = HashMap::new();
        let mut entries = fs::read_dir(&root)
            .await
            .map_err(|e| VectorStoreError::Io(e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| VectorStoreError::Io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let collection = load_collection(&path).await?;
            debug!(
                "Loaded collection '{}' with {} point(s)",
                collection.info.name,
                collection.points.len()
            );
            collections.insert(collection.info.name.clone(), collection);
        }

        info!(
            "Opened local vector store at {} ({} collection(s))",
            root.display(),
            collections.len()
        );
        Ok(Self {
            root: Some(root),
            collections: RwLock::new(collections),
            matcher: Matcher::default(),
        })
    }

    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.matcher = Matcher::new(strategy);
        self
    }

    async fn persist(&self, collection: &Collection) -> Result<(), VectorStoreError> {
        let Some(root) = &self.root else {
            return Ok(());
        };

        let json = serde_json::to_vec(&CollectionFile::from(collection))
            .map_err(|e| VectorStoreError::Serialization(e.to_string()))?;
        let path = root.join(format!("{}.json", collection.info.name));
        let tmp = root.join(format!("{}.json.tmp", collection.info.name));

        fs::write(&tmp, json)
            .await
            .map_err(|e| VectorStoreError::Io(format!("{}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| VectorStoreError::Io(format!("{}: {}", path.display(), e)))
    }
}

async fn load_collection(path: &Path) -> Result<Collection, VectorStoreError> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| VectorStoreError::Io(format!("{}: {}", path.display(), e)))?;
    let file: CollectionFile = serde_json::from_slice(&bytes)
        .map_err(|e| VectorStoreError::Serialization(format!("{}: {}", path.display(), e)))?;
    Ok(Collection::from(file))
}

fn validate_name(collection: &str) -> Result<(), VectorStoreError> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(VectorStoreError::InvalidPayload(format!(
            "invalid collection name '{}'",
            collection
        )))
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

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
        model: &ModelTag,
    ) -> Result<CollectionStatus, VectorStoreError> {
        validate_name(collection)?;
        let mut collections = self.collections.write().await;

        if let Some(existing) = collections.get(collection) {
            check_shape(collection, &existing.info, dimension, model)?;
            return Ok(CollectionStatus::AlreadyExists);
        }

        let created = Collection::new(CollectionInfo {
            name: collection.to_string(),
            dimension,
            model: model.clone(),
        });
        self.persist(&created).await?;
        collections.insert(collection.to_string(), created);
        info!("Created collection '{}' ({} dims, {})", collection, dimension, model);
        Ok(CollectionStatus::Created)
    }

    async fn collection_info(
        &self,
        collection: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map(|c| c.info.clone()))
    }

    async fn upsert_batch(
        &self,
        collection: &str,
        points: Vec<StoredPoint>,
    ) -> Result<(), VectorStoreError> {
        let Some(first) = points.first() else {
            return Ok(());
        };
        validate_name(collection)?;

        let mut collections = self.collections.write().await;
        let info = match collections.get(collection) {
            Some(existing) => existing.info.clone(),
            None => CollectionInfo {
                name: collection.to_string(),
                dimension: first.vector.dimension(),
                model: first.vector.model().clone(),
            },
        };

        // Validate the whole batch before touching the collection.
        for point in &points {
            check_point_shape(collection, &info, &point.vector)?;
            if point.id != point.content_hash.point_id() {
                return Err(VectorStoreError::InvalidPayload(format!(
                    "point {} does not derive from hash {}",
                    point.id, point.content_hash
                )));
            }
        }

        let mut updated = collections
            .get(collection)
            .cloned()
            .unwrap_or_else(|| Collection::new(info));
        for point in points {
            updated.upsert(point);
        }

        self.persist(&updated).await?;
        collections.insert(collection.to_string(), updated);
        Ok(())
    }

    async fn exists(&self, collection: &str, hash: &ContentHash) -> Result<bool, VectorStoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .is_some_and(|c| c.index.contains_key(&hash.point_id())))
    }

    async fn get(
        &self,
        collection: &str,
        hash: &ContentHash,
    ) -> Result<Option<StoredPoint>, VectorStoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(hash))
            .cloned())
    }

    async fn search(
        &self,
        collection: &str,
        query: &EmbeddingVector,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, VectorStoreError> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.to_string()))?;
        check_point_shape(collection, &target.info, query)?;

        let ranked = self
            .matcher
            .rank_items(query, &target.points, |point| &point.vector, limit)
            .map_err(|e| VectorStoreError::InvalidPayload(e.to_string()))?;

        Ok(ranked
            .into_iter()
            .map(|(point, score)| ScoredPoint {
                point: point.clone(),
                score,
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize, VectorStoreError> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.points.len())
            .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.to_string()))
    }
}
