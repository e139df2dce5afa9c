use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vitrine_atoms::catalogs::{CatalogRepository, UpdateCatalogPayload};
use vitrine_atoms::events::ChangeBus;
use vitrine_atoms::featured::FeaturedRepository;
use vitrine_atoms::media::ImageStore;

// ========== SYNCED IMAGE ==========
/// A catalog slot joined with its current featured status. Never persisted.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SyncedImage {
    pub id: String,
    pub image: String,
    pub title: String,
    pub description: String,
    pub is_favorite: bool,
    pub catalog_id: String,
}

// ========== COLLABORATORS ==========
/// Everything a catalog image session talks to
#[derive(Clone)]
pub struct CatalogServices {
    pub catalogs: Arc<dyn CatalogRepository>,
    pub featured: Arc<dyn FeaturedRepository>,
    pub images: Arc<dyn ImageStore>,
    pub bus: ChangeBus,
}

// ========== REQUESTS ==========
#[derive(Debug, Deserialize)]
pub struct ImageUrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadImagesRequest {
    pub files: Vec<UploadedFilePayload>,
}

#[derive(Debug, Deserialize)]
pub struct UploadedFilePayload {
    pub file_name: String,
    pub content_type: String,
    /// Base64 file content
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct FavoriteToggled {
    pub url: String,
    pub is_favorite: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCatalogRequest {
    /// Version the caller last saw; omitted means "whatever is stored now"
    pub version: Option<u64>,
    #[serde(flatten)]
    pub payload: UpdateCatalogPayload,
}
