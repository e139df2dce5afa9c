//! In-memory stand-ins for the catalog, featured and image stores.
#![allow(dead_code)]

use async_trait::async_trait;
use catalog_images_block::CatalogServices;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vitrine_atoms::catalogs::{
    Catalog, CatalogImage, CatalogRepository, CreateCatalogPayload, UpdateCatalogPayload,
};
use vitrine_atoms::events::ChangeBus;
use vitrine_atoms::featured::{FeaturedItem, FeaturedRepository};
use vitrine_atoms::media::{ImageStore, UploadFile};
use vitrine_atoms::{AtomError, AtomResult};

// ========== CATALOGS ==========
#[derive(Default)]
pub struct MemoryCatalogs {
    rows: Mutex<BTreeMap<String, Catalog>>,
    /// Each pending conflict bumps the stored version right before a write,
    /// as if another writer got there first
    pending_conflicts: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub fail_updates: Mutex<bool>,
}

impl MemoryCatalogs {
    pub fn seed(&self, catalog_id: &str, title: &str, cover: Option<&str>, urls: &[&str]) -> Catalog {
        let catalog = Catalog {
            catalog_id: catalog_id.to_string(),
            title: title.to_string(),
            description: String::new(),
            cover_image_url: cover.map(str::to_string),
            content_images: urls
                .iter()
                .enumerate()
                .map(|(i, u)| CatalogImage::positional(catalog_id, i, *u))
                .collect(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            version: 1,
        };
        self.rows
            .lock()
            .unwrap()
            .insert(catalog_id.to_string(), catalog.clone());
        catalog
    }

    pub fn inject_conflicts(&self, n: usize) {
        self.pending_conflicts.store(n, Ordering::SeqCst);
    }

    pub fn fail_updates(&self) {
        *self.fail_updates.lock().unwrap() = true;
    }

    pub fn stored(&self, catalog_id: &str) -> Option<Catalog> {
        self.rows.lock().unwrap().get(catalog_id).cloned()
    }

    pub fn urls(&self, catalog_id: &str) -> Vec<String> {
        self.stored(catalog_id)
            .map(|c| c.image_urls().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn remove(&self, catalog_id: &str) {
        self.rows.lock().unwrap().remove(catalog_id);
    }
}

#[async_trait]
impl CatalogRepository for MemoryCatalogs {
    async fn get_all(&self) -> AtomResult<Vec<Catalog>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn get_by_id(&self, catalog_id: &str) -> AtomResult<Option<Catalog>> {
        Ok(self.stored(catalog_id))
    }

    async fn create(&self, payload: CreateCatalogPayload) -> AtomResult<Catalog> {
        let id = format!("cat-{}", self.rows.lock().unwrap().len() + 1);
        let urls: Vec<&str> = payload.content_image_urls.iter().map(String::as_str).collect();
        Ok(self.seed(&id, &payload.title, payload.cover_image_url.as_deref(), &urls))
    }

    async fn update(
        &self,
        catalog_id: &str,
        payload: UpdateCatalogPayload,
        expected_version: u64,
    ) -> AtomResult<Catalog> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if *self.fail_updates.lock().unwrap() {
            return Err(AtomError::Repository("DynamoDB update_item error: throttled".to_string()));
        }

        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(catalog_id)
            .ok_or_else(|| AtomError::NotFound("Catalog not found".to_string()))?;

        if self
            .pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            row.version += 1;
        }

        if row.version != expected_version {
            return Err(AtomError::Conflict(format!(
                "Catalog {} was modified concurrently",
                catalog_id
            )));
        }

        row.apply(&payload);
        row.version += 1;
        Ok(row.clone())
    }

    async fn delete(&self, catalog_id: &str) -> AtomResult<()> {
        self.remove(catalog_id);
        Ok(())
    }
}

// ========== FEATURED ==========
#[derive(Default)]
pub struct MemoryFeatured {
    rows: Mutex<BTreeMap<String, FeaturedItem>>,
    pub fail_writes: Mutex<bool>,
    pub fail_reads: Mutex<bool>,
    pub inserts: AtomicUsize,
}

impl MemoryFeatured {
    pub fn feature(&self, url: &str) {
        self.rows.lock().unwrap().insert(
            url.to_string(),
            FeaturedItem {
                featured_id: format!("f-{}", url),
                image_url: url.to_string(),
                title: "Featured product".to_string(),
                description: String::new(),
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        );
    }

    pub fn urls(&self) -> HashSet<String> {
        self.rows.lock().unwrap().keys().cloned().collect()
    }

    pub fn item(&self, url: &str) -> Option<FeaturedItem> {
        self.rows.lock().unwrap().get(url).cloned()
    }

    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    pub fn fail_reads(&self) {
        *self.fail_reads.lock().unwrap() = true;
    }

    fn check_write(&self) -> AtomResult<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(AtomError::Repository("DynamoDB write error: unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl FeaturedRepository for MemoryFeatured {
    async fn insert(&self, image_url: &str, title: &str, description: &str) -> AtomResult<FeaturedItem> {
        self.check_write()?;
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let item = rows
            .entry(image_url.to_string())
            .or_insert_with(|| FeaturedItem {
                featured_id: format!("f-{}", image_url),
                image_url: image_url.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                created_at: "2026-01-02T00:00:00Z".to_string(),
            });
        Ok(item.clone())
    }

    async fn delete_by_reference(&self, image_url: &str) -> AtomResult<()> {
        self.check_write()?;
        self.rows.lock().unwrap().remove(image_url);
        Ok(())
    }

    async fn delete_by_reference_set(&self, image_urls: &[String]) -> AtomResult<()> {
        self.check_write()?;
        let mut rows = self.rows.lock().unwrap();
        for url in image_urls {
            rows.remove(url);
        }
        Ok(())
    }

    async fn scan_all(&self) -> AtomResult<Vec<FeaturedItem>> {
        if *self.fail_reads.lock().unwrap() {
            return Err(AtomError::Repository("DynamoDB scan error: timeout".to_string()));
        }
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }
}

// ========== IMAGES ==========
#[derive(Default)]
pub struct MemoryImages {
    /// File names whose upload is rejected by the store
    pub rejects: Mutex<HashSet<String>>,
    pub stored: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl MemoryImages {
    pub fn reject(&self, file_name: &str) {
        self.rejects.lock().unwrap().insert(file_name.to_string());
    }

    pub fn url_for(file_name: &str) -> String {
        format!("https://assets.test/catalog-images/public/{}", file_name)
    }
}

#[async_trait]
impl ImageStore for MemoryImages {
    async fn store(&self, file: &UploadFile) -> AtomResult<String> {
        if self.rejects.lock().unwrap().contains(&file.file_name) {
            return Err(AtomError::Storage(format!("S3 put_object error: {}", file.file_name)));
        }
        let url = Self::url_for(&file.file_name);
        self.stored.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> AtomResult<()> {
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

// ========== HARNESS ==========
pub struct Harness {
    pub catalogs: Arc<MemoryCatalogs>,
    pub featured: Arc<MemoryFeatured>,
    pub images: Arc<MemoryImages>,
    pub services: CatalogServices,
}

impl Harness {
    pub fn new() -> Self {
        let catalogs = Arc::new(MemoryCatalogs::default());
        let featured = Arc::new(MemoryFeatured::default());
        let images = Arc::new(MemoryImages::default());
        let services = CatalogServices {
            catalogs: catalogs.clone(),
            featured: featured.clone(),
            images: images.clone(),
            bus: ChangeBus::new(32),
        };
        Self {
            catalogs,
            featured,
            images,
            services,
        }
    }
}

pub fn png(file_name: &str) -> UploadFile {
    UploadFile {
        file_name: file_name.to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}
