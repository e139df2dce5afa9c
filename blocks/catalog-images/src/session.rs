use futures::future::join_all;
use vitrine_atoms::catalogs::{Catalog, CatalogImage, UpdateCatalogPayload};
use vitrine_atoms::events::{ChangeEvent, ChangeKind};
use vitrine_atoms::featured::{FeaturedDetails, FeaturedItem};
use vitrine_atoms::media::{validate_image_url, UploadFailure, UploadFile, UploadReport};
use vitrine_atoms::{AtomError, AtomResult};
use crate::favorites::FavoriteSync;
use crate::types::{CatalogServices, SyncedImage};

/// Read-modify-write attempts before a version conflict reaches the caller
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Working session over one catalog's images.
///
/// Holds nothing but the last synced view; every mutation re-reads the
/// catalog and writes the whole content list back guarded by its version.
pub struct CatalogImageSession {
    catalog_id: String,
    services: CatalogServices,
    favorites: FavoriteSync,
    view: Vec<SyncedImage>,
}

impl CatalogImageSession {
    pub fn open(services: CatalogServices, catalog_id: impl Into<String>) -> Self {
        let favorites = FavoriteSync::new(services.featured.clone(), services.bus.clone());
        Self {
            catalog_id: catalog_id.into(),
            services,
            favorites,
            view: Vec::new(),
        }
    }

    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    /// Last synced view
    pub fn images(&self) -> &[SyncedImage] {
        &self.view
    }

    /// Re-fetch and re-sync. A catalog deleted in the meantime reads as empty.
    pub async fn load(&mut self) -> AtomResult<&[SyncedImage]> {
        self.view = match self.services.catalogs.get_by_id(&self.catalog_id).await? {
            Some(catalog) => self.favorites.sync_catalog_images(&catalog).await?,
            None => {
                tracing::info!("Catalog {} is gone, session view is empty", self.catalog_id);
                Vec::new()
            }
        };
        Ok(&self.view)
    }

    /// Append an externally hosted image
    pub async fn add_image_by_url(&mut self, url: &str) -> AtomResult<Catalog> {
        let url = validate_image_url(url)?;
        let catalog = self.append(std::slice::from_ref(&url)).await?;

        tracing::info!("🖼️ Added {} to catalog {}", url, self.catalog_id);
        self.after_write(&catalog).await;
        Ok(catalog)
    }

    /// Upload files concurrently and append every URL that made it, in
    /// submission order, with a single write.
    pub async fn add_images_by_upload(&mut self, files: Vec<UploadFile>) -> AtomResult<UploadReport> {
        if files.is_empty() {
            return Ok(UploadReport::default());
        }

        let images = self.services.images.clone();
        let uploads = files.iter().map(|file| {
            let images = images.clone();
            async move {
                match file.validate() {
                    Ok(()) => images.store(file).await,
                    Err(e) => Err(e),
                }
            }
        });
        let outcomes = join_all(uploads).await;

        let mut report = UploadReport::default();
        for (file, outcome) in files.iter().zip(outcomes) {
            match outcome {
                Ok(url) => report.uploaded.push(url),
                Err(e) => {
                    tracing::warn!("Upload of {} failed: {}", file.file_name, e);
                    report.failures.push(UploadFailure {
                        file_name: file.file_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if report.uploaded.is_empty() {
            return Err(report.partial_failure().unwrap_or_else(|| AtomError::PartialBatch {
                succeeded: 0,
                failed: files.len(),
                detail: "no file was uploaded".to_string(),
            }));
        }

        let catalog = match self.append(&report.uploaded).await {
            Ok(catalog) => catalog,
            Err(e) => {
                self.discard_uploads(&report.uploaded).await;
                return Err(e);
            }
        };

        if let Some(partial) = report.partial_failure() {
            tracing::warn!("Catalog {} upload partially failed: {}", self.catalog_id, partial);
        }
        tracing::info!(
            "🖼️ Added {} uploaded image(s) to catalog {}",
            report.succeeded(),
            self.catalog_id
        );

        self.after_write(&catalog).await;
        Ok(report)
    }

    /// Remove the first slot holding `url`. When that was the URL's last use
    /// anywhere, its featured item goes first so no orphan is left behind;
    /// if the catalog write then fails, the featured item is put back.
    pub async fn delete_image(&mut self, url: &str) -> AtomResult<Catalog> {
        let mut unfeatured = Vec::new();

        let catalog = match self.remove_first_slot(url, &mut unfeatured).await {
            Ok(catalog) => catalog,
            Err(e) => {
                if !unfeatured.is_empty() {
                    tracing::warn!(
                        "Removing {} from catalog {} failed, restoring its featured item",
                        url,
                        self.catalog_id
                    );
                    self.favorites.restore_favorites(&unfeatured).await;
                }
                return Err(e);
            }
        };

        tracing::info!("🗑️ Removed {} from catalog {}", url, self.catalog_id);
        self.after_write(&catalog).await;
        Ok(catalog)
    }

    /// Flip the featured status of `url` as seen in the last synced view.
    /// Returns the new status; on failure the view stays as it was.
    pub async fn toggle_favorite(&mut self, url: &str) -> AtomResult<bool> {
        let image = self
            .view
            .iter()
            .find(|img| img.image == url)
            .ok_or_else(|| AtomError::NotFound("Image not found".to_string()))?;

        let desired = !image.is_favorite;
        let details = FeaturedDetails {
            title: image.title.clone(),
            description: image.description.clone(),
        };

        self.favorites.set_favorite(url, desired, Some(details)).await?;

        // Same URL, same status: every slot holding it flips together
        for img in self.view.iter_mut().filter(|img| img.image == url) {
            img.is_favorite = desired;
        }

        Ok(desired)
    }

    async fn current_catalog(&self) -> AtomResult<Catalog> {
        self.services
            .catalogs
            .get_by_id(&self.catalog_id)
            .await?
            .ok_or_else(|| AtomError::NotFound("Catalog not found".to_string()))
    }

    async fn write_content(&self, current: &Catalog, content_images: Vec<CatalogImage>) -> AtomResult<Catalog> {
        self.services
            .catalogs
            .update(
                &self.catalog_id,
                UpdateCatalogPayload::with_content_images(content_images),
                current.version,
            )
            .await
    }

    async fn append(&self, urls: &[String]) -> AtomResult<Catalog> {
        let new_slots: Vec<CatalogImage> = urls.iter().map(|u| CatalogImage::new(u.as_str())).collect();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let current = self.current_catalog().await?;
            let mut content = current.content_images.clone();
            content.extend(new_slots.iter().cloned());

            match self.write_content(&current, content).await {
                Err(AtomError::Conflict(msg)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!(
                        "Retrying append to catalog {} (attempt {}): {}",
                        self.catalog_id,
                        attempt,
                        msg
                    );
                }
                other => return other,
            }
        }
    }

    async fn remove_first_slot(&self, url: &str, unfeatured: &mut Vec<FeaturedItem>) -> AtomResult<Catalog> {
        let mut checked = false;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let current = self.current_catalog().await?;

            let position = current
                .content_images
                .iter()
                .position(|img| img.url == url)
                .ok_or_else(|| AtomError::NotFound("Image not found in catalog".to_string()))?;

            let mut remaining = current.content_images.clone();
            remaining.remove(position);

            if !checked {
                let still_here = current.cover_image_url.as_deref() == Some(url)
                    || remaining.iter().any(|img| img.url == url);
                if !still_here && !self.used_by_other_catalogs(url).await? {
                    checked = true;
                    let targets = [url.to_string()];
                    let items = self.favorites.featured_items_for(&targets).await?;
                    if !items.is_empty() {
                        self.favorites.clear_favorites(&targets).await?;
                        *unfeatured = items;
                    }
                }
            }

            match self.write_content(&current, remaining).await {
                Err(AtomError::Conflict(msg)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!("Retrying delete of {} (attempt {}): {}", url, attempt, msg);
                }
                other => return other,
            }
        }
    }

    async fn used_by_other_catalogs(&self, url: &str) -> AtomResult<bool> {
        let all = self.services.catalogs.get_all().await?;
        Ok(all
            .iter()
            .any(|c| c.catalog_id != self.catalog_id && c.references(url)))
    }

    /// Compensating delete for blobs whose URLs never reached the catalog
    async fn discard_uploads(&self, urls: &[String]) {
        for url in urls {
            match self.services.images.delete(url).await {
                Ok(()) => tracing::warn!("Discarded orphaned upload {}", url),
                Err(e) => tracing::error!("❌ Could not discard orphaned upload {}: {}", url, e),
            }
        }
    }

    async fn after_write(&mut self, catalog: &Catalog) {
        self.services
            .bus
            .publish(ChangeEvent::catalog(catalog.catalog_id.as_str(), ChangeKind::Updated));

        if let Err(e) = self.load().await {
            tracing::warn!("Reload after write failed for catalog {}: {}", self.catalog_id, e);
        }
    }
}
