use std::collections::HashSet;
use std::sync::Arc;
use vitrine_atoms::catalogs::Catalog;
use vitrine_atoms::events::{ChangeBus, ChangeEvent, ChangeKind};
use vitrine_atoms::featured::{FeaturedDetails, FeaturedItem, FeaturedRepository};
use vitrine_atoms::AtomResult;
use crate::types::SyncedImage;

/// Keeps catalog slots and featured items consistent.
///
/// The featured collection is the only source of truth for "is this image
/// featured"; catalogs carry no flag. Status is keyed by URL, so a URL that
/// appears twice in a catalog is featured in both slots at once.
#[derive(Clone)]
pub struct FavoriteSync {
    featured: Arc<dyn FeaturedRepository>,
    bus: ChangeBus,
}

impl FavoriteSync {
    pub fn new(featured: Arc<dyn FeaturedRepository>, bus: ChangeBus) -> Self {
        Self { featured, bus }
    }

    /// Every image URL that currently has a featured item
    pub async fn featured_references(&self) -> AtomResult<HashSet<String>> {
        let items = self.featured.scan_all().await?;
        Ok(items.into_iter().map(|item| item.image_url).collect())
    }

    /// Read-only surfaces that prefer showing "nothing featured" over an error
    pub async fn featured_references_or_empty(&self) -> HashSet<String> {
        match self.featured_references().await {
            Ok(refs) => refs,
            Err(e) => {
                tracing::warn!("Featured lookup failed, treating nothing as featured: {}", e);
                HashSet::new()
            }
        }
    }

    /// Synced view of a catalog's content images, in catalog order
    pub async fn sync_catalog_images(&self, catalog: &Catalog) -> AtomResult<Vec<SyncedImage>> {
        if catalog.content_images.is_empty() {
            return Ok(Vec::new());
        }

        let featured = self.featured_references().await?;
        let synced = synced_images(catalog, &featured);

        tracing::debug!(
            "Synced catalog {}: {} image(s), {} featured",
            catalog.catalog_id,
            synced.len(),
            synced.iter().filter(|img| img.is_favorite).count()
        );

        Ok(synced)
    }

    /// Feature (`desired = true`) or un-feature an image URL.
    /// Un-featuring removes every featured item for that URL.
    pub async fn set_favorite(
        &self,
        image_url: &str,
        desired: bool,
        details: Option<FeaturedDetails>,
    ) -> AtomResult<()> {
        if desired {
            let details = details.unwrap_or_default();
            self.featured
                .insert(image_url, &details.title, &details.description)
                .await
                .map_err(|e| {
                    tracing::error!("❌ Failed to feature {}: {}", image_url, e);
                    e
                })?;
        } else {
            self.featured.delete_by_reference(image_url).await.map_err(|e| {
                tracing::error!("❌ Failed to un-feature {}: {}", image_url, e);
                e
            })?;
        }

        tracing::info!("⭐ Favorite status for {} set to {}", image_url, desired);

        let change = if desired { ChangeKind::Created } else { ChangeKind::Deleted };
        self.bus.publish(ChangeEvent::featured(image_url, change));

        Ok(())
    }

    /// Featured records currently stored for any of `image_urls`
    pub async fn featured_items_for(&self, image_urls: &[String]) -> AtomResult<Vec<FeaturedItem>> {
        if image_urls.is_empty() {
            return Ok(Vec::new());
        }
        let items = self.featured.scan_all().await?;
        Ok(items
            .into_iter()
            .filter(|item| image_urls.contains(&item.image_url))
            .collect())
    }

    /// Un-feature every URL in one batch
    pub async fn clear_favorites(&self, image_urls: &[String]) -> AtomResult<()> {
        if image_urls.is_empty() {
            return Ok(());
        }

        self.featured
            .delete_by_reference_set(image_urls)
            .await
            .map_err(|e| {
                tracing::error!("❌ Failed to un-feature {} image(s): {}", image_urls.len(), e);
                e
            })?;

        for url in image_urls {
            self.bus.publish(ChangeEvent::featured(url.as_str(), ChangeKind::Deleted));
        }
        Ok(())
    }

    /// Put back records cleared ahead of a catalog write that then failed.
    /// Insert is idempotent, so a record that survived is left as it is.
    pub async fn restore_favorites(&self, items: &[FeaturedItem]) {
        for item in items {
            match self
                .featured
                .insert(&item.image_url, &item.title, &item.description)
                .await
            {
                Ok(_) => {
                    tracing::warn!("Restored featured item for {}", item.image_url);
                    self.bus
                        .publish(ChangeEvent::featured(item.image_url.as_str(), ChangeKind::Created));
                }
                Err(e) => tracing::error!(
                    "❌ Could not restore featured item for {}: {}",
                    item.image_url,
                    e
                ),
            }
        }
    }
}

/// Join a catalog's slots against a featured set. Pure.
pub fn synced_images(catalog: &Catalog, featured: &HashSet<String>) -> Vec<SyncedImage> {
    catalog
        .content_images
        .iter()
        .enumerate()
        .map(|(index, slot)| SyncedImage {
            id: slot.image_id.clone(),
            image: slot.url.clone(),
            title: format!("Image {} - {}", index + 1, catalog.title),
            description: format!("Image from catalog {}", catalog.title),
            is_favorite: featured.contains(&slot.url),
            catalog_id: catalog.catalog_id.clone(),
        })
        .collect()
}
