use lambda_http::{Body, Error, Response, http::StatusCode};
use vitrine_atoms::catalogs::http::{error_response, json_response, no_content};
use vitrine_atoms::catalogs::{Catalog, CreateCatalogPayload, UpdateCatalogPayload};
use vitrine_atoms::events::{ChangeEvent, ChangeKind};
use vitrine_atoms::{AtomError, AtomResult};
use crate::favorites::FavoriteSync;
use crate::types::{CatalogServices, UpdateCatalogRequest};

/// URLs in `urls` that no catalog other than `catalog_id` still references
fn exclusive_urls<'a>(
    urls: impl IntoIterator<Item = &'a str>,
    all: &[Catalog],
    catalog_id: &str,
) -> Vec<String> {
    urls.into_iter()
        .filter(|url| {
            !all.iter()
                .any(|other| other.catalog_id != catalog_id && other.references(url))
        })
        .map(|url| url.to_string())
        .collect()
}

fn favorites(services: &CatalogServices) -> FavoriteSync {
    FavoriteSync::new(services.featured.clone(), services.bus.clone())
}

/// Create a catalog and announce it
pub async fn create_catalog(services: &CatalogServices, payload: CreateCatalogPayload) -> AtomResult<Catalog> {
    if payload.title.trim().is_empty() {
        return Err(AtomError::Validation("Catalog title is required".to_string()));
    }

    let catalog = services.catalogs.create(payload).await?;
    services
        .bus
        .publish(ChangeEvent::catalog(catalog.catalog_id.as_str(), ChangeKind::Created));
    Ok(catalog)
}

/// Partial update of a catalog.
///
/// URLs the update drops from cover and content lose their featured item
/// unless another catalog still uses them. The featured items go before the
/// write and are put back if the write fails.
pub async fn update_catalog(
    services: &CatalogServices,
    catalog_id: &str,
    payload: UpdateCatalogPayload,
    expected_version: Option<u64>,
) -> AtomResult<Catalog> {
    if payload.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AtomError::Validation("Catalog title is required".to_string()));
    }

    // STEP 1: Current state of every catalog
    let all = services.catalogs.get_all().await?;
    let current = all
        .iter()
        .find(|c| c.catalog_id == catalog_id)
        .ok_or_else(|| AtomError::NotFound("Catalog not found".to_string()))?;

    let expected = expected_version.unwrap_or(current.version);
    if expected != current.version {
        return Err(AtomError::Conflict(format!(
            "Catalog {} was modified concurrently",
            catalog_id
        )));
    }

    // STEP 2: Keep slot ids for URLs that stay, find the URLs that go
    let payload = payload.resolve_against(&current.content_images);
    let mut after = current.clone();
    after.apply(&payload);
    let kept = after.referenced_urls();
    let dropped = exclusive_urls(
        current.referenced_urls().into_iter().filter(|url| !kept.contains(url)),
        &all,
        catalog_id,
    );

    // STEP 3: Un-feature them, remembering what to restore
    let favorites = favorites(services);
    let unfeatured = favorites.featured_items_for(&dropped).await?;
    if !unfeatured.is_empty() {
        let urls: Vec<String> = unfeatured.iter().map(|item| item.image_url.clone()).collect();
        favorites.clear_favorites(&urls).await?;
    }

    // STEP 4: Write
    match services.catalogs.update(catalog_id, payload, expected).await {
        Ok(updated) => {
            tracing::info!(
                "✏️ Updated catalog {} (version {}), un-featured {} dropped image(s)",
                catalog_id,
                updated.version,
                unfeatured.len()
            );
            services
                .bus
                .publish(ChangeEvent::catalog(catalog_id, ChangeKind::Updated));
            Ok(updated)
        }
        Err(e) => {
            if !unfeatured.is_empty() {
                tracing::warn!("Update of catalog {} failed, restoring featured items", catalog_id);
                favorites.restore_favorites(&unfeatured).await;
            }
            Err(e)
        }
    }
}

/// Delete a catalog and the featured items of every image only it used.
///
/// Featured cleanup runs first; if it fails the catalog is kept so the
/// delete can be retried without leaving orphans behind.
pub async fn delete_catalog(services: &CatalogServices, catalog_id: &str) -> AtomResult<()> {
    // STEP 1: Load every catalog, we need the others to spot shared URLs
    let all = services.catalogs.get_all().await?;
    let catalog = all
        .iter()
        .find(|c| c.catalog_id == catalog_id)
        .ok_or_else(|| AtomError::NotFound("Catalog not found".to_string()))?;

    // STEP 2: Cover + content URLs not referenced by any other catalog
    let exclusive = exclusive_urls(catalog.referenced_urls(), &all, catalog_id);

    // STEP 3: Drop their featured items
    favorites(services).clear_favorites(&exclusive).await.map_err(|e| {
        tracing::error!(
            "❌ Featured cleanup failed for catalog {}, catalog kept: {}",
            catalog_id,
            e
        );
        e
    })?;

    // STEP 4: Delete the catalog itself
    services.catalogs.delete(catalog_id).await?;

    tracing::info!(
        "🗑️ Deleted catalog {} and cleared {} featured reference(s)",
        catalog_id,
        exclusive.len()
    );

    services
        .bus
        .publish(ChangeEvent::catalog(catalog_id, ChangeKind::Deleted));

    Ok(())
}

/// HTTP handler: POST /catalogs
pub async fn create_catalog_handler(services: &CatalogServices, body: &[u8]) -> Result<Response<Body>, Error> {
    let payload: CreateCatalogPayload = serde_json::from_slice(body)?;

    match create_catalog(services, payload).await {
        Ok(catalog) => json_response(StatusCode::CREATED, serde_json::to_string(&catalog)?),
        Err(e) => {
            tracing::error!("❌ create_catalog_handler failed: {}", e);
            error_response(&e)
        }
    }
}

/// HTTP handler: PATCH /catalogs/{id}
pub async fn update_catalog_handler(
    services: &CatalogServices,
    catalog_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateCatalogRequest = serde_json::from_slice(body)?;

    match update_catalog(services, catalog_id, req.payload, req.version).await {
        Ok(catalog) => json_response(StatusCode::OK, serde_json::to_string(&catalog)?),
        Err(e) => {
            tracing::error!("❌ update_catalog_handler failed: catalog_id={}, error={}", catalog_id, e);
            error_response(&e)
        }
    }
}

/// HTTP handler: DELETE /catalogs/{id}
pub async fn delete_catalog_handler(
    services: &CatalogServices,
    catalog_id: &str,
) -> Result<Response<Body>, Error> {
    match delete_catalog(services, catalog_id).await {
        Ok(()) => no_content(),
        Err(e) => {
            tracing::error!("❌ delete_catalog_handler failed: catalog_id={}, error={}", catalog_id, e);
            error_response(&e)
        }
    }
}
