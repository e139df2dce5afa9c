use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lambda_http::{Body, Error, Response, http::StatusCode};
use vitrine_atoms::catalogs::http::{error_response, json_response, no_content};
use vitrine_atoms::media::UploadFile;
use vitrine_atoms::AtomError;
use crate::session::CatalogImageSession;
use crate::types::{CatalogServices, FavoriteToggled, ImageUrlRequest, UploadImagesRequest};

/// HTTP handler: GET /catalogs/{id}/images
pub async fn list_catalog_images_handler(
    services: &CatalogServices,
    catalog_id: &str,
) -> Result<Response<Body>, Error> {
    let mut session = CatalogImageSession::open(services.clone(), catalog_id);

    match session.load().await {
        Ok(images) => json_response(StatusCode::OK, serde_json::to_string(images)?),
        Err(e) => {
            tracing::error!("❌ list_catalog_images_handler failed: catalog_id={}, error={}", catalog_id, e);
            error_response(&e)
        }
    }
}

/// HTTP handler: POST /catalogs/{id}/images  { "url": ... }
pub async fn add_image_url_handler(
    services: &CatalogServices,
    catalog_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: ImageUrlRequest = serde_json::from_slice(body)?;
    let mut session = CatalogImageSession::open(services.clone(), catalog_id);

    match session.add_image_by_url(&req.url).await {
        Ok(_) => json_response(StatusCode::CREATED, serde_json::to_string(session.images())?),
        Err(e) => {
            tracing::error!(
                "❌ add_image_url_handler failed: catalog_id={}, url={}, error={}",
                catalog_id,
                req.url,
                e
            );
            error_response(&e)
        }
    }
}

/// HTTP handler: POST /catalogs/{id}/images/upload
pub async fn upload_images_handler(
    services: &CatalogServices,
    catalog_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UploadImagesRequest = serde_json::from_slice(body)?;

    tracing::info!(
        "📥 upload_images_handler: catalog_id={}, files={}",
        catalog_id,
        req.files.len()
    );

    let mut files = Vec::with_capacity(req.files.len());
    for f in req.files {
        let bytes = match STANDARD.decode(f.data.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                return error_response(&AtomError::Validation(format!(
                    "File {} is not valid base64: {}",
                    f.file_name, e
                )))
            }
        };
        files.push(UploadFile {
            file_name: f.file_name,
            content_type: f.content_type,
            bytes,
        });
    }

    let mut session = CatalogImageSession::open(services.clone(), catalog_id);

    match session.add_images_by_upload(files).await {
        Ok(report) => {
            let status = if report.failures.is_empty() {
                StatusCode::CREATED
            } else {
                StatusCode::MULTI_STATUS
            };
            let body = serde_json::json!({
                "succeeded": report.succeeded(),
                "failed": report.failed(),
                "error": report.partial_failure().map(|e| e.to_string()),
                "report": report,
                "images": session.images(),
            });
            json_response(status, body.to_string())
        }
        Err(e) => {
            tracing::error!("❌ upload_images_handler failed: catalog_id={}, error={}", catalog_id, e);
            error_response(&e)
        }
    }
}

/// HTTP handler: DELETE /catalogs/{id}/images  { "url": ... }
pub async fn delete_image_handler(
    services: &CatalogServices,
    catalog_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: ImageUrlRequest = serde_json::from_slice(body)?;
    let mut session = CatalogImageSession::open(services.clone(), catalog_id);

    match session.delete_image(&req.url).await {
        Ok(_) => no_content(),
        Err(e) => {
            tracing::error!(
                "❌ delete_image_handler failed: catalog_id={}, url={}, error={}",
                catalog_id,
                req.url,
                e
            );
            error_response(&e)
        }
    }
}

/// HTTP handler: POST /catalogs/{id}/images/favorite  { "url": ... }
pub async fn toggle_favorite_handler(
    services: &CatalogServices,
    catalog_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: ImageUrlRequest = serde_json::from_slice(body)?;
    let mut session = CatalogImageSession::open(services.clone(), catalog_id);

    if let Err(e) = session.load().await {
        return error_response(&e);
    }

    match session.toggle_favorite(&req.url).await {
        Ok(is_favorite) => json_response(
            StatusCode::OK,
            serde_json::to_string(&FavoriteToggled {
                url: req.url,
                is_favorite,
            })?,
        ),
        Err(e) => {
            tracing::error!(
                "❌ toggle_favorite_handler failed: catalog_id={}, url={}, error={}",
                catalog_id,
                req.url,
                e
            );
            error_response(&e)
        }
    }
}
