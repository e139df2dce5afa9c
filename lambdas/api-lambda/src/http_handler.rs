use catalog_images_block::{catalogs, images};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use lambda_http::http::header::{HeaderValue, VARY};
use std::sync::Arc;
use vitrine_atoms::catalogs::http as catalog_http;
use vitrine_atoms::featured::http as featured_http;
use vitrine_shared::AppState;

const ALLOWED_ORIGINS: [&str; 2] = ["https://vitrine.shop", "http://localhost:3000"];

fn cors_origin(request_origin: Option<&str>) -> &'static str {
    request_origin
        .and_then(|origin| ALLOWED_ORIGINS.iter().find(|allowed| **allowed == origin))
        .copied()
        .unwrap_or(ALLOWED_ORIGINS[0])
}

fn with_cors_headers(mut resp: Response<Body>, request_origin: Option<&str>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static(cors_origin(request_origin)),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

fn finalize_response(
    resp: Result<Response<Body>, Error>,
    request_origin: Option<&str>,
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(r, request_origin))
}

/// Main Lambda handler - routes catalog and storefront requests
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    let request_origin = event.headers().get("Origin").and_then(|v| v.to_str().ok());
    tracing::info!("🚀 API Lambda invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, request_origin));
    }

    let services = &state.services;
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Storefront
    if path.starts_with("/featured") {
        let resp = match (method, parts.as_slice()) {
            // GET /featured - featured items, newest first
            (&Method::GET, ["featured"]) => featured_http::list_featured_handler(services.featured.as_ref()).await,
            _ => not_found(),
        };
        return finalize_response(resp, request_origin);
    }

    if path.starts_with("/catalogs") {
        let resp = match (method, parts.as_slice()) {
            // --- CATALOGS ---
            // GET /catalogs - list catalogs
            (&Method::GET, ["catalogs"]) => catalog_http::list_catalogs_handler(services.catalogs.as_ref()).await,
            // POST /catalogs - create catalog
            (&Method::POST, ["catalogs"]) => {
                catalogs::create_catalog_handler(services, body).await
            }
            // GET /catalogs/{id} - get catalog
            (&Method::GET, ["catalogs", catalog_id]) => {
                catalog_http::get_catalog_handler(services.catalogs.as_ref(), catalog_id).await
            }
            // PATCH /catalogs/{id} - update catalog, un-featuring dropped images
            (&Method::PATCH, ["catalogs", catalog_id]) => {
                catalogs::update_catalog_handler(services, catalog_id, body).await
            }
            // DELETE /catalogs/{id} - delete catalog and its featured images
            (&Method::DELETE, ["catalogs", catalog_id]) => {
                catalogs::delete_catalog_handler(services, catalog_id).await
            }

            // --- CATALOG IMAGES ---
            // GET /catalogs/{id}/images - synced image list
            (&Method::GET, ["catalogs", catalog_id, "images"]) => {
                images::list_catalog_images_handler(services, catalog_id).await
            }
            // POST /catalogs/{id}/images - add image by URL
            (&Method::POST, ["catalogs", catalog_id, "images"]) => {
                images::add_image_url_handler(services, catalog_id, body).await
            }
            // DELETE /catalogs/{id}/images - remove one image
            (&Method::DELETE, ["catalogs", catalog_id, "images"]) => {
                images::delete_image_handler(services, catalog_id, body).await
            }
            // POST /catalogs/{id}/images/upload - bulk upload
            (&Method::POST, ["catalogs", catalog_id, "images", "upload"]) => {
                images::upload_images_handler(services, catalog_id, body).await
            }
            // POST /catalogs/{id}/images/favorite - toggle featured
            (&Method::POST, ["catalogs", catalog_id, "images", "favorite"]) => {
                images::toggle_favorite_handler(services, catalog_id, body).await
            }

            _ => not_found(),
        };

        return finalize_response(resp, request_origin);
    }

    finalize_response(not_found(), request_origin)
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}
