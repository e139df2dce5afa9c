use lambda_http::{Body, Error as LambdaError, Response, http::StatusCode};
use super::service::CatalogRepository;
use crate::error::AtomError;

/// HTTP Handler: GET /catalogs
pub async fn list_catalogs_handler(
    catalogs: &dyn CatalogRepository,
) -> Result<Response<Body>, LambdaError> {
    match catalogs.get_all().await {
        Ok(list) => json_response(StatusCode::OK, serde_json::to_string(&list)?),
        Err(e) => error_response(&e),
    }
}

/// HTTP Handler: GET /catalogs/{id}
pub async fn get_catalog_handler(
    catalogs: &dyn CatalogRepository,
    catalog_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match catalogs.get_by_id(catalog_id).await {
        Ok(Some(catalog)) => json_response(StatusCode::OK, serde_json::to_string(&catalog)?),
        Ok(None) => error_response(&AtomError::NotFound("Catalog not found".to_string())),
        Err(e) => error_response(&e),
    }
}

pub fn json_response(status: StatusCode, body: String) -> Result<Response<Body>, LambdaError> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(body.into())
        .map_err(Box::new)?)
}

pub fn error_response(error: &AtomError) -> Result<Response<Body>, LambdaError> {
    json_response(
        error.status_code(),
        serde_json::json!({ "error": error.to_string() }).to_string(),
    )
}

pub fn no_content() -> Result<Response<Body>, LambdaError> {
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Empty)
        .map_err(Box::new)?)
}
