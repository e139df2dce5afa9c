use lambda_http::{Body, Error as LambdaError, Response, http::StatusCode};
use super::service::{list_featured, FeaturedRepository};
use crate::catalogs::http::{error_response, json_response};

/// HTTP Handler: GET /featured (storefront highlights)
pub async fn list_featured_handler(
    featured: &dyn FeaturedRepository,
) -> Result<Response<Body>, LambdaError> {
    match list_featured(featured).await {
        Ok(items) => json_response(StatusCode::OK, serde_json::to_string(&items)?),
        Err(e) => {
            tracing::error!("❌ list_featured_handler failed: {}", e);
            error_response(&e)
        }
    }
}
