// Re-export model types and service functions
pub mod model;
pub mod service;
pub mod http;

pub use model::{Catalog, CatalogImage, CreateCatalogPayload, UpdateCatalogPayload};
pub use service::{CatalogRepository, DynamoCatalogRepository};
#[cfg(any(test, feature = "testing"))]
pub use service::MockCatalogRepository;
pub use http::*;
