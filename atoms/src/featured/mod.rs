// Re-export model types and service functions
pub mod model;
pub mod service;
pub mod http;

pub use model::{FeaturedDetails, FeaturedItem};
pub use service::{list_featured, DynamoFeaturedRepository, FeaturedRepository};
#[cfg(any(test, feature = "testing"))]
pub use service::MockFeaturedRepository;
pub use http::*;
