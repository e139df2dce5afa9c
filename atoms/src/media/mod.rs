// Re-export model types and service functions
pub mod model;
pub mod service;

pub use model::{validate_image_url, UploadFailure, UploadFile, UploadReport, MAX_UPLOAD_BYTES};
pub use service::{ImageStore, S3ImageStore};
#[cfg(any(test, feature = "testing"))]
pub use service::MockImageStore;
