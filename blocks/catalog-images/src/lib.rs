//! Catalog images block: keeps catalog slots and storefront featured items in
//! sync, and owns the cascades that span both.

pub mod catalogs;
pub mod favorites;
pub mod images;
pub mod session;
pub mod types;

pub use favorites::FavoriteSync;
pub use session::CatalogImageSession;
pub use types::{CatalogServices, SyncedImage};
