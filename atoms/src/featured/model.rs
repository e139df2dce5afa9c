use serde::{Deserialize, Serialize};

pub const DEFAULT_FEATURED_TITLE: &str = "Featured product";
pub const DEFAULT_FEATURED_DESCRIPTION: &str = "Added from the admin panel";

/// Featured item - marks one image URL as shown in the storefront highlights.
/// Existence of the record is the only source of truth for "featured".
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FeaturedItem {
    pub featured_id: String,
    pub image_url: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
}

/// Storefront copy for a featured item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturedDetails {
    pub title: String,
    pub description: String,
}

impl Default for FeaturedDetails {
    fn default() -> Self {
        Self {
            title: DEFAULT_FEATURED_TITLE.to_string(),
            description: DEFAULT_FEATURED_DESCRIPTION.to_string(),
        }
    }
}
