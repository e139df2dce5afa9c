use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Catalog domain model - an admin-defined collection of furniture images
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Catalog {
    pub catalog_id: String,
    pub title: String,
    pub description: String,
    pub cover_image_url: Option<String>,

    /// Ordered multiset of content images; the same URL may appear twice
    #[serde(default)]
    pub content_images: Vec<CatalogImage>,

    pub created_at: String,
    pub updated_at: String,

    /// Bumped on every write, used as the compare-and-swap token
    pub version: u64,
}

/// One slot in a catalog's content list
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CatalogImage {
    pub image_id: String,
    pub url: String,
}

impl CatalogImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            image_id: uuid::Uuid::new_v4().to_string(),
            url: url.into(),
        }
    }

    /// Identifier for records stored before slots carried their own id
    pub fn positional(catalog_id: &str, index: usize, url: impl Into<String>) -> Self {
        Self {
            image_id: format!("{}-{}", catalog_id, index),
            url: url.into(),
        }
    }
}

impl Catalog {
    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        self.content_images.iter().map(|img| img.url.as_str())
    }

    /// Whether the URL is still used anywhere in this catalog (cover included)
    pub fn references(&self, url: &str) -> bool {
        self.cover_image_url.as_deref() == Some(url) || self.image_urls().any(|u| u == url)
    }

    /// The catalog as it reads once `payload` is written
    pub fn apply(&mut self, payload: &UpdateCatalogPayload) {
        if let Some(title) = &payload.title {
            self.title = title.clone();
        }
        if let Some(description) = &payload.description {
            self.description = description.clone();
        }
        if let Some(cover) = &payload.cover_image_url {
            self.cover_image_url = cover.clone();
        }
        if let Some(content) = payload.resolved_content_images() {
            self.content_images = content;
        }
    }

    /// Cover and content URLs, deduplicated
    pub fn referenced_urls(&self) -> BTreeSet<&str> {
        let mut urls: BTreeSet<&str> = self.image_urls().collect();
        if let Some(cover) = self.cover_image_url.as_deref() {
            urls.insert(cover);
        }
        urls
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCatalogPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub content_image_urls: Vec<String>,
}

/// Partial update; only the named fields are replaced.
/// The content list is always replaced wholesale, never patched.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct UpdateCatalogPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Absent leaves the cover alone, `null` clears it
    #[serde(default, deserialize_with = "present_or_null")]
    pub cover_image_url: Option<Option<String>>,
    #[serde(skip)]
    pub content_images: Option<Vec<CatalogImage>>,
    /// HTTP callers send plain URLs; see `resolve_against`
    #[serde(default, rename = "content_image_urls")]
    pub content_image_urls: Option<Vec<String>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl UpdateCatalogPayload {
    pub fn with_content_images(content_images: Vec<CatalogImage>) -> Self {
        Self {
            content_images: Some(content_images),
            ..Default::default()
        }
    }

    /// Turn plain content URLs into slots, keeping the id of a stored slot
    /// for every URL that is still there. Slots are matched as a multiset in
    /// order, so the n-th copy of a URL keeps the n-th stored id.
    pub fn resolve_against(mut self, existing: &[CatalogImage]) -> Self {
        if self.content_images.is_some() {
            return self;
        }
        if let Some(urls) = self.content_image_urls.take() {
            let mut unclaimed: Vec<Option<&CatalogImage>> = existing.iter().map(Some).collect();
            let slots = urls
                .into_iter()
                .map(|url| {
                    let reused = unclaimed
                        .iter_mut()
                        .find(|slot| matches!(slot, Some(img) if img.url == url))
                        .and_then(Option::take);
                    match reused {
                        Some(img) => img.clone(),
                        None => CatalogImage::new(url),
                    }
                })
                .collect();
            self.content_images = Some(slots);
        }
        self
    }

    /// Resolves the content list to write, preferring explicit slots
    pub fn resolved_content_images(&self) -> Option<Vec<CatalogImage>> {
        self.content_images.clone().or_else(|| {
            self.content_image_urls
                .as_ref()
                .map(|urls| urls.iter().map(|u| CatalogImage::new(u.as_str())).collect())
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.cover_image_url.is_none()
            && self.content_images.is_none()
            && self.content_image_urls.is_none()
    }
}
