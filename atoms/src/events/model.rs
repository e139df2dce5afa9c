use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Catalog,
    Featured,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Fired after the repository acknowledged a write. Subscribers decide from
/// the payload whether they need to reload.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub entity: EntityKind,
    /// Catalog id, or image URL for featured items
    pub entity_id: String,
    pub change: ChangeKind,
}

impl ChangeEvent {
    pub fn catalog(catalog_id: impl Into<String>, change: ChangeKind) -> Self {
        Self {
            entity: EntityKind::Catalog,
            entity_id: catalog_id.into(),
            change,
        }
    }

    pub fn featured(image_url: impl Into<String>, change: ChangeKind) -> Self {
        Self {
            entity: EntityKind::Featured,
            entity_id: image_url.into(),
            change,
        }
    }
}
