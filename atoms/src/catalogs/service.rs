use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use super::model::{Catalog, CatalogImage, CreateCatalogPayload, UpdateCatalogPayload};
use crate::error::{AtomError, AtomResult};
use std::collections::HashMap;

const CATALOG_PK: &str = "CATALOG";
const CATALOG_SK_PREFIX: &str = "CATALOG#";

/// Remote collection of catalog records. No domain logic beyond CRUD.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All catalogs, newest first
    async fn get_all(&self) -> AtomResult<Vec<Catalog>>;

    async fn get_by_id(&self, catalog_id: &str) -> AtomResult<Option<Catalog>>;

    async fn create(&self, payload: CreateCatalogPayload) -> AtomResult<Catalog>;

    /// Replace the named fields if the stored version still equals `expected_version`.
    /// Fails with `NotFound` when the catalog is gone and `Conflict` when the version moved.
    async fn update(
        &self,
        catalog_id: &str,
        payload: UpdateCatalogPayload,
        expected_version: u64,
    ) -> AtomResult<Catalog>;

    async fn delete(&self, catalog_id: &str) -> AtomResult<()>;
}

/// Catalogs stored in the single table:
/// PK = "CATALOG"
/// SK = "CATALOG#{catalog_id}"
#[derive(Clone, Debug)]
pub struct DynamoCatalogRepository {
    client: DynamoClient,
    table_name: String,
}

impl DynamoCatalogRepository {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn sort_key(catalog_id: &str) -> String {
        format!("{}{}", CATALOG_SK_PREFIX, catalog_id)
    }
}

#[async_trait]
impl CatalogRepository for DynamoCatalogRepository {
    async fn get_all(&self) -> AtomResult<Vec<Catalog>> {
        let mut catalogs = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(CATALOG_PK.to_string()))
                .expression_attribute_values(
                    ":sk_prefix",
                    AttributeValue::S(CATALOG_SK_PREFIX.to_string()),
                )
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| AtomError::Repository(format!("DynamoDB query error: {}", e)))?;

            catalogs.extend(result.items().iter().filter_map(catalog_from_item));

            start_key = result.last_evaluated_key().cloned();
            if start_key.is_none() {
                break;
            }
        }

        // Newest first, same as the admin panel lists them
        catalogs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(catalogs)
    }

    async fn get_by_id(&self, catalog_id: &str) -> AtomResult<Option<Catalog>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(CATALOG_PK.to_string()))
            .key("SK", AttributeValue::S(Self::sort_key(catalog_id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| AtomError::Repository(format!("DynamoDB get_item error: {}", e)))?;

        Ok(result.item().and_then(catalog_from_item))
    }

    async fn create(&self, payload: CreateCatalogPayload) -> AtomResult<Catalog> {
        let catalog_id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let content_images: Vec<CatalogImage> = payload
            .content_image_urls
            .iter()
            .map(|url| CatalogImage::new(url.as_str()))
            .collect();

        let mut builder = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item("PK", AttributeValue::S(CATALOG_PK.to_string()))
            .item("SK", AttributeValue::S(Self::sort_key(&catalog_id)))
            .item("title", AttributeValue::S(payload.title.clone()))
            .item("description", AttributeValue::S(payload.description.clone()))
            .item("content_images", content_images_to_attr(&content_images))
            .item("created_at", AttributeValue::S(now.clone()))
            .item("updated_at", AttributeValue::S(now.clone()))
            .item("version", AttributeValue::N("1".to_string()))
            .condition_expression("attribute_not_exists(SK)");

        // Cover is optional, only write it when present
        if let Some(cover) = &payload.cover_image_url {
            builder = builder.item("cover_image_url", AttributeValue::S(cover.clone()));
        }

        builder
            .send()
            .await
            .map_err(|e| AtomError::Repository(format!("DynamoDB put_item error: {}", e)))?;

        tracing::info!("Created catalog {} ({})", catalog_id, payload.title);

        Ok(Catalog {
            catalog_id,
            title: payload.title,
            description: payload.description,
            cover_image_url: payload.cover_image_url,
            content_images,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        })
    }

    async fn update(
        &self,
        catalog_id: &str,
        payload: UpdateCatalogPayload,
        expected_version: u64,
    ) -> AtomResult<Catalog> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut update_expr = vec![
            "#updated_at = :updated_at",
            "#version = if_not_exists(#version, :zero) + :one",
        ];
        let mut expr_names = HashMap::new();
        let mut expr_values = HashMap::new();

        expr_names.insert("#updated_at".to_string(), "updated_at".to_string());
        expr_names.insert("#version".to_string(), "version".to_string());
        expr_values.insert(":updated_at".to_string(), AttributeValue::S(now));
        expr_values.insert(":zero".to_string(), AttributeValue::N("0".to_string()));
        expr_values.insert(":one".to_string(), AttributeValue::N("1".to_string()));
        expr_values.insert(
            ":expected".to_string(),
            AttributeValue::N(expected_version.to_string()),
        );

        if let Some(title) = &payload.title {
            update_expr.push("#title = :title");
            expr_names.insert("#title".to_string(), "title".to_string());
            expr_values.insert(":title".to_string(), AttributeValue::S(title.clone()));
        }

        if let Some(description) = &payload.description {
            update_expr.push("#description = :description");
            expr_names.insert("#description".to_string(), "description".to_string());
            expr_values.insert(":description".to_string(), AttributeValue::S(description.clone()));
        }

        let mut remove_expr = Vec::new();
        match &payload.cover_image_url {
            Some(Some(cover)) => {
                update_expr.push("#cover_image_url = :cover_image_url");
                expr_names.insert("#cover_image_url".to_string(), "cover_image_url".to_string());
                expr_values.insert(":cover_image_url".to_string(), AttributeValue::S(cover.clone()));
            }
            Some(None) => {
                remove_expr.push("#cover_image_url");
                expr_names.insert("#cover_image_url".to_string(), "cover_image_url".to_string());
            }
            None => {}
        }

        if let Some(content_images) = payload.resolved_content_images() {
            update_expr.push("#content_images = :content_images");
            expr_names.insert("#content_images".to_string(), "content_images".to_string());
            expr_values.insert(":content_images".to_string(), content_images_to_attr(&content_images));
        }

        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(CATALOG_PK.to_string()))
            .key("SK", AttributeValue::S(Self::sort_key(catalog_id)))
            .update_expression(update_expression(&update_expr, &remove_expr))
            // Rows written before versioning decode as version 0
            .condition_expression(
                "attribute_exists(SK) AND (#version = :expected OR (attribute_not_exists(#version) AND :expected = :zero))",
            )
            .return_values(ReturnValue::AllNew);

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        match builder.send().await {
            Ok(output) => output
                .attributes()
                .and_then(catalog_from_item)
                .ok_or_else(|| AtomError::Repository("DynamoDB update_item returned no attributes".to_string())),
            Err(e) => {
                let condition_failed = e
                    .as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false);

                if !condition_failed {
                    return Err(AtomError::Repository(format!("DynamoDB update_item error: {}", e)));
                }

                // The condition covers both "gone" and "stale", tell them apart
                match self.get_by_id(catalog_id).await? {
                    None => Err(AtomError::NotFound("Catalog not found".to_string())),
                    Some(current) => {
                        tracing::warn!(
                            "Catalog {} version moved: expected={}, current={}",
                            catalog_id,
                            expected_version,
                            current.version
                        );
                        Err(AtomError::Conflict(format!(
                            "Catalog {} was modified concurrently",
                            catalog_id
                        )))
                    }
                }
            }
        }
    }

    async fn delete(&self, catalog_id: &str) -> AtomResult<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(CATALOG_PK.to_string()))
            .key("SK", AttributeValue::S(Self::sort_key(catalog_id)))
            .send()
            .await
            .map_err(|e| AtomError::Repository(format!("DynamoDB delete_item error: {}", e)))?;

        Ok(())
    }
}

fn update_expression(set: &[&str], remove: &[&str]) -> String {
    if remove.is_empty() {
        format!("SET {}", set.join(", "))
    } else {
        format!("SET {} REMOVE {}", set.join(", "), remove.join(", "))
    }
}

/// Map a DynamoDB item into a catalog, skipping rows that are not catalogs
pub(crate) fn catalog_from_item(item: &HashMap<String, AttributeValue>) -> Option<Catalog> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let catalog_id = sk.strip_prefix(CATALOG_SK_PREFIX)?;

    Some(Catalog {
        catalog_id: catalog_id.to_string(),
        title: item
            .get("title")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        description: item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        cover_image_url: item
            .get("cover_image_url")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        content_images: item
            .get("content_images")
            .and_then(|v| v.as_l().ok())
            .map(|list| content_images_from_attr(catalog_id, list))
            .unwrap_or_default(),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        updated_at: item
            .get("updated_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        version: item
            .get("version")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0),
    })
}

/// Slots are stored as maps; older rows hold bare URL strings
fn content_images_from_attr(catalog_id: &str, list: &[AttributeValue]) -> Vec<CatalogImage> {
    list.iter()
        .enumerate()
        .filter_map(|(index, value)| match value {
            AttributeValue::S(url) => Some(CatalogImage::positional(catalog_id, index, url.as_str())),
            AttributeValue::M(fields) => {
                let url = fields.get("url").and_then(|v| v.as_s().ok())?;
                let image_id = fields
                    .get("image_id")
                    .and_then(|v| v.as_s().ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("{}-{}", catalog_id, index));
                Some(CatalogImage {
                    image_id,
                    url: url.to_string(),
                })
            }
            _ => None,
        })
        .collect()
}

fn content_images_to_attr(content_images: &[CatalogImage]) -> AttributeValue {
    AttributeValue::L(
        content_images
            .iter()
            .map(|img| {
                let mut fields = HashMap::new();
                fields.insert("image_id".to_string(), AttributeValue::S(img.image_id.clone()));
                fields.insert("url".to_string(), AttributeValue::S(img.url.clone()));
                AttributeValue::M(fields)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_item(catalog_id: &str) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert("PK".to_string(), AttributeValue::S(CATALOG_PK.to_string()));
        item.insert("SK".to_string(), AttributeValue::S(format!("CATALOG#{}", catalog_id)));
        item.insert("title".to_string(), AttributeValue::S("Dining".to_string()));
        item.insert("version".to_string(), AttributeValue::N("4".to_string()));
        item
    }

    #[test]
    fn legacy_url_lists_decode_with_positional_ids() {
        let mut item = base_item("c1");
        item.insert(
            "content_images".to_string(),
            AttributeValue::L(vec![
                AttributeValue::S("u1".to_string()),
                AttributeValue::S("u2".to_string()),
            ]),
        );

        let catalog = catalog_from_item(&item).unwrap();
        assert_eq!(catalog.catalog_id, "c1");
        assert_eq!(catalog.version, 4);
        assert_eq!(
            catalog.content_images,
            vec![
                CatalogImage::positional("c1", 0, "u1"),
                CatalogImage::positional("c1", 1, "u2"),
            ]
        );
    }

    #[test]
    fn slot_maps_survive_an_encode_decode_cycle() {
        let slots = vec![CatalogImage::new("a.png"), CatalogImage::new("a.png")];
        let mut item = base_item("c2");
        item.insert("content_images".to_string(), content_images_to_attr(&slots));

        let catalog = catalog_from_item(&item).unwrap();
        assert_eq!(catalog.content_images, slots);
    }

    #[test]
    fn clearing_the_cover_adds_a_remove_clause() {
        assert_eq!(update_expression(&["#a = :a"], &[]), "SET #a = :a");
        assert_eq!(
            update_expression(&["#a = :a", "#b = :b"], &["#cover_image_url"]),
            "SET #a = :a, #b = :b REMOVE #cover_image_url"
        );
    }

    #[test]
    fn non_catalog_rows_are_skipped() {
        let mut item = base_item("c3");
        item.insert("SK".to_string(), AttributeValue::S("FEATURED#x".to_string()));
        assert!(catalog_from_item(&item).is_none());
    }
}
