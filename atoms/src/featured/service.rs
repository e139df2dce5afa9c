use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, WriteRequest};
use super::model::FeaturedItem;
use crate::error::{AtomError, AtomResult};
use std::collections::HashMap;
use tokio::time::{sleep, Duration};

const FEATURED_PK: &str = "FEATURED";
const FEATURED_SK_PREFIX: &str = "FEATURED#";

/// Remote collection of featured items keyed by image URL.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FeaturedRepository: Send + Sync {
    /// Insert a featured item. Inserting a URL that is already featured
    /// returns the stored record instead of creating a second one.
    async fn insert(
        &self,
        image_url: &str,
        title: &str,
        description: &str,
    ) -> AtomResult<FeaturedItem>;

    async fn delete_by_reference(&self, image_url: &str) -> AtomResult<()>;

    async fn delete_by_reference_set(&self, image_urls: &[String]) -> AtomResult<()>;

    async fn scan_all(&self) -> AtomResult<Vec<FeaturedItem>>;
}

/// Storefront listing, newest first
pub async fn list_featured(featured: &dyn FeaturedRepository) -> AtomResult<Vec<FeaturedItem>> {
    let mut items = featured.scan_all().await?;
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(items)
}

/// Featured items stored in the single table:
/// PK = "FEATURED"
/// SK = "FEATURED#{image_url}"
///
/// Keying on the URL makes "one record per URL" a property of the table.
#[derive(Clone, Debug)]
pub struct DynamoFeaturedRepository {
    client: DynamoClient,
    table_name: String,
}

impl DynamoFeaturedRepository {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    async fn get_by_reference(&self, image_url: &str) -> AtomResult<Option<FeaturedItem>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(FEATURED_PK.to_string()))
            .key("SK", AttributeValue::S(sort_key(image_url)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| AtomError::Repository(format!("DynamoDB get_item error: {}", e)))?;

        Ok(result.item().and_then(featured_from_item))
    }

    /// Batch delete (25 items per request with retry on unprocessed items)
    async fn batch_delete(&self, image_urls: &[String]) -> AtomResult<()> {
        for chunk in image_urls.chunks(25) {
            let mut write_reqs = Vec::with_capacity(chunk.len());
            for url in chunk {
                let delete = DeleteRequest::builder()
                    .key("PK", AttributeValue::S(FEATURED_PK.to_string()))
                    .key("SK", AttributeValue::S(sort_key(url)))
                    .build()
                    .map_err(|e| AtomError::Repository(format!("Failed to build delete request: {}", e)))?;
                write_reqs.push(WriteRequest::builder().delete_request(delete).build());
            }

            let mut unprocessed = Some(write_reqs);
            let mut attempts = 0;
            while let Some(reqs) = unprocessed {
                attempts += 1;
                let result = self
                    .client
                    .batch_write_item()
                    .request_items(&self.table_name, reqs)
                    .send()
                    .await
                    .map_err(|e| AtomError::Repository(format!("DynamoDB batch_write_item error: {}", e)))?;

                unprocessed = result
                    .unprocessed_items()
                    .and_then(|m| m.get(&self.table_name))
                    .filter(|v| !v.is_empty())
                    .cloned();

                if unprocessed.is_some() && attempts >= 5 {
                    return Err(AtomError::Repository(format!(
                        "DynamoDB batch_write_item left unprocessed deletes after {} attempts",
                        attempts
                    )));
                }
                if unprocessed.is_some() {
                    sleep(Duration::from_millis(100 * attempts)).await;
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl FeaturedRepository for DynamoFeaturedRepository {
    async fn insert(
        &self,
        image_url: &str,
        title: &str,
        description: &str,
    ) -> AtomResult<FeaturedItem> {
        let featured_id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let put = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item("PK", AttributeValue::S(FEATURED_PK.to_string()))
            .item("SK", AttributeValue::S(sort_key(image_url)))
            .item("featured_id", AttributeValue::S(featured_id.clone()))
            .item("image_url", AttributeValue::S(image_url.to_string()))
            .item("title", AttributeValue::S(title.to_string()))
            .item("description", AttributeValue::S(description.to_string()))
            .item("created_at", AttributeValue::S(now.clone()))
            .condition_expression("attribute_not_exists(SK)")
            .send()
            .await;

        match put {
            Ok(_) => Ok(FeaturedItem {
                featured_id,
                image_url: image_url.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                created_at: now,
            }),
            Err(e) => {
                let already_featured = e
                    .as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false);

                if !already_featured {
                    return Err(AtomError::Repository(format!("DynamoDB put_item error: {}", e)));
                }

                tracing::info!("Image already featured, keeping existing record: {}", image_url);
                self.get_by_reference(image_url)
                    .await?
                    .ok_or_else(|| AtomError::Repository(format!(
                        "Featured item for {} vanished during insert",
                        image_url
                    )))
            }
        }
    }

    async fn delete_by_reference(&self, image_url: &str) -> AtomResult<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(FEATURED_PK.to_string()))
            .key("SK", AttributeValue::S(sort_key(image_url)))
            .send()
            .await
            .map_err(|e| AtomError::Repository(format!("DynamoDB delete_item error: {}", e)))?;

        Ok(())
    }

    async fn delete_by_reference_set(&self, image_urls: &[String]) -> AtomResult<()> {
        if image_urls.is_empty() {
            return Ok(());
        }

        let mut unique: Vec<String> = image_urls.to_vec();
        unique.sort();
        unique.dedup();

        self.batch_delete(&unique).await
    }

    async fn scan_all(&self) -> AtomResult<Vec<FeaturedItem>> {
        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(FEATURED_PK.to_string()))
                .expression_attribute_values(
                    ":sk_prefix",
                    AttributeValue::S(FEATURED_SK_PREFIX.to_string()),
                )
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| AtomError::Repository(format!("DynamoDB query error: {}", e)))?;

            items.extend(result.items().iter().filter_map(featured_from_item));

            start_key = result.last_evaluated_key().cloned();
            if start_key.is_none() {
                break;
            }
        }

        Ok(items)
    }
}

fn sort_key(image_url: &str) -> String {
    format!("{}{}", FEATURED_SK_PREFIX, image_url)
}

fn featured_from_item(item: &HashMap<String, AttributeValue>) -> Option<FeaturedItem> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let image_url = sk.strip_prefix(FEATURED_SK_PREFIX)?;

    Some(FeaturedItem {
        featured_id: item
            .get("featured_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        image_url: item
            .get("image_url")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| image_url.to_string()),
        title: item
            .get("title")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| super::model::DEFAULT_FEATURED_TITLE.to_string()),
        description: item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    })
}
