pub mod config;

use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use catalog_images_block::CatalogServices;
use std::sync::Arc;
use vitrine_atoms::catalogs::DynamoCatalogRepository;
use vitrine_atoms::events::ChangeBus;
use vitrine_atoms::featured::DynamoFeaturedRepository;
use vitrine_atoms::media::S3ImageStore;

pub use config::Config;

/// Shared state for one Lambda container; built once, reused across invocations
pub struct AppState {
    pub services: CatalogServices,
}

impl AppState {
    /// Wire the DynamoDB and S3 adapters behind the catalog services
    pub fn new(config: &Config, dynamo_client: DynamoClient, s3_client: S3Client) -> Self {
        let services = CatalogServices {
            catalogs: Arc::new(DynamoCatalogRepository::new(
                dynamo_client.clone(),
                config.table_name.as_str(),
            )),
            featured: Arc::new(DynamoFeaturedRepository::new(
                dynamo_client,
                config.table_name.as_str(),
            )),
            images: Arc::new(S3ImageStore::new(
                s3_client,
                config.bucket_name.as_str(),
                config.upload_prefix.as_str(),
                config.public_base_url.as_str(),
            )),
            bus: ChangeBus::new(config.event_bus_capacity),
        };

        Self { services }
    }

    /// Load AWS config from the environment and wire every repository
    pub async fn from_env() -> Self {
        let config = Config::from_env();
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        tracing::info!(
            "🔧 AppState ready: table={}, bucket={}, prefix={}",
            config.table_name,
            config.bucket_name,
            config.upload_prefix
        );

        Self::new(
            &config,
            DynamoClient::new(&aws_config),
            S3Client::new(&aws_config),
        )
    }
}
