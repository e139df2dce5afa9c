use std::env;

const DEFAULT_TABLE_NAME: &str = "vitrine";
const DEFAULT_BUCKET_NAME: &str = "vitrine-catalog-images";
const DEFAULT_UPLOAD_PREFIX: &str = "catalog-images/public";
const DEFAULT_EVENT_BUS_CAPACITY: usize = 64;

/// Environment configuration, read once at cold start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub table_name: String,
    pub bucket_name: String,
    pub upload_prefix: String,
    /// Base the store prefixes object keys with to build public URLs
    pub public_base_url: String,
    pub event_bus_capacity: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bucket_name = var("S3_BUCKET_NAME", DEFAULT_BUCKET_NAME);
        let public_base_url = var(
            "PUBLIC_ASSET_BASE_URL",
            &format!("https://{}.s3.amazonaws.com", bucket_name),
        );

        let event_bus_capacity = match lookup("EVENT_BUS_CAPACITY") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "EVENT_BUS_CAPACITY={} is not a number, using {}",
                    raw,
                    DEFAULT_EVENT_BUS_CAPACITY
                );
                DEFAULT_EVENT_BUS_CAPACITY
            }),
            None => DEFAULT_EVENT_BUS_CAPACITY,
        };

        Self {
            table_name: var("TABLE_NAME", DEFAULT_TABLE_NAME),
            bucket_name,
            upload_prefix: var("UPLOAD_PREFIX", DEFAULT_UPLOAD_PREFIX),
            public_base_url,
            event_bus_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config(&[]);
        assert_eq!(cfg.table_name, "vitrine");
        assert_eq!(cfg.bucket_name, "vitrine-catalog-images");
        assert_eq!(cfg.upload_prefix, "catalog-images/public");
        assert_eq!(cfg.public_base_url, "https://vitrine-catalog-images.s3.amazonaws.com");
        assert_eq!(cfg.event_bus_capacity, 64);
    }

    #[test]
    fn public_url_follows_the_bucket_unless_overridden() {
        let cfg = config(&[("S3_BUCKET_NAME", "shop-assets")]);
        assert_eq!(cfg.public_base_url, "https://shop-assets.s3.amazonaws.com");

        let cfg = config(&[
            ("S3_BUCKET_NAME", "shop-assets"),
            ("PUBLIC_ASSET_BASE_URL", "https://cdn.shop.example"),
        ]);
        assert_eq!(cfg.public_base_url, "https://cdn.shop.example");
    }

    #[test]
    fn blank_or_garbage_values_fall_back() {
        let cfg = config(&[("TABLE_NAME", "  "), ("EVENT_BUS_CAPACITY", "lots")]);
        assert_eq!(cfg.table_name, "vitrine");
        assert_eq!(cfg.event_bus_capacity, 64);
    }
}
