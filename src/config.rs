//! Environment-driven configuration for the storage proxy and the public site.

fn env_or(name: &str, fallback: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Object-storage settings. Only the storage proxy endpoints read these.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub public_base_url: String,
    pub quota_gb: f64,
    pub upload_max_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let endpoint = env_or("STORAGE_ENDPOINT", "https://nos.wjv-1.neo.id")
            .trim_end_matches('/')
            .to_string();
        let bucket = env_or("STORAGE_BUCKET", "gallery-photos");
        let public_base_url = env_or(
            "STORAGE_PUBLIC_BASE_URL",
            &format!("{}/{}", endpoint, bucket),
        )
        .trim_end_matches('/')
        .to_string();

        Self {
            region: env_or("STORAGE_REGION", "idn"),
            access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID").unwrap_or_default(),
            secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY").unwrap_or_default(),
            quota_gb: std::env::var("STORAGE_QUOTA_GB")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|q: &f64| q.is_finite() && *q >= 0.0)
                .unwrap_or(0.0),
            upload_max_bytes: std::env::var("UPLOAD_MAX_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100 * 1024 * 1024),
            endpoint,
            bucket,
            public_base_url,
        }
    }
}

impl StorageConfig {
    /// True when credentials for the remote bucket are present.
    pub fn has_credentials(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }

    pub fn quota_bytes(&self) -> u64 {
        (self.quota_gb * 1024.0 * 1024.0 * 1024.0) as u64
    }
}

/// Public site settings used for absolute links (sitemap, share URLs).
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: env_or("SITE_URL", "https://www.ningratwedding.id")
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default_is_usable() {
        let config = StorageConfig::default();
        assert!(!config.bucket.is_empty());
        assert!(!config.public_base_url.ends_with('/'));
        assert!(config.upload_max_bytes > 0);
    }

    #[test]
    fn test_quota_bytes_from_gb() {
        let config = StorageConfig {
            quota_gb: 2.0,
            ..StorageConfig::default()
        };
        assert_eq!(config.quota_bytes(), 2 * 1024 * 1024 * 1024);

        let config = StorageConfig {
            quota_gb: 0.0,
            ..StorageConfig::default()
        };
        assert_eq!(config.quota_bytes(), 0);
    }
}
