use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Options shared by every `cookpress` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the content API (e.g. https://example.com/wp-json)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Default page size for listing queries
    #[arg(long, global = true)]
    pub per_page: Option<u32>,

    /// Path to data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub pagination: PaginationConfig,
    pub cache: CacheConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Request timeout. Unset leaves it to the transport.
    pub timeout_secs: Option<u64>,
    pub endpoints: Endpoints,
}

/// Endpoint paths, relative to `ApiConfig::base_url`.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Endpoints {
    pub posts: String,
    pub pages: String,
    pub media: String,
    pub categories: String,
    pub tags: String,
    pub comments: String,
    pub users: String,
    pub search: String,
    pub menus: String,
    pub menu_locations: String,
    pub navigation: String,
    pub navigation_items: String,
    pub types: String,
    pub taxonomies: String,
    /// Provided by an archive plugin, not WordPress core.
    pub archives: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

/// Consumed by whatever caches rendered pages; the client itself never caches.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub revalidate_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tiffycooks.com/wp-json".to_string(),
            timeout_secs: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            posts: "/wp/v2/posts".to_string(),
            pages: "/wp/v2/pages".to_string(),
            media: "/wp/v2/media".to_string(),
            categories: "/wp/v2/categories".to_string(),
            tags: "/wp/v2/tags".to_string(),
            comments: "/wp/v2/comments".to_string(),
            users: "/wp/v2/users".to_string(),
            search: "/wp/v2/search".to_string(),
            menus: "/menus/v1/menus".to_string(),
            menu_locations: "/menus/v1/locations".to_string(),
            navigation: "/wp/v2/navigation".to_string(),
            navigation_items: "/wp/v2/menu-items".to_string(),
            types: "/wp/v2/types".to_string(),
            taxonomies: "/wp/v2/taxonomies".to_string(),
            archives: "/wp/v2/archives".to_string(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 12,
            max_page_size: 100,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            revalidate_secs: 3600,
        }
    }
}

impl Config {
    pub fn load(args: &ConfigArgs) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(args);
        let config_path = args
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref base_url) = args.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(per_page) = args.per_page {
            config.pagination.default_page_size = per_page;
        }

        config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
        if config.pagination.max_page_size == 0 {
            anyhow::bail!("pagination.max_page_size must be at least 1");
        }

        Ok(config)
    }

    pub fn data_dir(args: &ConfigArgs) -> PathBuf {
        args.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".cookpress")
        })
    }

    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_secs(self.cache.revalidate_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.api.timeout_secs.map(Duration::from_secs)
    }
}
