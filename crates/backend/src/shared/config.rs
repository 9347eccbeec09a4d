use once_cell::sync::OnceCell;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Page-size defaults and floors for the chunked dataset loader.
#[derive(Debug, Deserialize, Clone)]
pub struct LoaderConfig {
    /// Primary (order-keyed) track page size
    #[serde(default = "default_order_page_size")]
    pub order_page_size: u32,
    #[serde(default = "default_order_page_floor")]
    pub order_page_floor: u32,
    /// Supplemental datasets (ad insights, global costs, session analytics)
    #[serde(default = "default_supplemental_page_size")]
    pub supplemental_page_size: u32,
    /// Secondary supplemental dataset (shop analytics)
    #[serde(default = "default_secondary_page_size")]
    pub secondary_page_size: u32,
    #[serde(default = "default_supplemental_page_floor")]
    pub supplemental_page_floor: u32,
}

fn default_order_page_size() -> u32 {
    20
}
fn default_order_page_floor() -> u32 {
    1
}
fn default_supplemental_page_size() -> u32 {
    400
}
fn default_secondary_page_size() -> u32 {
    200
}
fn default_supplemental_page_floor() -> u32 {
    25
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            order_page_size: default_order_page_size(),
            order_page_floor: default_order_page_floor(),
            supplemental_page_size: default_supplemental_page_size(),
            secondary_page_size: default_secondary_page_size(),
            supplemental_page_floor: default_supplemental_page_floor(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[loader]
order_page_size = 20
order_page_floor = 1
supplemental_page_size = 400
secondary_page_size = 200
supplemental_page_floor = 25
"#;

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Load configuration from a config.toml file.
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to the embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Global config accessor. Loads lazily on first use; a broken config file
/// falls back to the embedded defaults with a warning.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    })
}
