//! # Configuration Implementation
//!
//! 配置实现层：定位并读取配置文件，解析 YAML/JSON/TOML 配置源，
//! 按顺序合并为 [`Document`]。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use config_impl::{ConfigLoader, LoadOptions};
//!
//! let document = ConfigLoader::new(LoadOptions::new()).load()?;
//! let port: i64 = document.bind_path("app.port")?;
//! # Ok::<(), autowire_common::ConfigError>(())
//! ```

pub mod loader;
pub mod providers;

pub use config_abstractions::Document;
pub use loader::{load_sources, ConfigLoader, LoadOptions, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
pub use providers::{parse_source, FileConfigProvider, MemoryConfigProvider};
