//! 配置加载

use crate::providers::{parse_source, FileConfigProvider, MemoryConfigProvider};
use autowire_common::ConfigResult;
use config_abstractions::{ConfigProvider, ConfigSource, Document};
use std::path::PathBuf;
use tracing::{debug, info};

/// 指定主配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "AUTOWIRE_CONFIG_PATH";

/// 默认主配置文件路径（相对于工作目录）
pub const DEFAULT_CONFIG_PATH: &str = "config/autowire.yaml";

/// 配置加载选项
///
/// 主配置文件路径优先级：显式路径 > 环境变量 > 默认路径。
/// 覆盖文件和内存配置源依次追加在主配置文件之后。
#[derive(Debug, Clone)]
pub struct LoadOptions {
    abs_path: Option<PathBuf>,
    env_var: String,
    default_path: PathBuf,
    load_main_file: bool,
    overrides: Vec<PathBuf>,
    sources: Vec<ConfigSource>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            abs_path: None,
            env_var: CONFIG_PATH_ENV.to_string(),
            default_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            load_main_file: true,
            overrides: Vec::new(),
            sources: Vec::new(),
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 显式指定主配置文件；该文件必须存在
    pub fn with_abs_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.abs_path = Some(path.into());
        self
    }

    /// 更换读取路径的环境变量名
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var = name.into();
        self
    }

    pub fn with_default_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_path = path.into();
        self
    }

    /// 追加覆盖文件（缺失时跳过）
    pub fn with_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.push(path.into());
        self
    }

    /// 追加内存配置源
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// 不读取主配置文件，只使用覆盖文件和内存配置源
    pub fn without_main_file(mut self) -> Self {
        self.load_main_file = false;
        self
    }

    /// 解析主配置文件路径
    pub fn main_path(&self) -> Option<PathBuf> {
        if !self.load_main_file {
            return None;
        }
        if let Some(path) = &self.abs_path {
            return Some(path.clone());
        }
        match std::env::var(&self.env_var) {
            Ok(path) if !path.trim().is_empty() => {
                debug!("从环境变量 {} 读取配置路径: {}", self.env_var, path);
                Some(PathBuf::from(path))
            }
            _ => Some(self.default_path.clone()),
        }
    }
}

/// 配置加载器
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    options: LoadOptions,
}

impl ConfigLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// 按合并顺序构建提供者列表
    pub fn providers(&self) -> Vec<Box<dyn ConfigProvider>> {
        let mut providers: Vec<Box<dyn ConfigProvider>> = Vec::new();

        if let Some(path) = self.options.main_path() {
            let provider = FileConfigProvider::new(path);
            if self.options.abs_path.is_some() {
                providers.push(Box::new(provider.required()));
            } else {
                providers.push(Box::new(provider));
            }
        }
        for path in &self.options.overrides {
            providers.push(Box::new(FileConfigProvider::new(path)));
        }
        for source in &self.options.sources {
            providers.push(Box::new(MemoryConfigProvider::new(source.clone())));
        }
        providers
    }

    /// 读取并合并全部配置源
    pub fn load(&self) -> ConfigResult<Document> {
        let mut sources = Vec::new();
        for provider in self.providers() {
            if let Some(source) = provider.load()? {
                debug!("{} 提供配置源: {}", provider.name(), source.origin());
                sources.push(source);
            }
        }

        let document = load_sources(&sources)?;
        info!("配置加载完成, 共 {} 个配置源", sources.len());
        Ok(document)
    }
}

/// 按顺序解析并合并配置源，后面的配置源优先
pub fn load_sources(sources: &[ConfigSource]) -> ConfigResult<Document> {
    let mut document = Document::empty();
    for source in sources {
        document.merge(parse_source(source)?);
        debug!("已合并配置源: {}", source.origin());
    }
    Ok(document)
}
