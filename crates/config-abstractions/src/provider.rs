//! 配置提供者抽象接口

use autowire_common::ConfigResult;
use std::path::Path;

/// 配置源格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// 根据文件扩展名推断格式
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// 尚未解析的配置源
///
/// 多个配置源按顺序合并，后加载的在叶子级别覆盖先加载的。
#[derive(Debug, Clone)]
pub struct ConfigSource {
    origin: String,
    format: ConfigFormat,
    bytes: Vec<u8>,
}

impl ConfigSource {
    /// 创建新的配置源
    pub fn new(origin: impl Into<String>, format: ConfigFormat, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            origin: origin.into(),
            format,
            bytes: bytes.into(),
        }
    }

    /// 内存中的 YAML 配置
    pub fn yaml(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new("<memory:yaml>", ConfigFormat::Yaml, bytes)
    }

    /// 内存中的 JSON 配置
    pub fn json(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new("<memory:json>", ConfigFormat::Json, bytes)
    }

    /// 内存中的 TOML 配置
    pub fn toml(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new("<memory:toml>", ConfigFormat::Toml, bytes)
    }

    /// 来源描述（文件路径或内存标记）
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// 格式
    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    /// 原始字节
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// 配置提供者 trait
///
/// 定义从不同数据源读取配置的统一接口
pub trait ConfigProvider: Send + Sync {
    /// 读取配置源；数据源不存在时返回 `Ok(None)`
    fn load(&self) -> ConfigResult<Option<ConfigSource>>;

    /// 获取提供者名称
    fn name(&self) -> &str;
}
