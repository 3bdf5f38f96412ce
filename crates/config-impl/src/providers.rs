//! 配置提供者实现

use autowire_common::{ConfigError, ConfigResult};
use config_abstractions::{ConfigFormat, ConfigProvider, ConfigSource};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 文件配置提供者
///
/// 文件不存在时视为空配置，除非标记为必需。
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
    format: ConfigFormat,
    required: bool,
}

impl FileConfigProvider {
    /// 创建新的文件配置提供者，格式由扩展名推断（默认 YAML）
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = ConfigFormat::from_path(&path).unwrap_or(ConfigFormat::Yaml);
        Self {
            path,
            format,
            required: false,
        }
    }

    /// 指定格式
    pub fn with_format(mut self, format: ConfigFormat) -> Self {
        self.format = format;
        self
    }

    /// 文件缺失时报错
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// 获取文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for FileConfigProvider {
    fn load(&self) -> ConfigResult<Option<ConfigSource>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                debug!("读取配置文件: {} ({} 字节)", self.path.display(), bytes.len());
                Ok(Some(ConfigSource::new(
                    self.path.display().to_string(),
                    self.format,
                    bytes,
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.required => {
                info!("配置文件不存在, 跳过: {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(ConfigError::FileReadError {
                path: self.path.display().to_string(),
                source: e,
            }),
        }
    }

    fn name(&self) -> &str {
        "FileConfigProvider"
    }
}

/// 内存配置提供者
#[derive(Debug, Clone)]
pub struct MemoryConfigProvider {
    source: ConfigSource,
}

impl MemoryConfigProvider {
    /// 创建新的内存配置提供者
    pub fn new(source: ConfigSource) -> Self {
        Self { source }
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn load(&self) -> ConfigResult<Option<ConfigSource>> {
        Ok(Some(self.source.clone()))
    }

    fn name(&self) -> &str {
        "MemoryConfigProvider"
    }
}

/// 将配置源解析为通用的标量/映射/序列树
///
/// 顶层必须是映射；空文档视为空映射。
pub fn parse_source(source: &ConfigSource) -> ConfigResult<Value> {
    debug!("解析配置源: {} ({:?})", source.origin(), source.format());

    if source.bytes().iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    let value = match source.format() {
        ConfigFormat::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_slice(source.bytes())
                .map_err(|e| parse_error(source, e))?;
            yaml_to_json(source.origin(), yaml)?
        }
        ConfigFormat::Json => {
            serde_json::from_slice(source.bytes()).map_err(|e| parse_error(source, e))?
        }
        ConfigFormat::Toml => {
            let text = std::str::from_utf8(source.bytes()).map_err(|e| parse_error(source, e))?;
            let table: toml::Table = toml::from_str(text).map_err(|e| parse_error(source, e))?;
            toml_to_json(&toml::Value::Table(table))
        }
    };

    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(value),
        other => Err(ConfigError::InvalidDocument {
            origin: source.origin().to_string(),
            message: format!("顶层必须是映射, 实际为 {}", kind_name(&other)),
        }),
    }
}

/// 值的形状名称，用于错误信息
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

fn parse_error<E>(source: &ConfigSource, error: E) -> ConfigError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ConfigError::ParseError {
        origin: source.origin().to_string(),
        source: Box::new(error),
    }
}

/// 将 YAML 值转换为 JSON 值
fn yaml_to_json(origin: &str, value: serde_yaml::Value) -> ConfigResult<Value> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(|item| yaml_to_json(origin, item))
                .collect::<ConfigResult<Vec<_>>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(origin, key)?, yaml_to_json(origin, value)?);
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => {
            let serde_yaml::value::TaggedValue { value, .. } = *tagged;
            yaml_to_json(origin, value)?
        }
    })
}

fn yaml_key(origin: &str, key: serde_yaml::Value) -> ConfigResult<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ConfigError::InvalidDocument {
            origin: origin.to_string(),
            message: "映射键必须是标量".to_string(),
        }),
    }
}

/// 将 TOML 值转换为 JSON 值
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number(serde_json::Number::from(*i)),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Array(arr) => Value::Array(arr.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}
