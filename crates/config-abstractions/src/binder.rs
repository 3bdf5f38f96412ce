//! 类型化配置绑定器实现
//!
//! 子树先转换为 `config::Value`，再由其反序列化器绑定到目标类型，
//! 从而获得标量之间的宽松转换（数字与字符串互转等）。

use crate::key::ConfigKey;
use autowire_common::{ConfigError, ConfigResult};
use config::{Value as ConfigValue, ValueKind};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// 将子树绑定为类型 `T`
///
/// 形状不兼容（例如映射绑定到标量）时返回 [`ConfigError::TypeMismatch`]。
pub fn bind_value<T>(key: &ConfigKey, value: &Value) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    to_config_value(value)
        .try_deserialize::<T>()
        .map_err(|e| {
            debug!("配置绑定失败: {} -> {}: {}", key, std::any::type_name::<T>(), e);
            ConfigError::type_mismatch(key, e.to_string())
        })
}

/// 将 JSON 值转换为 `config` crate 的值
pub fn to_config_value(value: &Value) -> ConfigValue {
    let kind = match value {
        Value::Null => ValueKind::Nil,
        Value::Bool(b) => ValueKind::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ValueKind::I64(i)
            } else if let Some(u) = n.as_u64() {
                ValueKind::U64(u)
            } else {
                ValueKind::Float(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => ValueKind::String(s.clone()),
        Value::Array(items) => ValueKind::Array(items.iter().map(to_config_value).collect()),
        Value::Object(map) => ValueKind::Table(
            map.iter()
                .map(|(k, v)| (k.clone(), to_config_value(v)))
                .collect(),
        ),
    };
    ConfigValue::new(None, kind)
}
