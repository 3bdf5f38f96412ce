//! 合并后的配置文档

use crate::binder::bind_value;
use crate::binding::Binding;
use crate::key::ConfigKey;
use autowire_common::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// 配置文档
///
/// 由一个或多个已解析的配置源按顺序合并而成的只读树。映射在叶子级别深度合并，
/// 后加载的配置源覆盖先加载的；序列和标量整体替换。
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl Document {
    /// 空文档
    pub fn empty() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// 以任意值作为根创建文档
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// 按顺序合并已解析的配置树
    pub fn from_layers(layers: impl IntoIterator<Item = Value>) -> Self {
        let mut document = Self::empty();
        for layer in layers {
            document.merge(layer);
        }
        document
    }

    /// 将 `overlay` 合并到当前文档，`overlay` 优先
    pub fn merge(&mut self, overlay: Value) {
        merge_value(&mut self.root, overlay);
    }

    /// 根节点
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// 是否为空映射
    pub fn is_empty(&self) -> bool {
        match &self.root {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    /// 获取键对应的值
    ///
    /// 每一层映射中，若逐段查找失败，也会尝试由点号连接的相邻段组成的扁平键
    /// （例如 `a.b: 1` 可通过键 `a.b` 访问）。
    pub fn get(&self, key: &ConfigKey) -> ConfigResult<&Value> {
        let names: Vec<&str> = key.names().collect();
        find(&self.root, &names).ok_or_else(|| ConfigError::key_not_found(key))
    }

    /// 键是否存在
    pub fn contains(&self, key: &ConfigKey) -> bool {
        self.get(key).is_ok()
    }

    /// 取出子树作为独立文档
    pub fn lookup(&self, key: &ConfigKey) -> ConfigResult<Document> {
        self.get(key).map(|value| Document::from_value(value.clone()))
    }

    /// 将键下的子树绑定为类型 `T`，键不存在时返回 [`ConfigError::KeyNotFound`]
    pub fn bind<T: DeserializeOwned>(&self, key: &ConfigKey) -> ConfigResult<T> {
        let value = self.get(key)?;
        bind_value(key, value)
    }

    /// 按字符串路径绑定，路径支持 `<...>` 转义段
    pub fn bind_path<T: DeserializeOwned>(&self, path: &str) -> ConfigResult<T> {
        let key = ConfigKey::parse(path)?;
        self.bind(&key)
    }

    /// 将键下的子树绑定为类型 `T`，键不存在时返回 `None`
    pub fn bind_optional<T: DeserializeOwned>(&self, key: &ConfigKey) -> ConfigResult<Option<T>> {
        match self.get(key) {
            Ok(value) => bind_value(key, value).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 绑定到已有目标
    ///
    /// 子树叠加在目标的当前值之上：配置中出现的字段被覆盖，其余字段保留
    /// 目标原有的值。键不存在时目标保持不变并返回 [`Binding::Absent`]；
    /// 绑定失败时目标同样保持不变。
    pub fn bind_into<T>(&self, key: &ConfigKey, target: &mut T) -> ConfigResult<Binding>
    where
        T: Serialize + DeserializeOwned,
    {
        let overlay = match self.get(key) {
            Ok(value) => value,
            Err(e) if e.is_not_found() => return Ok(Binding::Absent),
            Err(e) => return Err(e),
        };

        let mut base = serde_json::to_value(&*target)
            .map_err(|e| ConfigError::type_mismatch(key, e.to_string()))?;
        merge_value(&mut base, overlay.clone());
        *target = bind_value(key, &base)?;
        debug!("配置已叠加到目标: {}", key);
        Ok(Binding::Bound)
    }
}

fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// 逐层查找，较短的段组合优先
fn find<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    if names.is_empty() {
        return Some(value);
    }
    let Value::Object(map) = value else {
        return None;
    };

    let mut joined = String::new();
    for (index, name) in names.iter().enumerate() {
        if index > 0 {
            joined.push('.');
        }
        joined.push_str(name);
        if let Some(child) = map.get(joined.as_str()) {
            if let Some(found) = find(child, &names[index + 1..]) {
                return Some(found);
            }
        }
    }
    None
}
