//! 配置键寻址
//!
//! 配置键由 `.` 分隔的段组成。单个段可以用 `<...>` 包裹以嵌入字面量 `.`，
//! 例如完整的类型路径：`autowire.normal.<app/redis.Impl>.db1-redis.param`。

use autowire_common::{ConfigError, ConfigResult};
use std::fmt;
use std::str::FromStr;

/// 段分隔符
pub const SEPARATOR: char = '.';
/// 转义段起始符
pub const ESCAPE_OPEN: char = '<';
/// 转义段结束符
pub const ESCAPE_CLOSE: char = '>';

/// 根段，所有自动装配配置都位于该段之下
pub const AUTOWIRE_ROOT: &str = "autowire";
/// 组件参数段
pub const PARAM_SEGMENT: &str = "param";
/// 配置字段回退时使用的策略段
pub const CONFIG_SEGMENT: &str = "config";

/// 配置键中的单个段
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySegment {
    name: String,
    escaped: bool,
}

impl KeySegment {
    /// 创建段，名称中含有 `.` 时自动转义
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let escaped = name.contains(SEPARATOR);
        Self { name, escaped }
    }

    /// 创建强制转义的段
    pub fn escaped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            escaped: true,
        }
    }

    /// 段名称（不含转义符）
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 是否以 `<...>` 形式书写
    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    /// 编码后能否被 [`ConfigKey::parse`] 还原；名称含 `<` 或 `>` 时不能
    pub fn is_encodable(&self) -> bool {
        !self.name.contains([ESCAPE_OPEN, ESCAPE_CLOSE])
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.escaped {
            write!(f, "{ESCAPE_OPEN}{}{ESCAPE_CLOSE}", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// 已解析的配置键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConfigKey {
    segments: Vec<KeySegment>,
}

impl ConfigKey {
    /// 空键，指向文档根
    pub fn root() -> Self {
        Self::default()
    }

    /// 解析配置键
    ///
    /// 从左到右扫描，遇到 `<` 进入转义模式、遇到 `>` 退出；仅在转义模式之外按 `.` 切分。
    /// `<` 只能出现在段首，`>` 之后只能是 `.` 或键的结尾。
    pub fn parse(key: &str) -> ConfigResult<Self> {
        if key.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut escaped = false;
        let mut inside = false;

        for (offset, ch) in key.char_indices() {
            match ch {
                ESCAPE_OPEN if inside => {
                    return Err(malformed(key, format!("位置 {offset} 出现嵌套的 '<'")));
                }
                ESCAPE_OPEN => {
                    if escaped || !current.is_empty() {
                        return Err(malformed(key, format!("位置 {offset} 的 '<' 不在段首")));
                    }
                    inside = true;
                    escaped = true;
                }
                ESCAPE_CLOSE if !inside => {
                    return Err(malformed(key, format!("位置 {offset} 的 '>' 没有匹配的 '<'")));
                }
                ESCAPE_CLOSE => inside = false,
                SEPARATOR if !inside => {
                    segments.push(finish_segment(key, &mut current, &mut escaped)?);
                }
                _ if escaped && !inside => {
                    return Err(malformed(key, format!("位置 {offset} 的 '>' 之后必须是 '.'")));
                }
                _ => current.push(ch),
            }
        }

        if inside {
            return Err(malformed(key, "'<' 没有匹配的 '>'".to_string()));
        }
        segments.push(finish_segment(key, &mut current, &mut escaped)?);

        Ok(Self { segments })
    }

    /// 追加一个段，名称中含有 `.` 时自动转义
    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(KeySegment::new(segment));
        self
    }

    /// 追加一个已构造的段
    pub fn push(&mut self, segment: KeySegment) {
        self.segments.push(segment);
    }

    /// 连接另一个键
    pub fn join(&self, other: &ConfigKey) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// 组件参数的配置键
    ///
    /// `autowire.<strategy>.<component>[.<instance>].param`
    ///
    /// 组件标识含有 `<` 或 `>`（例如泛型类型）时生成的键仍可用于查找，
    /// 但其文本形式无法再次解析，见 [`ConfigKey::is_encodable`]。
    pub fn autowire_param(strategy: &str, component: &str, instance: Option<&str>) -> Self {
        let mut key = Self::root().child(AUTOWIRE_ROOT).child(strategy).child(component);
        if let Some(instance) = instance {
            key = key.child(instance);
        }
        key.child(PARAM_SEGMENT)
    }

    /// 配置字段未声明路径时的回退键
    ///
    /// `autowire.config.<type-sdid>`
    pub fn autowire_config(type_id: &str) -> Self {
        Self::root()
            .child(AUTOWIRE_ROOT)
            .child(CONFIG_SEGMENT)
            .child(type_id)
    }

    /// 所有段
    pub fn segments(&self) -> &[KeySegment] {
        &self.segments
    }

    /// 段名称迭代器
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(KeySegment::name)
    }

    /// 段数量
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// 是否为根键
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// [`ConfigKey::encode`] 的结果能否被 [`ConfigKey::parse`] 还原
    pub fn is_encodable(&self) -> bool {
        self.segments.iter().all(KeySegment::is_encodable)
    }

    /// 编码为字符串形式
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn finish_segment(key: &str, current: &mut String, escaped: &mut bool) -> ConfigResult<KeySegment> {
    if current.is_empty() {
        return Err(malformed(key, "存在空段".to_string()));
    }
    let segment = KeySegment {
        name: std::mem::take(current),
        escaped: *escaped,
    };
    *escaped = false;
    Ok(segment)
}

fn malformed(key: &str, reason: String) -> ConfigError {
    ConfigError::MalformedKey {
        key: key.to_string(),
        reason,
    }
}
