//! 元数据定义
//!
//! 提供组件标识 (SDID) 和类型信息

use std::any::TypeId;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// 组件描述符标识 (Struct Descriptor ID)
///
/// 由定义组件的模块路径和类型名确定性地推导，形如 `module/path.TypeName`，
/// 也可以由使用者显式指定。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sdid(Arc<str>);

impl Sdid {
    /// 使用显式字符串创建标识
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// 由类型推导标识
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::from_type_name(std::any::type_name::<T>())
    }

    /// 由 Rust 类型路径推导标识
    ///
    /// `a::b::Foo` 变为 `a/b.Foo`，泛型参数原样保留在类型名上。
    pub fn from_type_name(type_name: &str) -> Self {
        let (base, generics) = match type_name.find('<') {
            Some(index) => type_name.split_at(index),
            None => (type_name, ""),
        };

        let id = match base.rfind("::") {
            Some(index) => format!(
                "{}.{}{}",
                base[..index].replace("::", "/"),
                &base[index + 2..],
                generics
            ),
            None => format!("{base}{generics}"),
        };
        Self::new(id)
    }

    /// 获取字符串形式
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 是否为空标识
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Sdid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Sdid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Sdid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Sdid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Sdid {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型名称（不含模块路径）
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 完整类型路径
    pub full_name: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full_name = std::any::type_name::<T>();
        Self {
            name: short_name(full_name).to_string(),
            id: TypeId::of::<T>(),
            full_name,
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        &self.name
    }

    /// 推导该类型的默认标识
    pub fn sdid(&self) -> Sdid {
        Sdid::from_type_name(self.full_name)
    }
}

fn short_name(full_name: &str) -> &str {
    let base = full_name.split('<').next().unwrap_or(full_name);
    base.rsplit("::").next().unwrap_or(base)
}
