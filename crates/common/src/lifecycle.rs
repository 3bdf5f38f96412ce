//! 组件生命周期与自动装配策略

use std::borrow::Cow;
use std::fmt;

/// 组件生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// 单例模式 - 首次解析时创建，之后在整个进程生命周期内共享
    Singleton,
    /// 瞬时模式 - 每次解析都创建新实例
    #[default]
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => f.write_str("singleton"),
            Self::Transient => f.write_str("transient"),
        }
    }
}

/// 自动装配策略
///
/// 每个策略拥有独立的描述符命名空间，并决定实例的缓存方式。
/// 内置 `normal` 与 `singleton` 两种，扩展策略通过 [`AutowireStrategy::extension`] 声明。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AutowireStrategy {
    name: Cow<'static, str>,
    lifetime: Lifetime,
}

impl AutowireStrategy {
    /// 内置普通策略名
    pub const NORMAL: &'static str = "normal";
    /// 内置单例策略名
    pub const SINGLETON: &'static str = "singleton";

    /// 每次解析创建新实例
    pub const fn normal() -> Self {
        Self {
            name: Cow::Borrowed(Self::NORMAL),
            lifetime: Lifetime::Transient,
        }
    }

    /// 创建一次并缓存
    pub const fn singleton() -> Self {
        Self {
            name: Cow::Borrowed(Self::SINGLETON),
            lifetime: Lifetime::Singleton,
        }
    }

    /// 扩展策略
    pub fn extension(name: impl Into<Cow<'static, str>>, lifetime: Lifetime) -> Self {
        Self {
            name: name.into(),
            lifetime,
        }
    }

    /// 策略名称，同时也是配置键中的策略段
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 实例生命周期
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// 是否缓存实例
    pub fn is_singleton(&self) -> bool {
        self.lifetime == Lifetime::Singleton
    }
}

impl fmt::Display for AutowireStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
