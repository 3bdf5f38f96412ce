//! # Autowire Common
//!
//! 这个 crate 提供了 Autowire 各层共用的基础类型。
//!
//! ## 核心类型
//!
//! - [`Sdid`] - 组件描述符标识
//! - [`AutowireStrategy`] - 自动装配策略
//! - [`ConfigError`] / [`RegistryError`] / [`ResolveError`] - 错误分类
//!
//! ## 设计原则
//!
//! - 注册阶段一次性完成，之后只读
//! - 错误携带完整的组件与配置键上下文

pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
