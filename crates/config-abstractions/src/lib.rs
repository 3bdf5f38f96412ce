//! # Configuration Abstractions
//!
//! 配置抽象层，定义配置键寻址、配置文档模型和配置源的核心接口。
//!
//! ## 核心接口
//!
//! - [`ConfigKey`] - 支持转义段的配置键
//! - [`Document`] - 合并后的只读配置树，按键查找与类型化绑定
//! - [`ConfigProvider`] - 配置提供者接口
//! - [`ConfigSource`] - 尚未解析的配置源
//! - [`Binding`] - 配置绑定结果

pub mod binder;
pub mod binding;
pub mod document;
pub mod key;
pub mod provider;

pub use binder::{bind_value, to_config_value};
pub use binding::*;
pub use document::Document;
pub use key::*;
pub use provider::*;
