//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件描述符和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`StructDescriptor`] / [`DescriptorBuilder`] - 组件描述符
//! - [`FieldInjection`] - 字段注入描述
//! - [`ParamLoader`] - 组件参数加载器接口
//! - [`DescriptorRegistry`] - 组件注册表接口
//! - [`ComponentResolver`] - 组件解析器接口

pub mod container;
pub mod descriptor;
pub mod field;
pub mod param;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use descriptor::*;
pub use field::*;
pub use param::*;
pub use registry::*;
pub use resolver::*;
