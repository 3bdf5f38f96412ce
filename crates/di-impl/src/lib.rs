//! # 依赖注入具体实现
//!
//! 提供冻结注册表、解析引擎、字段注入绑定器和单例缓存的具体实现。
//!
//! ## 使用示例
//!
//! ```rust
//! use autowire_common::AutowireStrategy;
//! use config_abstractions::Document;
//! use di_abstractions::StructDescriptor;
//! use di_impl::{Container, RegistryBuilder};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let descriptor = StructDescriptor::builder::<Greeter>()
//!     .with_alias("greeter")
//!     .inject_config("greeting", "app.greeting", |g: &mut Greeter, v: String| g.greeting = v)
//!     .build()?;
//! let registry = RegistryBuilder::new()
//!     .with(&AutowireStrategy::singleton(), descriptor)?
//!     .freeze();
//! let document = Document::from_value(serde_json::json!({"app": {"greeting": "hello"}}));
//!
//! let container = Container::new(Arc::new(registry), Arc::new(document));
//! let greeter = container.get::<Greeter>("singleton", "greeter")?;
//! assert_eq!(greeter.greeting, "hello");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod binder;
pub mod container;
pub mod registry;
pub mod singleton;

pub use container::Container;
pub use registry::{
    global_registry, is_global_registry_frozen, register_descriptor, Registry, RegistryBuilder,
};
pub use singleton::SingletonCache;
