//! # 启动组合层
//!
//! 将配置加载、组件注册表和解析引擎组合为可运行的容器，
//! 并提供进程级的解析入口。
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use autowire_composition::{register_descriptor, runtime, AutowireStrategy, LoadOptions, StructDescriptor};
//!
//! #[derive(Default)]
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     register_descriptor(
//!         &AutowireStrategy::singleton(),
//!         StructDescriptor::builder::<Greeter>()
//!             .with_alias("greeter")
//!             .inject_config("greeting", "app.greeting", |g: &mut Greeter, v: String| g.greeting = v)
//!             .build()?,
//!     )?;
//!
//!     // 读取 AUTOWIRE_CONFIG_PATH 或 config/autowire.yaml
//!     runtime::load(LoadOptions::new())?;
//!
//!     let greeter = runtime::get::<Greeter>("singleton", "greeter")?;
//!     println!("{}", greeter.greeting);
//!     Ok(())
//! }
//! ```

pub mod bootstrapper;
pub mod logging;
pub mod runtime;


pub use bootstrapper::Bootstrapper;
pub use logging::{init_tracing, LoggingConfig};

// 重新导出主要类型
pub use autowire_common::{AutowireStrategy, BootstrapError, Lifetime, ResolveError, Sdid};
pub use config_abstractions::{ConfigKey, ConfigSource, Document};
pub use config_impl::LoadOptions;
pub use di_abstractions::{ComponentResolver, ContainerConfig, StructDescriptor};
pub use di_impl::{register_descriptor, Container, RegistryBuilder};
