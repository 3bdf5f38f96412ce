//! 启动器
//!
//! 负责协调启动顺序：日志、配置加载、注册表冻结、容器创建。

use crate::logging::{init_tracing, LoggingConfig};
use autowire_common::BootstrapResult;
use config_impl::{ConfigLoader, LoadOptions};
use di_abstractions::ContainerConfig;
use di_impl::{global_registry, Container, RegistryBuilder};
use std::sync::Arc;
use tracing::info;

/// 启动器
#[derive(Debug, Clone, Default)]
pub struct Bootstrapper {
    /// 配置加载选项
    load_options: LoadOptions,
    /// 显式注册表；未设置时冻结进程级注册表
    registry: Option<RegistryBuilder>,
    /// 容器配置
    container_config: ContainerConfig,
    /// 日志配置；未设置时不初始化日志
    logging: Option<LoggingConfig>,
}

impl Bootstrapper {
    /// 创建新的启动器
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    /// 使用显式注册表代替进程级注册表
    pub fn with_registry(mut self, registry: RegistryBuilder) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_container_config(mut self, config: ContainerConfig) -> Self {
        self.container_config = config;
        self
    }

    /// 启动时初始化日志
    pub fn with_tracing(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// 执行启动
    pub fn bootstrap(self) -> BootstrapResult<Container> {
        if let Some(logging) = &self.logging {
            init_tracing(logging);
        }
        info!("开始启动依赖注入容器");

        // 第一步：加载配置
        let document = ConfigLoader::new(self.load_options).load()?;

        // 第二步：冻结注册表
        let registry = match self.registry {
            Some(builder) => Arc::new(builder.freeze()),
            None => global_registry(),
        };

        // 第三步：创建容器
        let container = Container::with_config(registry, Arc::new(document), self.container_config);
        info!("依赖注入容器启动完成");
        Ok(container)
    }
}
