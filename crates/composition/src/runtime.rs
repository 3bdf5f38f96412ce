//! 进程级容器
//!
//! 启动阶段调用一次 [`load`]，之后任意线程通过 [`resolve`] 等函数获取组件。

use crate::bootstrapper::Bootstrapper;
use autowire_common::{BootstrapError, BootstrapResult, ResolveError, ResolveResult};
use config_impl::LoadOptions;
use di_abstractions::{ComponentResolver, Instance};
use di_impl::Container;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::sync::Arc;

static CONTAINER: OnceCell<Container> = OnceCell::new();

/// 使用进程级注册表和指定的加载选项启动
pub fn load(options: LoadOptions) -> BootstrapResult<&'static Container> {
    load_with(Bootstrapper::new().with_load_options(options))
}

/// 使用自定义启动器启动；重复调用返回 [`BootstrapError::AlreadyInitialized`]
pub fn load_with(bootstrapper: Bootstrapper) -> BootstrapResult<&'static Container> {
    let mut initialized = false;
    let container = CONTAINER.get_or_try_init(|| {
        initialized = true;
        bootstrapper.bootstrap()
    })?;
    if initialized {
        Ok(container)
    } else {
        Err(BootstrapError::AlreadyInitialized)
    }
}

/// 进程级容器
pub fn container() -> ResolveResult<&'static Container> {
    CONTAINER.get().ok_or(ResolveError::NotInitialized)
}

/// 解析组件
pub fn resolve(strategy: &str, id: &str) -> ResolveResult<Instance> {
    container()?.resolve(strategy, id)
}

/// 解析具名实例
pub fn resolve_named(strategy: &str, id: &str, instance: &str) -> ResolveResult<Instance> {
    container()?.resolve_named(strategy, id, instance)
}

/// 解析并转换为具体类型
pub fn get<T>(strategy: &str, id: &str) -> ResolveResult<Arc<T>>
where
    T: Any + Send + Sync,
{
    container()?.get(strategy, id)
}

/// 解析具名实例并转换为具体类型
pub fn get_named<T>(strategy: &str, id: &str, instance: &str) -> ResolveResult<Arc<T>>
where
    T: Any + Send + Sync,
{
    container()?.get_named(strategy, id, instance)
}
