//! 依赖注入容器实现
//!
//! [`Container`] 持有冻结的注册表、配置文档和单例缓存，是解析引擎的入口。

use crate::binder::bind_fields;
use crate::registry::Registry;
use crate::singleton::SingletonCache;
use autowire_common::{AutowireStrategy, ResolveError, ResolveResult, Sdid};
use config_abstractions::Document;
use di_abstractions::{
    ComponentResolver, ContainerConfig, DescriptorRegistry, Instance, InstanceKey, ParamContext,
    RegisteredDescriptor, ResolveContext, StructDescriptor,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 依赖注入容器
pub struct Container {
    registry: Arc<Registry>,
    document: Arc<Document>,
    config: ContainerConfig,
    singletons: SingletonCache,
}

impl Container {
    /// 使用默认配置创建容器
    pub fn new(registry: Arc<Registry>, document: Arc<Document>) -> Self {
        Self::with_config(registry, document, ContainerConfig::default())
    }

    /// 使用指定配置创建容器
    pub fn with_config(
        registry: Arc<Registry>,
        document: Arc<Document>,
        config: ContainerConfig,
    ) -> Self {
        info!(
            "创建依赖注入容器: {} 个组件, 最大解析深度 {}",
            registry.len(),
            config.max_resolution_depth
        );
        Self {
            registry,
            document,
            config,
            singletons: SingletonCache::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 已构造的单例数量
    pub fn cached_singletons(&self) -> usize {
        self.singletons.len()
    }

    /// 解析并转换为具体类型
    pub fn get<T>(&self, strategy: &str, id: &str) -> ResolveResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        downcast_instance(id, self.resolve(strategy, id)?)
    }

    /// 解析具名实例并转换为具体类型
    pub fn get_named<T>(&self, strategy: &str, id: &str, instance: &str) -> ResolveResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        downcast_instance(id, self.resolve_named(strategy, id, instance)?)
    }

    /// 以类型推导的 SDID 解析
    pub fn get_by_type<T>(&self, strategy: &str) -> ResolveResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let sdid = Sdid::of::<T>();
        self.get(strategy, sdid.as_str())
    }

    fn build(
        &self,
        strategy: &AutowireStrategy,
        descriptor: &StructDescriptor,
        instance: Option<&str>,
        ctx: &mut ResolveContext,
    ) -> ResolveResult<Instance> {
        debug!("构造组件: {} ({})", descriptor.sdid(), strategy);
        let raw = descriptor.create_instance()?;

        let mut param = descriptor.create_param();
        if let Some(param) = param.as_mut() {
            let param_ctx = ParamContext {
                document: &self.document,
                strategy,
                sdid: descriptor.sdid(),
                alias: descriptor.alias(),
                instance,
            };
            let binding = descriptor.load_param(&param_ctx, param.as_mut())?;
            debug!("组件参数 {}: {:?}", param_ctx.default_key(), binding);
        }

        let mut raw = descriptor.construct(raw, param)?;
        bind_fields(self, &self.document, descriptor, raw.as_mut(), ctx)?;
        Ok(Arc::from(raw))
    }
}

impl ComponentResolver for Container {
    fn resolve_in(
        &self,
        strategy: &str,
        id: &str,
        instance: Option<&str>,
        ctx: &mut ResolveContext,
    ) -> ResolveResult<Instance> {
        let RegisteredDescriptor {
            strategy: registered,
            descriptor,
        } = self.registry.lookup(strategy, id).map_err(|e| {
            debug!("组件未注册: {}:{}", strategy, id);
            e
        })?;
        let key = InstanceKey::new(registered.name(), descriptor.sdid().as_str(), instance);

        if registered.is_singleton() {
            if let Some(cached) = self.singletons.get(&key) {
                debug!("命中单例缓存: {}", key);
                return Ok(cached);
            }
            // 单例始终检测循环，避免在同一线程重入初始化单元
            ctx.push(key.clone(), true, self.config.max_resolution_depth)?;
            let result = self
                .singletons
                .get_or_try_init(key, || self.build(registered, descriptor, instance, ctx));
            ctx.pop();
            result
        } else {
            ctx.push(
                key,
                self.config.enable_circular_dependency_detection,
                self.config.max_resolution_depth,
            )?;
            let result = self.build(registered, descriptor, instance, ctx);
            ctx.pop();
            result
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("components", &self.registry.len())
            .field("config", &self.config)
            .field("cached_singletons", &self.singletons.len())
            .finish()
    }
}

fn downcast_instance<T>(id: &str, instance: Instance) -> ResolveResult<Arc<T>>
where
    T: Any + Send + Sync,
{
    instance
        .downcast::<T>()
        .map_err(|_| ResolveError::UnexpectedType {
            id: id.to_string(),
            expected: std::any::type_name::<T>(),
        })
}
