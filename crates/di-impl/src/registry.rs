//! 组件注册表实现
//!
//! 注册分为两个阶段：启动时在 [`RegistryBuilder`] 中单线程注册，
//! 随后冻结为不可变的 [`Registry`]，之后的并发查找不需要任何锁。

use autowire_common::{
    AutowireStrategy, IdentityKind, RegistryError, RegistryResult,
};
use di_abstractions::{DescriptorRegistry, RegisteredDescriptor, StructDescriptor};
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 单个策略的描述符命名空间
#[derive(Debug, Clone)]
struct Namespace {
    strategy: AutowireStrategy,
    descriptors: Vec<StructDescriptor>,
    by_sdid: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
}

impl Namespace {
    fn new(strategy: AutowireStrategy) -> Self {
        Self {
            strategy,
            descriptors: Vec::new(),
            by_sdid: HashMap::new(),
            by_alias: HashMap::new(),
        }
    }

    fn is_taken(&self, id: &str) -> bool {
        self.by_sdid.contains_key(id) || self.by_alias.contains_key(id)
    }

    fn insert(&mut self, descriptor: StructDescriptor) -> RegistryResult<()> {
        let sdid = descriptor.sdid().to_string();
        if self.is_taken(&sdid) {
            return Err(self.duplicate(IdentityKind::Sdid, sdid));
        }
        if let Some(alias) = descriptor.alias() {
            if alias != sdid && self.is_taken(alias) {
                return Err(self.duplicate(IdentityKind::Alias, alias.to_string()));
            }
        }

        let index = self.descriptors.len();
        if let Some(alias) = descriptor.alias() {
            self.by_alias.insert(alias.to_string(), index);
        }
        self.by_sdid.insert(sdid, index);
        self.descriptors.push(descriptor);
        Ok(())
    }

    fn duplicate(&self, kind: IdentityKind, id: String) -> RegistryError {
        RegistryError::DuplicateIdentity {
            strategy: self.strategy.name().to_string(),
            kind,
            id,
        }
    }

    fn find(&self, id: &str) -> Option<&StructDescriptor> {
        self.by_sdid
            .get(id)
            .or_else(|| self.by_alias.get(id))
            .and_then(|index| self.descriptors.get(*index))
    }
}

/// 注册阶段使用的可变注册表
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    namespaces: HashMap<String, Namespace>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册描述符
    ///
    /// 同一策略命名空间内 SDID 与别名都不得重复。
    pub fn register(
        &mut self,
        strategy: &AutowireStrategy,
        descriptor: StructDescriptor,
    ) -> RegistryResult<()> {
        let namespace = self
            .namespaces
            .entry(strategy.name().to_string())
            .or_insert_with(|| Namespace::new(strategy.clone()));

        if namespace.strategy.lifetime() != strategy.lifetime() {
            return Err(RegistryError::ConflictingStrategy {
                strategy: strategy.name().to_string(),
                existing: namespace.strategy.lifetime().to_string(),
                requested: strategy.lifetime().to_string(),
            });
        }

        let sdid = descriptor.sdid().clone();
        namespace.insert(descriptor)?;
        info!("注册组件: {} ({})", sdid, strategy);
        Ok(())
    }

    /// 链式注册
    pub fn with(mut self, strategy: &AutowireStrategy, descriptor: StructDescriptor) -> RegistryResult<Self> {
        self.register(strategy, descriptor)?;
        Ok(self)
    }

    /// 已注册的描述符数量
    pub fn len(&self) -> usize {
        self.namespaces.values().map(|ns| ns.descriptors.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 冻结为只读注册表
    pub fn freeze(self) -> Registry {
        let registry = Registry {
            namespaces: self.namespaces,
        };
        info!(
            "组件注册表已冻结: {} 个策略, {} 个组件",
            registry.namespaces.len(),
            registry.len()
        );
        registry
    }
}

/// 冻结后的只读注册表
#[derive(Debug, Clone, Default)]
pub struct Registry {
    namespaces: HashMap<String, Namespace>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// 已注册的策略，按名称排序
    pub fn strategies(&self) -> Vec<&AutowireStrategy> {
        let mut strategies: Vec<_> = self.namespaces.values().map(|ns| &ns.strategy).collect();
        strategies.sort_by(|a, b| a.name().cmp(b.name()));
        strategies
    }

    /// 某策略下的描述符，按注册顺序
    pub fn descriptors(&self, strategy: &str) -> &[StructDescriptor] {
        self.namespaces
            .get(strategy)
            .map(|ns| ns.descriptors.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.namespaces.values().map(|ns| ns.descriptors.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DescriptorRegistry for Registry {
    fn find(&self, strategy: &str, id: &str) -> Option<RegisteredDescriptor<'_>> {
        let namespace = self.namespaces.get(strategy)?;
        namespace.find(id).map(|descriptor| RegisteredDescriptor {
            strategy: &namespace.strategy,
            descriptor,
        })
    }
}

static GLOBAL_BUILDER: Lazy<Mutex<Option<RegistryBuilder>>> =
    Lazy::new(|| Mutex::new(Some(RegistryBuilder::new())));

static GLOBAL_REGISTRY: OnceCell<Arc<Registry>> = OnceCell::new();

/// 向进程级注册表注册描述符
///
/// 只应在启动阶段调用；注册表冻结后返回 [`RegistryError::RegistryFrozen`]。
pub fn register_descriptor(
    strategy: &AutowireStrategy,
    descriptor: StructDescriptor,
) -> RegistryResult<()> {
    let mut guard = GLOBAL_BUILDER.lock();
    match guard.as_mut() {
        Some(builder) => builder.register(strategy, descriptor),
        None => Err(RegistryError::RegistryFrozen {
            sdid: descriptor.sdid().to_string(),
        }),
    }
}

/// 冻结并获取进程级注册表
///
/// 首次调用时冻结，之后返回同一份注册表。
pub fn global_registry() -> Arc<Registry> {
    GLOBAL_REGISTRY
        .get_or_init(|| {
            let builder = GLOBAL_BUILDER.lock().take().unwrap_or_default();
            debug!("冻结进程级组件注册表");
            Arc::new(builder.freeze())
        })
        .clone()
}

/// 进程级注册表是否已冻结
pub fn is_global_registry_frozen() -> bool {
    GLOBAL_REGISTRY.get().is_some()
}
