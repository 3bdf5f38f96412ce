//! 组件注册表抽象接口

use crate::descriptor::StructDescriptor;
use autowire_common::{AutowireStrategy, ResolveError, ResolveResult};

/// 已注册的描述符及其所属策略
#[derive(Debug, Clone, Copy)]
pub struct RegisteredDescriptor<'a> {
    pub strategy: &'a AutowireStrategy,
    pub descriptor: &'a StructDescriptor,
}

/// 组件注册表 trait
///
/// 注册阶段结束后只读，查找无需加锁。
pub trait DescriptorRegistry: Send + Sync {
    /// 按策略名和 SDID 或别名查找描述符
    fn find(&self, strategy: &str, id: &str) -> Option<RegisteredDescriptor<'_>>;

    /// 查找描述符，不存在时返回 [`ResolveError::NotFound`]
    fn lookup(&self, strategy: &str, id: &str) -> ResolveResult<RegisteredDescriptor<'_>> {
        self.find(strategy, id).ok_or_else(|| ResolveError::NotFound {
            strategy: strategy.to_string(),
            id: id.to_string(),
        })
    }

    /// 是否已注册
    fn contains(&self, strategy: &str, id: &str) -> bool {
        self.find(strategy, id).is_some()
    }
}
