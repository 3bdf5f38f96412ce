//! 组件解析器抽象接口
//!
//! 提供依赖解析和组件实例化的能力

use autowire_common::{ResolveError, ResolveResult};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 已装配的组件实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 工厂或构造函数产出、尚未装配的实例
pub type RawInstance = Box<dyn Any + Send + Sync>;

/// 参数工厂产出的参数值
pub type RawParam = Box<dyn Any + Send + Sync>;

/// 组件解析器 trait
///
/// 负责解析组件依赖并创建组件实例
pub trait ComponentResolver: Send + Sync {
    /// 在已有解析链中解析组件
    ///
    /// `id` 可以是 SDID 或别名；`instance` 为具名实例名。
    fn resolve_in(
        &self,
        strategy: &str,
        id: &str,
        instance: Option<&str>,
        ctx: &mut ResolveContext,
    ) -> ResolveResult<Instance>;

    /// 解析组件（新的解析链）
    fn resolve(&self, strategy: &str, id: &str) -> ResolveResult<Instance> {
        self.resolve_in(strategy, id, None, &mut ResolveContext::new())
    }

    /// 解析具名实例（新的解析链）
    fn resolve_named(&self, strategy: &str, id: &str, instance: &str) -> ResolveResult<Instance> {
        self.resolve_in(strategy, id, Some(instance), &mut ResolveContext::new())
    }
}

/// 实例标识：策略 + SDID + 可选的实例名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub strategy: String,
    pub sdid: String,
    pub instance: Option<String>,
}

impl InstanceKey {
    pub fn new(strategy: impl Into<String>, sdid: impl Into<String>, instance: Option<&str>) -> Self {
        Self {
            strategy: strategy.into(),
            sdid: sdid.into(),
            instance: instance.map(str::to_string),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy, self.sdid)?;
        if let Some(instance) = &self.instance {
            write!(f, "#{}", instance)?;
        }
        Ok(())
    }
}

/// 解析上下文
///
/// 记录当前调用栈上正在解析的实例，用于检测循环依赖和限制深度。
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// 当前解析链
    pub resolution_chain: Vec<InstanceKey>,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 将实例加入解析链
    pub fn push(
        &mut self,
        key: InstanceKey,
        detect_cycle: bool,
        max_depth: usize,
    ) -> ResolveResult<()> {
        if detect_cycle && self.resolution_chain.contains(&key) {
            return Err(ResolveError::Cycle {
                chain: self.describe_with(&key),
            });
        }
        if self.resolution_chain.len() >= max_depth {
            return Err(ResolveError::DepthExceeded {
                max_depth,
                chain: self.describe_with(&key),
            });
        }
        self.resolution_chain.push(key);
        Ok(())
    }

    /// 从解析链中移除最后一个实例
    pub fn pop(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    fn describe_with(&self, next: &InstanceKey) -> String {
        self.resolution_chain
            .iter()
            .chain(std::iter::once(next))
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
