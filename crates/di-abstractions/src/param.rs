//! 组件参数加载

use autowire_common::{AutowireStrategy, ConfigResult, Sdid};
use config_abstractions::{Binding, ConfigKey, Document};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// 参数加载上下文
#[derive(Debug, Clone, Copy)]
pub struct ParamContext<'a> {
    /// 合并后的配置文档
    pub document: &'a Document,
    /// 组件所属策略
    pub strategy: &'a AutowireStrategy,
    /// 组件标识
    pub sdid: &'a Sdid,
    /// 组件别名
    pub alias: Option<&'a str>,
    /// 具名实例名
    pub instance: Option<&'a str>,
}

impl<'a> ParamContext<'a> {
    /// 以 SDID 推导的参数键
    pub fn default_key(&self) -> ConfigKey {
        ConfigKey::autowire_param(self.strategy.name(), self.sdid.as_str(), self.instance)
    }

    /// 以别名推导的参数键
    pub fn alias_key(&self) -> Option<ConfigKey> {
        self.alias
            .map(|alias| ConfigKey::autowire_param(self.strategy.name(), alias, self.instance))
    }

    /// 按优先级排列的候选参数键：SDID 在前，别名在后
    pub fn candidate_keys(&self) -> Vec<ConfigKey> {
        let mut keys = vec![self.default_key()];
        keys.extend(self.alias_key());
        keys
    }
}

/// 参数加载器 trait
///
/// 从配置中填充组件参数。返回 [`Binding::Absent`] 表示参数保持工厂默认值。
pub trait ParamLoader<P>: Send + Sync {
    fn load(&self, ctx: &ParamContext<'_>, param: &mut P) -> ConfigResult<Binding>;
}

/// 默认参数加载器
///
/// 依次尝试 [`ParamContext::candidate_keys`]，将第一个存在的子树叠加到
/// 工厂产出的参数上；配置未提及的字段保留工厂给出的值。
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParamLoader;

impl<P> ParamLoader<P> for DefaultParamLoader
where
    P: Serialize + DeserializeOwned,
{
    fn load(&self, ctx: &ParamContext<'_>, param: &mut P) -> ConfigResult<Binding> {
        for key in ctx.candidate_keys() {
            if ctx.document.bind_into(&key, param)?.is_bound() {
                debug!("组件参数已从 {} 加载: {}", key, ctx.sdid);
                return Ok(Binding::Bound);
            }
        }
        debug!("组件参数未配置, 使用默认值: {}", ctx.sdid);
        Ok(Binding::Absent)
    }
}

/// 从固定键加载参数的加载器
#[derive(Debug, Clone)]
pub struct KeyParamLoader {
    key: ConfigKey,
}

impl KeyParamLoader {
    pub fn new(key: ConfigKey) -> Self {
        Self { key }
    }
}

impl<P> ParamLoader<P> for KeyParamLoader
where
    P: Serialize + DeserializeOwned,
{
    fn load(&self, ctx: &ParamContext<'_>, param: &mut P) -> ConfigResult<Binding> {
        ctx.document.bind_into(&self.key, param)
    }
}

/// 不读取配置的加载器，参数始终保持工厂默认值
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopParamLoader;

impl<P> ParamLoader<P> for NoopParamLoader {
    fn load(&self, _ctx: &ParamContext<'_>, _param: &mut P) -> ConfigResult<Binding> {
        Ok(Binding::Absent)
    }
}
