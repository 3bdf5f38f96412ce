//! 字段注入绑定器
//!
//! 按声明顺序处理每个字段。单个字段失败不会中断其余字段，
//! 所有失败在最后汇总为 [`ResolveError::FieldInjection`]；
//! 循环依赖与深度超限除外，它们直接终止整条解析链。

use autowire_common::{ConfigError, FieldFailure, ResolveError, ResolveResult};
use config_abstractions::{Binding, Document};
use di_abstractions::{
    ComponentResolver, FieldBinding, FieldInjection, Presence, ResolveContext, StructDescriptor,
};
use std::any::Any;
use tracing::{debug, warn};

/// 为实例注入全部字段
pub fn bind_fields(
    resolver: &dyn ComponentResolver,
    document: &Document,
    descriptor: &StructDescriptor,
    host: &mut dyn Any,
    ctx: &mut ResolveContext,
) -> ResolveResult<()> {
    let mut failures = Vec::new();

    for field in descriptor.fields() {
        match bind_field(resolver, document, field, host, ctx) {
            Ok(()) => {}
            Err(e) if e.is_chain_fatal() => return Err(e),
            Err(e) => {
                warn!("字段注入失败: {}.{}: {}", descriptor.sdid(), field.name(), e);
                failures.push(FieldFailure::new(field.name(), e));
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ResolveError::FieldInjection {
            sdid: descriptor.sdid().to_string(),
            failures,
        })
    }
}

fn bind_field(
    resolver: &dyn ComponentResolver,
    document: &Document,
    field: &FieldInjection,
    host: &mut dyn Any,
    ctx: &mut ResolveContext,
) -> ResolveResult<()> {
    match field.binding() {
        FieldBinding::Component(target) => {
            let dependency = resolver.resolve_in(
                target.strategy.name(),
                &target.id,
                target.instance.as_deref(),
                ctx,
            )?;
            field.assign_component(host, dependency)
        }
        FieldBinding::Config { key, presence } => match field.assign_config(host, document)? {
            Binding::Bound => Ok(()),
            Binding::Absent if *presence == Presence::Required => {
                Err(ConfigError::key_not_found(key).into())
            }
            Binding::Absent => {
                debug!("可选配置缺失, 字段 {} 保持原值: {}", field.name(), key);
                Ok(())
            }
        },
    }
}
