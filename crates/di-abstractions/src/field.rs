//! 字段注入描述
//!
//! 每个可注入字段在注册时被描述为一条 [`FieldInjection`]：字段名、绑定目标
//! （其他组件或配置键）以及一个类型擦除的赋值函数。解析时按声明顺序遍历。

use crate::resolver::Instance;
use autowire_common::{AutowireStrategy, ResolveError, ResolveResult};
use config_abstractions::{Binding, ConfigKey, Document};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 配置字段缺失时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    /// 缺失时字段保持原值
    #[default]
    Optional,
    /// 缺失时注入失败
    Required,
}

/// 字段引用的组件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    pub strategy: AutowireStrategy,
    /// SDID 或别名
    pub id: String,
    /// 具名实例名
    pub instance: Option<String>,
}

/// 字段的绑定目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldBinding {
    Component(ComponentRef),
    Config { key: ConfigKey, presence: Presence },
}

type ComponentAssign = Arc<dyn Fn(&mut dyn Any, Instance) -> ResolveResult<()> + Send + Sync>;
type ConfigAssign =
    Arc<dyn Fn(&mut dyn Any, &Document, &ConfigKey) -> ResolveResult<Binding> + Send + Sync>;

#[derive(Clone)]
enum Assign {
    Component(ComponentAssign),
    Config(ConfigAssign),
}

/// 单个字段的注入描述
#[derive(Clone)]
pub struct FieldInjection {
    name: String,
    binding: FieldBinding,
    assign: Assign,
}

impl FieldInjection {
    /// 组件字段
    ///
    /// `set` 接收解析出的依赖实例并写入宿主 `T`。
    pub fn component<T, D, F>(name: impl Into<String>, target: ComponentRef, set: F) -> Self
    where
        T: Any,
        D: Any + Send + Sync,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        let id = target.id.clone();
        let assign: ComponentAssign = Arc::new(move |host: &mut dyn Any, dependency: Instance| -> ResolveResult<()> {
            let dependency = dependency
                .downcast::<D>()
                .map_err(|_| ResolveError::UnexpectedType {
                    id: id.clone(),
                    expected: std::any::type_name::<D>(),
                })?;
            let host = downcast_host::<T>(host)?;
            set(host, dependency);
            Ok(())
        });
        Self {
            name: name.into(),
            binding: FieldBinding::Component(target),
            assign: Assign::Component(assign),
        }
    }

    /// 配置字段
    pub fn config<T, V, F>(name: impl Into<String>, key: ConfigKey, presence: Presence, set: F) -> Self
    where
        T: Any,
        V: DeserializeOwned + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let assign: ConfigAssign = Arc::new(
            move |host: &mut dyn Any, document: &Document, key: &ConfigKey| -> ResolveResult<Binding> {
                match document.bind_optional::<V>(key)? {
                    Some(value) => {
                        let host = downcast_host::<T>(host)?;
                        set(host, value);
                        Ok(Binding::Bound)
                    }
                    None => Ok(Binding::Absent),
                }
            },
        );
        Self {
            name: name.into(),
            binding: FieldBinding::Config { key, presence },
            assign: Assign::Config(assign),
        }
    }

    /// 字段名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 绑定目标
    pub fn binding(&self) -> &FieldBinding {
        &self.binding
    }

    /// 写入已解析的依赖实例
    pub fn assign_component(&self, host: &mut dyn Any, dependency: Instance) -> ResolveResult<()> {
        match &self.assign {
            Assign::Component(assign) => assign(host, dependency),
            Assign::Config(_) => Err(self.kind_mismatch()),
        }
    }

    /// 从配置绑定字段值
    ///
    /// 键缺失时返回 [`Binding::Absent`]，是否视为错误由调用方根据 [`Presence`] 决定。
    pub fn assign_config(&self, host: &mut dyn Any, document: &Document) -> ResolveResult<Binding> {
        match (&self.assign, &self.binding) {
            (Assign::Config(assign), FieldBinding::Config { key, .. }) => {
                assign(host, document, key)
            }
            _ => Err(self.kind_mismatch()),
        }
    }

    fn kind_mismatch(&self) -> ResolveError {
        ResolveError::UnexpectedType {
            id: self.name.clone(),
            expected: "matching field binding",
        }
    }
}

impl fmt::Debug for FieldInjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInjection")
            .field("name", &self.name)
            .field("binding", &self.binding)
            .finish()
    }
}

fn downcast_host<T: Any>(host: &mut dyn Any) -> ResolveResult<&mut T> {
    host.downcast_mut::<T>()
        .ok_or_else(|| ResolveError::UnexpectedType {
            id: std::any::type_name::<T>().to_string(),
            expected: std::any::type_name::<T>(),
        })
}
