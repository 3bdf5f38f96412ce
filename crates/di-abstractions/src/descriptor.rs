//! 组件描述符
//!
//! [`StructDescriptor`] 是一个可构造组件的不可变元数据：标识、工厂、参数、
//! 构造函数与字段注入表。描述符通过类型化的 [`DescriptorBuilder`] 构建，
//! 在注册时完成校验，之后以类型擦除的形式交给解析引擎使用。

use crate::field::{ComponentRef, FieldInjection, Presence};
use crate::param::{DefaultParamLoader, NoopParamLoader, ParamContext, ParamLoader};
use crate::resolver::{RawInstance, RawParam};
use autowire_common::{
    AutowireStrategy, BoxError, RegistryError, RegistryResult, ResolveError, ResolveResult, Sdid,
    TypeInfo,
};
use config_abstractions::{Binding, ConfigKey, KeySegment};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{type_name, Any};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

type FactoryFn = Arc<dyn Fn() -> Result<RawInstance, BoxError> + Send + Sync>;
type ParamFactoryFn = Arc<dyn Fn() -> RawParam + Send + Sync>;
type ParamLoadFn =
    Arc<dyn Fn(&ParamContext<'_>, &mut dyn Any) -> ResolveResult<Binding> + Send + Sync>;
type ConstructFn = Arc<dyn Fn(RawInstance, RawParam) -> Result<RawInstance, BoxError> + Send + Sync>;

fn factory_fn<F>(f: F) -> FactoryFn
where
    F: Fn() -> Result<RawInstance, BoxError> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn param_factory_fn<F>(f: F) -> ParamFactoryFn
where
    F: Fn() -> RawParam + Send + Sync + 'static,
{
    Arc::new(f)
}

fn param_load_fn<F>(f: F) -> ParamLoadFn
where
    F: Fn(&ParamContext<'_>, &mut dyn Any) -> ResolveResult<Binding> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn construct_fn<F>(f: F) -> ConstructFn
where
    F: Fn(RawInstance, RawParam) -> Result<RawInstance, BoxError> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn type_mismatch<X>() -> BoxError {
    format!("类型不符, 期望 {}", type_name::<X>()).into()
}

#[derive(Clone)]
struct ParamSpec {
    type_name: &'static str,
    factory: ParamFactoryFn,
    loader: ParamLoadFn,
}

impl ParamSpec {
    fn new<P>(factory: ParamFactoryFn) -> Self
    where
        P: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            type_name: type_name::<P>(),
            factory,
            loader: erase_loader::<P, _>(DefaultParamLoader),
        }
    }

    fn unit<P>() -> Self
    where
        P: Default + Send + Sync + 'static,
    {
        Self {
            type_name: type_name::<P>(),
            factory: param_factory_fn(|| Box::new(P::default()) as RawParam),
            loader: erase_loader::<P, _>(NoopParamLoader),
        }
    }
}

fn erase_loader<P, L>(loader: L) -> ParamLoadFn
where
    P: Any,
    L: ParamLoader<P> + 'static,
{
    param_load_fn(move |ctx, param| {
        let param = param
            .downcast_mut::<P>()
            .ok_or_else(|| ResolveError::UnexpectedType {
                id: ctx.sdid.to_string(),
                expected: type_name::<P>(),
            })?;
        loader.load(ctx, param).map_err(|source| ResolveError::Param {
            sdid: ctx.sdid.to_string(),
            source,
        })
    })
}

/// 组件描述符
#[derive(Clone)]
pub struct StructDescriptor {
    sdid: Sdid,
    alias: Option<String>,
    type_info: TypeInfo,
    factory: FactoryFn,
    param: Option<ParamSpec>,
    construct: Option<ConstructFn>,
    fields: Arc<[FieldInjection]>,
}

impl StructDescriptor {
    /// 以 `T::default()` 作为工厂
    pub fn builder<T>() -> DescriptorBuilder<T>
    where
        T: Default + Send + Sync + 'static,
    {
        DescriptorBuilder::new(factory_fn(|| Ok(Box::new(T::default()) as RawInstance)))
    }

    /// 以自定义工厂创建
    pub fn builder_with_factory<T, F>(factory: F) -> DescriptorBuilder<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        DescriptorBuilder::new(factory_fn(move || Ok(Box::new(factory()) as RawInstance)))
    }

    /// 以可能失败的工厂创建
    pub fn builder_with_try_factory<T, F, E>(factory: F) -> DescriptorBuilder<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        DescriptorBuilder::new(erase_try_factory(factory))
    }

    pub fn sdid(&self) -> &Sdid {
        &self.sdid
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 参数类型名
    pub fn param_type(&self) -> Option<&'static str> {
        self.param.as_ref().map(|param| param.type_name)
    }

    pub fn has_construct(&self) -> bool {
        self.construct.is_some()
    }

    /// 按声明顺序排列的字段注入表
    pub fn fields(&self) -> &[FieldInjection] {
        &self.fields
    }

    /// 调用工厂创建原始实例
    pub fn create_instance(&self) -> ResolveResult<RawInstance> {
        (self.factory)().map_err(|e| ResolveError::construction(&self.sdid, e))
    }

    /// 调用参数工厂
    pub fn create_param(&self) -> Option<RawParam> {
        self.param.as_ref().map(|param| (param.factory)())
    }

    /// 从配置填充参数
    pub fn load_param(&self, ctx: &ParamContext<'_>, param: &mut dyn Any) -> ResolveResult<Binding> {
        match &self.param {
            Some(spec) => (spec.loader)(ctx, param),
            None => Ok(Binding::Absent),
        }
    }

    /// 调用构造函数；未声明构造函数时原样返回实例
    pub fn construct(&self, instance: RawInstance, param: Option<RawParam>) -> ResolveResult<RawInstance> {
        let Some(construct) = &self.construct else {
            return Ok(instance);
        };
        let param = param.ok_or_else(|| ResolveError::construction(&self.sdid, "构造函数缺少参数"))?;
        construct(instance, param).map_err(|e| ResolveError::construction(&self.sdid, e))
    }
}

impl fmt::Debug for StructDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructDescriptor")
            .field("sdid", &self.sdid)
            .field("alias", &self.alias)
            .field("type", &self.type_info.full_name)
            .field("param", &self.param_type())
            .field("construct", &self.has_construct())
            .field("fields", &self.fields)
            .finish()
    }
}

fn erase_try_factory<T, F, E>(factory: F) -> FactoryFn
where
    T: Send + Sync + 'static,
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    factory_fn(move || {
        factory()
            .map(|instance| Box::new(instance) as RawInstance)
            .map_err(Into::into)
    })
}

/// 描述符构建器
///
/// `T` 为组件类型，`P` 为构造参数类型（未声明时为 `()`）。
/// 构建过程中的问题被记录下来，在 [`DescriptorBuilder::build`] 时统一报告。
pub struct DescriptorBuilder<T, P = ()> {
    sdid: Sdid,
    alias: Option<String>,
    factory: FactoryFn,
    param: Option<ParamSpec>,
    construct: Option<ConstructFn>,
    fields: Vec<FieldInjection>,
    problems: Vec<String>,
    _marker: PhantomData<fn() -> (T, P)>,
}

impl<T> DescriptorBuilder<T, ()>
where
    T: Send + Sync + 'static,
{
    fn new(factory: FactoryFn) -> Self {
        Self {
            sdid: Sdid::of::<T>(),
            alias: None,
            factory,
            param: None,
            construct: None,
            fields: Vec::new(),
            problems: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// 声明构造参数类型，默认从 `autowire.<strategy>.<sdid>.param` 加载
    pub fn with_param<Q>(mut self) -> DescriptorBuilder<T, Q>
    where
        Q: Serialize + DeserializeOwned + Default + Send + Sync + 'static,
    {
        if self.construct.take().is_some() {
            self.problems
                .push("参数类型必须在构造函数之前声明".to_string());
        }
        DescriptorBuilder {
            sdid: self.sdid,
            alias: self.alias,
            factory: self.factory,
            param: Some(ParamSpec::new::<Q>(param_factory_fn(|| {
                Box::new(Q::default()) as RawParam
            }))),
            construct: None,
            fields: self.fields,
            problems: self.problems,
            _marker: PhantomData,
        }
    }

    /// 不需要参数的构造函数
    pub fn with_construct_no_param<F, E>(self, construct: F) -> Self
    where
        F: Fn(T) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.with_construct(move |instance, ()| construct(instance))
    }
}

impl<T, P> DescriptorBuilder<T, P>
where
    T: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    /// 指定 SDID（默认由类型路径推导）
    pub fn with_sdid(mut self, sdid: impl Into<Sdid>) -> Self {
        self.sdid = sdid.into();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.factory = factory_fn(move || Ok(Box::new(factory()) as RawInstance));
        self
    }

    pub fn with_try_factory<F, E>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.factory = erase_try_factory(factory);
        self
    }

    /// 替换参数工厂（加载前的初始值）
    pub fn with_param_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> P + Send + Sync + 'static,
    {
        match self.param.as_mut() {
            Some(spec) => spec.factory = param_factory_fn(move || Box::new(factory()) as RawParam),
            None => self.problems.push("设置参数工厂前必须声明参数类型".to_string()),
        }
        self
    }

    /// 替换参数加载器
    pub fn with_param_loader<L>(mut self, loader: L) -> Self
    where
        L: ParamLoader<P> + 'static,
    {
        match self.param.as_mut() {
            Some(spec) => spec.loader = erase_loader::<P, L>(loader),
            None => self.problems.push("设置参数加载器前必须声明参数类型".to_string()),
        }
        self
    }

    /// 构造函数：接收工厂产出的实例和已加载的参数，返回继续装配的实例
    pub fn with_construct<F, E>(mut self, construct: F) -> Self
    where
        P: Default,
        F: Fn(T, P) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        if self.param.is_none() {
            self.param = Some(ParamSpec::unit::<P>());
        }
        self.construct = Some(construct_fn(move |instance, param| {
            let instance = instance.downcast::<T>().map_err(|_| type_mismatch::<T>())?;
            let param = param.downcast::<P>().map_err(|_| type_mismatch::<P>())?;
            construct(*instance, *param)
                .map(|built| Box::new(built) as RawInstance)
                .map_err(Into::into)
        }));
        self
    }

    /// 注入组件，依赖以其类型推导的 SDID 查找
    pub fn inject_component<D, F>(self, field: &str, strategy: AutowireStrategy, set: F) -> Self
    where
        D: Any + Send + Sync,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        let id = Sdid::of::<D>().to_string();
        self.push_component(field, strategy, id, None, set)
    }

    /// 按 SDID 或别名注入组件
    pub fn inject_component_by_id<D, F>(
        self,
        field: &str,
        strategy: AutowireStrategy,
        id: impl Into<String>,
        set: F,
    ) -> Self
    where
        D: Any + Send + Sync,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        self.push_component(field, strategy, id.into(), None, set)
    }

    /// 注入具名实例
    pub fn inject_named_component<D, F>(
        self,
        field: &str,
        strategy: AutowireStrategy,
        id: impl Into<String>,
        instance: impl Into<String>,
        set: F,
    ) -> Self
    where
        D: Any + Send + Sync,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        self.push_component(field, strategy, id.into(), Some(instance.into()), set)
    }

    /// 注入可选配置；路径为空时使用 `autowire.config.<值类型 SDID>`
    pub fn inject_config<V, F>(self, field: &str, path: &str, set: F) -> Self
    where
        V: DeserializeOwned + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.push_config(field, path, Presence::Optional, set)
    }

    /// 注入必需配置，缺失时解析失败
    pub fn inject_required_config<V, F>(self, field: &str, path: &str, set: F) -> Self
    where
        V: DeserializeOwned + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.push_config(field, path, Presence::Required, set)
    }

    fn push_component<D, F>(
        mut self,
        field: &str,
        strategy: AutowireStrategy,
        id: String,
        instance: Option<String>,
        set: F,
    ) -> Self
    where
        D: Any + Send + Sync,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        if id.trim().is_empty() {
            self.problems.push(format!("字段 {} 的组件标识为空", field));
        }
        let target = ComponentRef {
            strategy,
            id,
            instance,
        };
        self.fields
            .push(FieldInjection::component::<T, D, F>(field, target, set));
        self
    }

    fn push_config<V, F>(mut self, field: &str, path: &str, presence: Presence, set: F) -> Self
    where
        V: DeserializeOwned + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let key = if path.trim().is_empty() {
            let fallback = ConfigKey::autowire_config(Sdid::of::<V>().as_str());
            if !fallback.is_encodable() {
                self.problems.push(format!(
                    "字段 {} 的值类型 {} 无法作为配置键段, 需显式指定路径",
                    field,
                    type_name::<V>()
                ));
            }
            Ok(fallback)
        } else {
            ConfigKey::parse(path)
        };
        match key {
            Ok(key) => self
                .fields
                .push(FieldInjection::config::<T, V, F>(field, key, presence, set)),
            Err(e) => self.problems.push(format!("字段 {} 的配置路径无效: {}", field, e)),
        }
        self
    }

    /// 校验并生成描述符
    pub fn build(self) -> RegistryResult<StructDescriptor> {
        let mut problems = self.problems;

        if self.sdid.as_str().trim().is_empty() {
            problems.push("SDID 不能为空".to_string());
        }
        match &self.alias {
            Some(alias) if alias.trim().is_empty() => {
                problems.push("别名不能为空".to_string());
            }
            Some(alias) if !KeySegment::new(alias.as_str()).is_encodable() => {
                problems.push(format!("别名 {} 不能含有 '<' 或 '>'", alias));
            }
            Some(_) => {}
            None if !KeySegment::new(self.sdid.as_str()).is_encodable() => {
                problems.push("SDID 含有 '<' 或 '>', 无法作为配置键段, 需指定别名".to_string());
            }
            None => {}
        }
        if self.param.is_some() && self.construct.is_none() {
            problems.push("声明了参数类型但没有构造函数".to_string());
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name()) {
                problems.push(format!("字段重复声明: {}", field.name()));
            }
        }

        if !problems.is_empty() {
            return Err(RegistryError::InvalidDescriptor {
                sdid: self.sdid.to_string(),
                message: problems.join("; "),
            });
        }

        debug!(
            "组件描述符构建完成: {} (字段 {} 个)",
            self.sdid,
            self.fields.len()
        );
        Ok(StructDescriptor {
            sdid: self.sdid,
            alias: self.alias,
            type_info: TypeInfo::of::<T>(),
            factory: self.factory,
            param: self.param,
            construct: self.construct,
            fields: self.fields.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_abstractions::Document;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Client {
        address: String,
        db: i64,
        timeout: u64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct ClientParam {
        address: String,
        #[serde(default)]
        db: i64,
    }

    fn client_descriptor() -> StructDescriptor {
        StructDescriptor::builder::<Client>()
            .with_alias("client")
            .with_param::<ClientParam>()
            .with_construct(|mut client: Client, param: ClientParam| {
                if param.address.is_empty() {
                    return Err("address 不能为空");
                }
                client.address = param.address;
                client.db = param.db;
                Ok(client)
            })
            .inject_config("timeout", "client.timeout", |client: &mut Client, timeout: u64| {
                client.timeout = timeout
            })
            .build()
            .unwrap()
    }

    #[test]
    fn sdid_defaults_to_type_path() {
        let descriptor = client_descriptor();
        assert_eq!(descriptor.sdid(), &Sdid::of::<Client>());
        assert!(descriptor.sdid().as_str().ends_with(".Client"));
        assert_eq!(descriptor.type_info().short_name(), "Client");
        assert_eq!(descriptor.alias(), Some("client"));
        assert!(descriptor.has_construct());
        assert_eq!(descriptor.fields().len(), 1);
    }

    #[test]
    fn construct_receives_loaded_param() {
        let descriptor = client_descriptor();
        let document = Document::from_value(json!({
            "autowire": {"normal": {"client": {"param": {"address": "localhost:6379", "db": 2}}}}
        }));
        let strategy = AutowireStrategy::normal();
        let ctx = ParamContext {
            document: &document,
            strategy: &strategy,
            sdid: descriptor.sdid(),
            alias: descriptor.alias(),
            instance: None,
        };

        let instance = descriptor.create_instance().unwrap();
        let mut param = descriptor.create_param().unwrap();
        assert!(descriptor.load_param(&ctx, param.as_mut()).unwrap().is_bound());

        let built = descriptor.construct(instance, Some(param)).unwrap();
        let client = built.downcast::<Client>().unwrap();
        assert_eq!(client.address, "localhost:6379");
        assert_eq!(client.db, 2);
    }

    #[test]
    fn construct_error_is_wrapped_with_identity() {
        let descriptor = client_descriptor();
        let instance = descriptor.create_instance().unwrap();
        let param = descriptor.create_param();

        match descriptor.construct(instance, param) {
            Err(ResolveError::Construction { sdid, source }) => {
                assert_eq!(sdid, descriptor.sdid().to_string());
                assert_eq!(source.to_string(), "address 不能为空");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn construct_without_param_uses_unit() {
        let descriptor = StructDescriptor::builder::<Client>()
            .with_construct_no_param(|mut client: Client| {
                client.db = 7;
                Ok::<_, BoxError>(client)
            })
            .build()
            .unwrap();

        assert_eq!(descriptor.param_type(), Some("()"));
        let instance = descriptor.create_instance().unwrap();
        let built = descriptor
            .construct(instance, descriptor.create_param())
            .unwrap();
        assert_eq!(built.downcast::<Client>().unwrap().db, 7);
    }

    #[test]
    fn try_factory_failure_is_construction_error() {
        let descriptor = StructDescriptor::builder_with_try_factory(|| {
            Err::<Client, _>("连接失败")
        })
        .build()
        .unwrap();

        assert!(matches!(
            descriptor.create_instance(),
            Err(ResolveError::Construction { .. })
        ));
    }

    #[test]
    fn blank_config_path_falls_back_to_type_key() {
        let descriptor = StructDescriptor::builder::<Client>()
            .inject_config("timeout", "", |client: &mut Client, timeout: u64| {
                client.timeout = timeout
            })
            .build()
            .unwrap();

        match descriptor.fields()[0].binding() {
            crate::field::FieldBinding::Config { key, presence } => {
                assert_eq!(key.encode(), "autowire.config.u64");
                assert_eq!(*presence, Presence::Optional);
            }
            other => panic!("unexpected binding: {other:?}"),
        }
    }

    #[test]
    fn invalid_descriptors_are_rejected() {
        let result = StructDescriptor::builder::<Client>()
            .with_sdid("")
            .inject_config("timeout", "a.<b", |client: &mut Client, timeout: u64| {
                client.timeout = timeout
            })
            .build();
        match result {
            Err(RegistryError::InvalidDescriptor { message, .. }) => {
                assert!(message.contains("SDID"));
                assert!(message.contains("timeout"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let duplicated = StructDescriptor::builder::<Client>()
            .inject_config("timeout", "a", |client: &mut Client, v: u64| client.timeout = v)
            .inject_config("timeout", "b", |client: &mut Client, v: u64| client.timeout = v)
            .build();
        assert!(matches!(duplicated, Err(RegistryError::InvalidDescriptor { .. })));

        let param_without_construct = StructDescriptor::builder::<Client>()
            .with_param::<ClientParam>()
            .build();
        assert!(matches!(
            param_without_construct,
            Err(RegistryError::InvalidDescriptor { .. })
        ));

        let blank_alias = StructDescriptor::builder::<Client>().with_alias(" ").build();
        assert!(matches!(blank_alias, Err(RegistryError::InvalidDescriptor { .. })));
    }

    #[test]
    fn generic_identity_requires_alias() {
        #[derive(Default)]
        struct Pool<X>(Option<X>);

        let unaliased = StructDescriptor::builder::<Pool<u8>>().build();
        match unaliased {
            Err(RegistryError::InvalidDescriptor { sdid, message }) => {
                assert!(sdid.contains('<'));
                assert!(message.contains("别名"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let aliased = StructDescriptor::builder::<Pool<u8>>()
            .with_alias("u8-pool")
            .build()
            .unwrap();
        assert_eq!(aliased.alias(), Some("u8-pool"));

        let generic_value = StructDescriptor::builder::<Client>()
            .inject_config("tags", "", |_: &mut Client, _tags: Vec<String>| {})
            .build();
        assert!(matches!(generic_value, Err(RegistryError::InvalidDescriptor { .. })));
    }

    #[test]
    fn param_declared_after_construct_is_rejected() {
        let result = StructDescriptor::builder::<Client>()
            .with_construct(|client: Client, ()| Ok::<_, BoxError>(client))
            .with_param::<ClientParam>()
            .with_construct(|client: Client, _param: ClientParam| Ok::<_, BoxError>(client))
            .build();
        assert!(matches!(result, Err(RegistryError::InvalidDescriptor { .. })));
    }
}
