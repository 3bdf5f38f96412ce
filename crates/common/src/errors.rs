//! 错误类型定义

use thiserror::Error;

/// 工厂、构造函数等用户代码返回的任意错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置键格式错误: {key}, 原因: {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型不匹配: {key}, 原因: {message}")]
    TypeMismatch { key: String, message: String },

    #[error("配置文件读取失败: {path}, 原因: {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置解析失败: {origin}, 原因: {source}")]
    ParseError { origin: String, source: BoxError },

    #[error("配置文档结构无效: {origin}, 原因: {message}")]
    InvalidDocument { origin: String, message: String },
}

impl ConfigError {
    /// 创建键不存在错误
    pub fn key_not_found(key: impl ToString) -> Self {
        Self::KeyNotFound {
            key: key.to_string(),
        }
    }

    /// 创建类型不匹配错误
    pub fn type_mismatch(key: impl ToString, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// 是否为键不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

/// 组件注册错误类型
///
/// 注册只发生在进程启动阶段，这些错误应当终止启动。
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("组件标识重复: 策略 {strategy} 中已存在{kind} {id}")]
    DuplicateIdentity {
        strategy: String,
        kind: IdentityKind,
        id: String,
    },

    #[error("策略 {strategy} 的生命周期冲突: 已注册为 {existing}, 本次为 {requested}")]
    ConflictingStrategy {
        strategy: String,
        existing: String,
        requested: String,
    },

    #[error("组件注册表已冻结, 无法再注册: {sdid}")]
    RegistryFrozen { sdid: String },

    #[error("组件描述符无效: {sdid}, 原因: {message}")]
    InvalidDescriptor { sdid: String, message: String },
}

/// 组件标识的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    Sdid,
    Alias,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sdid => f.write_str("SDID"),
            Self::Alias => f.write_str("别名"),
        }
    }
}

/// 组件解析错误类型
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("组件未注册: 策略 {strategy}, 标识 {id}")]
    NotFound { strategy: String, id: String },

    #[error("组件构造失败: {sdid}, 原因: {source}")]
    Construction { sdid: String, source: BoxError },

    #[error("循环依赖检测到: {chain}")]
    Cycle { chain: String },

    #[error("解析深度超过上限 {max_depth}: {chain}")]
    DepthExceeded { max_depth: usize, chain: String },

    #[error("组件参数加载失败: {sdid}, 原因: {source}")]
    Param {
        sdid: String,
        #[source]
        source: ConfigError,
    },

    #[error("配置绑定失败: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("字段注入失败: {sdid}, {}", describe_failures(.failures))]
    FieldInjection {
        sdid: String,
        failures: Vec<FieldFailure>,
    },

    #[error("组件类型不符: {id}, 期望 {expected}")]
    UnexpectedType { id: String, expected: &'static str },

    #[error("容器尚未初始化")]
    NotInitialized,
}

impl ResolveError {
    /// 创建构造失败错误
    pub fn construction(sdid: impl ToString, source: impl Into<BoxError>) -> Self {
        Self::Construction {
            sdid: sdid.to_string(),
            source: source.into(),
        }
    }

    /// 是否为未注册错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// 是否终止整条解析链
    ///
    /// 循环依赖与深度超限不参与字段级的错误汇总，直接向上返回。
    pub fn is_chain_fatal(&self) -> bool {
        matches!(self, Self::Cycle { .. } | Self::DepthExceeded { .. })
    }
}

/// 单个字段的注入失败
#[derive(Debug)]
pub struct FieldFailure {
    /// 字段名
    pub field: String,
    /// 失败原因
    pub error: ResolveError,
}

impl FieldFailure {
    /// 创建新的字段失败记录
    pub fn new(field: impl Into<String>, error: ResolveError) -> Self {
        Self {
            field: field.into(),
            error,
        }
    }
}

fn describe_failures(failures: &[FieldFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("[{}: {}]", failure.field, failure.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 启动阶段错误类型
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("配置加载失败: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("组件注册失败: {source}")]
    Registry {
        #[from]
        source: RegistryError,
    },

    #[error("容器已经初始化")]
    AlreadyInitialized,
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type RegistryResult<T> = Result<T, RegistryError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
pub type BootstrapResult<T> = Result<T, BootstrapError>;
