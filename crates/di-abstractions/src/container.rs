//! 容器运行配置

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// 是否启用循环依赖检测
    ///
    /// 单例策略始终检测；关闭后普通策略仅受解析深度限制。
    pub enable_circular_dependency_detection: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            enable_circular_dependency_detection: true,
            max_resolution_depth: 100,
        }
    }
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_circular_dependency_detection(mut self, enabled: bool) -> Self {
        self.enable_circular_dependency_detection = enabled;
        self
    }

    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }
}
