//! 配置绑定结果

/// 一次配置绑定的结果
///
/// `Absent` 表示配置中没有对应子树，目标保持原值。
/// 这是显式的默认值路径，与绑定失败（错误）严格区分。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Binding {
    /// 已从配置写入目标
    Bound,
    /// 配置缺失，目标保持原值
    Absent,
}

impl Binding {
    /// 是否已写入目标
    pub fn is_bound(self) -> bool {
        self == Self::Bound
    }
}
