use serde::Deserialize;

// 审计日志查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQueryParams {
    /// 起始时间（毫秒时间戳，含）
    #[serde(default)]
    pub from: Option<i64>,
    /// 结束时间（毫秒时间戳，含）
    #[serde(default)]
    pub to: Option<i64>,
    /// 按班级过滤（匹配 target 为该班级及其下级对象的条目）
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub actor_id: Option<i64>,
    #[serde(default)]
    pub actor_role: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    /// 排序方向：desc（默认，最新在前）或 asc
    #[serde(default)]
    pub order: Option<String>,
}

// 审计日志导出参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditExportParams {
    /// 导出模式：page（默认）或 all
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub from: Option<i64>,
    #[serde(default)]
    pub to: Option<i64>,
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub actor_id: Option<i64>,
    #[serde(default)]
    pub actor_role: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// 审计过滤条件（存储层统一入参）
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilters {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub class_id: Option<i64>,
    pub actor_id: Option<i64>,
    pub actor_role: Option<String>,
    pub action: Option<String>,
    pub target: Option<String>,
    pub result: Option<String>,
}
