use crate::models::PaginationQuery;
use serde::Deserialize;

// 创建班级请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// 班级列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassListQuery {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    /// 按创建教师过滤
    #[serde(default)]
    pub teacher_id: Option<i64>,
    /// 按名称模糊搜索
    #[serde(default)]
    pub search: Option<String>,
}
