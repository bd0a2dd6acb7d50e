use crate::models::PaginationQuery;
use serde::Deserialize;

// 凭邀请码加入班级请求
#[derive(Debug, Clone, Deserialize)]
pub struct JoinClassRequest {
    pub code: String,
}

// 退出班级请求
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveClassRequest {
    pub class_id: i64,
}

// 成员列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberListQuery {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
}
