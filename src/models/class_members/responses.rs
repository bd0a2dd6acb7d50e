use serde::{Deserialize, Serialize};

use crate::models::PaginatedResponse;
use crate::models::class_members::entities::ClassMemberItem;

// 成员列表响应
pub type ClassMemberListResponse = PaginatedResponse<ClassMemberItem>;

// 加入班级响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinClassResponse {
    pub class_id: i64,
    pub class_name: String,
    /// 本次是否为幂等命中（已是成员时为 true）
    pub already_member: bool,
}
