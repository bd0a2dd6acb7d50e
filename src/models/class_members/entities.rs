use serde::{Deserialize, Serialize};

// 班级成员关系
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMember {
    pub id: i64,
    pub class_id: i64,
    pub student_id: i64,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

// 带用户名的成员条目（成员列表用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMemberItem {
    pub student_id: i64,
    pub username: String,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}
