use std::sync::Arc;

use crate::models::{
    audit::{
        entities::{AuditLogEntry, NewAuditEntry},
        requests::AuditLogFilters,
    },
    class_members::{
        entities::ClassMember,
        requests::MemberListQuery,
        responses::ClassMemberListResponse,
    },
    classes::{
        entities::Class,
        requests::{ClassListQuery, CreateClassRequest},
        responses::ClassListResponse,
    },
    invites::entities::Invite,
    users::entities::{User, UserRole},
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 统计用户总数
    async fn count_users(&self) -> Result<i64>;
    // 创建用户
    async fn create_user(&self, username: &str, role: UserRole) -> Result<User>;

    /// 班级管理方法
    // 创建班级
    async fn create_class(&self, teacher_id: i64, class: CreateClassRequest) -> Result<Class>;
    // 通过ID获取班级信息
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>>;
    // 通过名称获取班级信息
    async fn get_class_by_name(&self, name: &str) -> Result<Option<Class>>;
    // 列出班级
    async fn list_classes_with_pagination(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse>;

    /// 邀请码管理方法
    // 轮换邀请码：撤销班级所有活跃码并签发新码，单事务完成
    async fn rotate_invite(
        &self,
        class_id: i64,
        created_by: i64,
        usage_limit: Option<i64>,
        expires_at: Option<i64>,
    ) -> Result<Invite>;
    // 获取班级当前活跃的邀请码
    async fn get_active_invite(&self, class_id: i64) -> Result<Option<Invite>>;
    // 校验邀请码，不可用时统一返回 None（不区分原因）
    async fn verify_invite(&self, code: &str) -> Result<Option<Invite>>;
    // 原子消耗一次邀请码用量，仅当邀请码仍然可用时成功
    async fn consume_invite(&self, code: &str) -> Result<bool>;

    /// 班级成员管理方法
    // 学生加入班级；已是成员时幂等返回现有记录及标记
    async fn add_class_member(&self, class_id: i64, student_id: i64)
    -> Result<(ClassMember, bool)>;
    // 移除班级成员（退出或踢出）；目标不是成员时返回 false
    async fn remove_class_member(&self, class_id: i64, student_id: i64) -> Result<bool>;
    // 查询用户是否为班级成员
    async fn is_class_member(&self, class_id: i64, student_id: i64) -> Result<bool>;
    // 列出班级成员（带用户名）
    async fn list_class_members_with_pagination(
        &self,
        class_id: i64,
        query: MemberListQuery,
    ) -> Result<ClassMemberListResponse>;

    /// 审计日志方法
    // 追加一条审计日志（只追加，永不更新）
    async fn append_audit_log(&self, entry: NewAuditEntry) -> Result<AuditLogEntry>;
    // 按条件查询审计日志；ascending 控制时间排序方向
    async fn list_audit_logs(
        &self,
        filters: AuditLogFilters,
        limit: i64,
        offset: i64,
        ascending: bool,
    ) -> Result<Vec<AuditLogEntry>>;
    // 按条件统计审计日志总数
    async fn count_audit_logs(&self, filters: AuditLogFilters) -> Result<i64>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
