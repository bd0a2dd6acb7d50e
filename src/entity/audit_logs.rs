//! 审计日志实体
//!
//! 只追加表：写入后永不更新、永不删除。
//! `timestamp` 使用毫秒时间戳，同一毫秒内的条目以自增 id 保序。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: i64,
    pub actor_id: i64,
    pub actor_role: String,
    pub action: String,
    pub target: String,
    pub result: String,
    pub reason: Option<String>,
    pub request_id: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_audit_entry(self) -> crate::models::audit::entities::AuditLogEntry {
        use crate::models::audit::entities::{AuditAction, AuditLogEntry, AuditResult};
        use chrono::{DateTime, Utc};

        AuditLogEntry {
            id: self.id,
            timestamp: DateTime::<Utc>::from_timestamp_millis(self.timestamp).unwrap_or_default(),
            actor_id: self.actor_id,
            actor_role: self.actor_role,
            action: self
                .action
                .parse::<AuditAction>()
                .unwrap_or(AuditAction::Unknown),
            target: self.target,
            result: self
                .result
                .parse::<AuditResult>()
                .unwrap_or(AuditResult::Fail),
            reason: self.reason,
            request_id: self.request_id,
            ip: self.ip,
            user_agent: self.user_agent,
        }
    }
}
