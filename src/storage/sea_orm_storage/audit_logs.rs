//! 审计日志存储操作
//!
//! 只追加表：这里只有 INSERT 和 SELECT，没有 UPDATE / DELETE。

use super::SeaOrmStorage;
use crate::entity::audit_logs::{ActiveModel, Column, Entity as AuditLogs};
use crate::errors::{ClassHubError, Result};
use crate::models::audit::{
    entities::{AuditLogEntry, NewAuditEntry},
    requests::AuditLogFilters,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

impl SeaOrmStorage {
    /// 追加一条审计日志
    pub async fn append_audit_log_impl(&self, entry: NewAuditEntry) -> Result<AuditLogEntry> {
        let now_ms = chrono::Utc::now().timestamp_millis();

        let model = ActiveModel {
            timestamp: Set(now_ms),
            actor_id: Set(entry.actor_id),
            actor_role: Set(entry.actor_role),
            action: Set(entry.action.to_string()),
            target: Set(entry.target),
            result: Set(entry.result.to_string()),
            reason: Set(entry.reason),
            request_id: Set(entry.request_id),
            ip: Set(entry.ip),
            user_agent: Set(entry.user_agent),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| ClassHubError::audit_write(format!("写入审计日志失败: {e}")))?;

        Ok(result.into_audit_entry())
    }

    // 组装过滤条件
    fn audit_filter_select(
        filters: &AuditLogFilters,
    ) -> sea_orm::Select<AuditLogs> {
        let mut select = AuditLogs::find();

        if let Some(from) = filters.from {
            select = select.filter(Column::Timestamp.gte(from));
        }
        if let Some(to) = filters.to {
            select = select.filter(Column::Timestamp.lte(to));
        }
        if let Some(class_id) = filters.class_id {
            // 班级过滤覆盖下级对象，如踢人条目的 target 为 class:{id}:student:{id}
            select = select.filter(
                Condition::any()
                    .add(Column::Target.eq(format!("class:{class_id}")))
                    .add(Column::Target.starts_with(format!("class:{class_id}:"))),
            );
        }
        if let Some(actor_id) = filters.actor_id {
            select = select.filter(Column::ActorId.eq(actor_id));
        }
        if let Some(ref actor_role) = filters.actor_role {
            select = select.filter(Column::ActorRole.eq(actor_role.clone()));
        }
        if let Some(ref action) = filters.action {
            select = select.filter(Column::Action.eq(action.clone()));
        }
        if let Some(ref target) = filters.target {
            select = select.filter(Column::Target.eq(target.clone()));
        }
        if let Some(ref result) = filters.result {
            select = select.filter(Column::Result.eq(result.clone()));
        }

        select
    }

    /// 按条件查询审计日志
    ///
    /// 同一毫秒内的条目以自增 id 作为次级排序键保持稳定顺序。
    pub async fn list_audit_logs_impl(
        &self,
        filters: AuditLogFilters,
        limit: i64,
        offset: i64,
        ascending: bool,
    ) -> Result<Vec<AuditLogEntry>> {
        let mut select = Self::audit_filter_select(&filters);

        select = if ascending {
            select
                .order_by_asc(Column::Timestamp)
                .order_by_asc(Column::Id)
        } else {
            select
                .order_by_desc(Column::Timestamp)
                .order_by_desc(Column::Id)
        };

        let rows = select
            .offset(offset.max(0) as u64)
            .limit(limit.max(0) as u64)
            .all(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询审计日志失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_audit_entry()).collect())
    }

    /// 按条件统计审计日志总数
    pub async fn count_audit_logs_impl(&self, filters: AuditLogFilters) -> Result<i64> {
        let count = Self::audit_filter_select(&filters)
            .count(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("统计审计日志失败: {e}")))?;

        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::memory_storage;
    use crate::models::audit::entities::{AuditAction, AuditResult, NewAuditEntry};
    use crate::models::audit::requests::AuditLogFilters;

    fn entry(actor_id: i64, action: AuditAction, result: AuditResult) -> NewAuditEntry {
        NewAuditEntry::new(actor_id, "student", action, "class:1", result)
    }

    #[tokio::test]
    async fn test_append_and_list() {
        let storage = memory_storage().await;

        storage
            .append_audit_log_impl(
                entry(2, AuditAction::JoinClass, AuditResult::Success)
                    .with_reason("invite accepted"),
            )
            .await
            .unwrap();
        storage
            .append_audit_log_impl(entry(3, AuditAction::JoinClass, AuditResult::Fail))
            .await
            .unwrap();

        let logs = storage
            .list_audit_logs_impl(AuditLogFilters::default(), 50, 0, false)
            .await
            .unwrap();
        assert_eq!(logs.len(), 2);
        // 默认按时间倒序，最新在前
        assert_eq!(logs[0].actor_id, 3);
        assert_eq!(logs[1].reason.as_deref(), Some("invite accepted"));
    }

    #[tokio::test]
    async fn test_filters() {
        let storage = memory_storage().await;

        storage
            .append_audit_log_impl(entry(2, AuditAction::JoinClass, AuditResult::Success))
            .await
            .unwrap();
        storage
            .append_audit_log_impl(entry(2, AuditAction::LeaveClass, AuditResult::Success))
            .await
            .unwrap();
        storage
            .append_audit_log_impl(entry(3, AuditAction::JoinClass, AuditResult::Denied))
            .await
            .unwrap();

        let filters = AuditLogFilters {
            action: Some("JOIN_CLASS".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.count_audit_logs_impl(filters.clone()).await.unwrap(), 2);

        let filters = AuditLogFilters {
            actor_id: Some(2),
            ..Default::default()
        };
        let logs = storage
            .list_audit_logs_impl(filters, 50, 0, true)
            .await
            .unwrap();
        assert_eq!(logs.len(), 2);
        // 升序时最早在前
        assert_eq!(logs[0].action, AuditAction::JoinClass);

        let filters = AuditLogFilters {
            result: Some("denied".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.count_audit_logs_impl(filters).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_class_id_filter_covers_nested_targets() {
        let storage = memory_storage().await;

        for target in ["class:1", "class:1:student:2", "class:12", "audit_logs"] {
            storage
                .append_audit_log_impl(NewAuditEntry::new(
                    1,
                    "teacher",
                    AuditAction::KickMember,
                    target,
                    AuditResult::Success,
                ))
                .await
                .unwrap();
        }

        let filters = AuditLogFilters {
            class_id: Some(1),
            ..Default::default()
        };
        // 命中 class:1 与 class:1:student:2，但不含 class:12
        assert_eq!(storage.count_audit_logs_impl(filters).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_actor_role_filter() {
        let storage = memory_storage().await;

        storage
            .append_audit_log_impl(entry(2, AuditAction::JoinClass, AuditResult::Success))
            .await
            .unwrap();
        storage
            .append_audit_log_impl(NewAuditEntry::new(
                1,
                "teacher",
                AuditAction::RotateInvite,
                "class:1",
                AuditResult::Success,
            ))
            .await
            .unwrap();

        let filters = AuditLogFilters {
            actor_role: Some("teacher".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.count_audit_logs_impl(filters).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_time_range_filter() {
        let storage = memory_storage().await;

        storage
            .append_audit_log_impl(entry(2, AuditAction::JoinClass, AuditResult::Success))
            .await
            .unwrap();

        let now_ms = chrono::Utc::now().timestamp_millis();
        let filters = AuditLogFilters {
            from: Some(now_ms - 60_000),
            to: Some(now_ms + 60_000),
            ..Default::default()
        };
        assert_eq!(storage.count_audit_logs_impl(filters).await.unwrap(), 1);

        // 范围之外查不到
        let filters = AuditLogFilters {
            to: Some(now_ms - 60_000),
            ..Default::default()
        };
        assert_eq!(storage.count_audit_logs_impl(filters).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_limit_and_offset() {
        let storage = memory_storage().await;

        for i in 0..5 {
            storage
                .append_audit_log_impl(entry(i, AuditAction::JoinClass, AuditResult::Success))
                .await
                .unwrap();
        }

        let page1 = storage
            .list_audit_logs_impl(AuditLogFilters::default(), 2, 0, true)
            .await
            .unwrap();
        let page2 = storage
            .list_audit_logs_impl(AuditLogFilters::default(), 2, 2, true)
            .await
            .unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 2);
        assert_ne!(page1[0].id, page2[0].id);
        // 稳定排序：分页不重叠
        assert!(page1.iter().all(|a| page2.iter().all(|b| a.id != b.id)));
    }
}
