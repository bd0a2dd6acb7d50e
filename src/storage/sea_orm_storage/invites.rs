//! 邀请码存储操作
//!
//! 轮换在单事务内完成：撤销旧码与签发新码要么同时生效，要么都不生效，
//! 保证任意时刻一个班级最多只有一个 active 状态的邀请码。
//! 消耗用量走单条条件 UPDATE，依靠数据库原子性保证限量精确。

use super::SeaOrmStorage;
use crate::entity::class_invites::{ActiveModel, Column, Entity as ClassInvites};
use crate::errors::{ClassHubError, Result};
use crate::models::invites::entities::{Invite, InviteStatus};
use crate::utils::random_code::generate_random_code;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ExprTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};

/// 邀请码长度
const INVITE_CODE_LENGTH: usize = 6;
/// 生成碰撞时的重试次数
const CODE_GENERATION_ATTEMPTS: usize = 3;

impl SeaOrmStorage {
    /// 轮换邀请码
    ///
    /// 撤销班级所有活跃邀请码并签发新码，整体在一个事务中执行。
    pub async fn rotate_invite_impl(
        &self,
        class_id: i64,
        created_by: i64,
        usage_limit: Option<i64>,
        expires_at: Option<i64>,
    ) -> Result<Invite> {
        let now_ms = chrono::Utc::now().timestamp_millis();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ClassHubError::database_operation(format!("开启事务失败: {e}")))?;

        // 撤销该班级所有活跃邀请码
        ClassInvites::update_many()
            .col_expr(Column::Status, Expr::value(InviteStatus::Revoked.to_string()))
            .col_expr(Column::RevokedAt, Expr::value(now_ms))
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Status.eq(InviteStatus::Active.to_string()))
            .exec(&txn)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("撤销旧邀请码失败: {e}")))?;

        // 生成新码，码为主键，碰撞时重试
        let mut inserted = None;
        for _ in 0..CODE_GENERATION_ATTEMPTS {
            let code = generate_random_code(INVITE_CODE_LENGTH);

            let exists = ClassInvites::find_by_id(code.clone())
                .one(&txn)
                .await
                .map_err(|e| ClassHubError::database_operation(format!("查询邀请码失败: {e}")))?;
            if exists.is_some() {
                continue;
            }

            let model = ActiveModel {
                code: Set(code),
                class_id: Set(class_id),
                created_by: Set(created_by),
                status: Set(InviteStatus::Active.to_string()),
                usage_limit: Set(usage_limit),
                usage_count: Set(0),
                expires_at: Set(expires_at),
                created_at: Set(now_ms),
                revoked_at: Set(None),
            };

            let result = model
                .insert(&txn)
                .await
                .map_err(|e| ClassHubError::database_operation(format!("签发邀请码失败: {e}")))?;
            inserted = Some(result);
            break;
        }

        let Some(result) = inserted else {
            txn.rollback()
                .await
                .map_err(|e| ClassHubError::database_operation(format!("回滚事务失败: {e}")))?;
            return Err(ClassHubError::code_generation(
                "邀请码生成多次碰撞，放弃本次轮换",
            ));
        };

        txn.commit()
            .await
            .map_err(|e| ClassHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.into_invite())
    }

    /// 获取班级当前活跃邀请码
    pub async fn get_active_invite_impl(&self, class_id: i64) -> Result<Option<Invite>> {
        let result = ClassInvites::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Status.eq(InviteStatus::Active.to_string()))
            .order_by_desc(Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询邀请码失败: {e}")))?;

        Ok(result.map(|m| m.into_invite()))
    }

    /// 校验邀请码
    ///
    /// 不存在 / 已撤销 / 已过期 / 已用完一律返回 None，不暴露具体原因。
    pub async fn verify_invite_impl(&self, code: &str) -> Result<Option<Invite>> {
        let result = ClassInvites::find_by_id(code.to_string())
            .one(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询邀请码失败: {e}")))?;

        let now_ms = chrono::Utc::now().timestamp_millis();
        Ok(result
            .map(|m| m.into_invite())
            .filter(|invite| invite.is_usable(now_ms)))
    }

    /// 原子消耗一次邀请码用量
    ///
    /// 条件 UPDATE 把可用性判断放进同一条语句，并发加入时
    /// 限量为 L 的邀请码恰好放行 L 次。
    pub async fn consume_invite_impl(&self, code: &str) -> Result<bool> {
        let now_ms = chrono::Utc::now().timestamp_millis();

        let result = ClassInvites::update_many()
            .col_expr(
                Column::UsageCount,
                Expr::col(Column::UsageCount).add(1),
            )
            .filter(Column::Code.eq(code))
            .filter(Column::Status.eq(InviteStatus::Active.to_string()))
            .filter(
                Condition::any()
                    .add(Column::ExpiresAt.is_null())
                    .add(Column::ExpiresAt.gt(now_ms)),
            )
            .filter(
                Condition::any()
                    .add(Column::UsageLimit.is_null())
                    .add(Expr::col(Column::UsageCount).lt(Expr::col(Column::UsageLimit))),
            )
            .exec(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("消耗邀请码失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, seed_user};
    use crate::models::classes::requests::CreateClassRequest;
    use crate::models::invites::entities::InviteStatus;

    async fn setup_class(storage: &super::SeaOrmStorage) -> i64 {
        seed_user(storage, 1, "teacher_wang", "teacher").await;
        storage
            .create_class_impl(
                1,
                CreateClassRequest {
                    name: "测试班级".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_rotate_creates_active_invite() {
        let storage = memory_storage().await;
        let class_id = setup_class(&storage).await;

        let invite = storage
            .rotate_invite_impl(class_id, 1, None, None)
            .await
            .unwrap();

        assert_eq!(invite.code.len(), 6);
        assert_eq!(invite.status, InviteStatus::Active);
        assert_eq!(invite.usage_count, 0);
    }

    #[tokio::test]
    async fn test_rotate_revokes_previous_invite() {
        let storage = memory_storage().await;
        let class_id = setup_class(&storage).await;

        let first = storage
            .rotate_invite_impl(class_id, 1, None, None)
            .await
            .unwrap();
        let second = storage
            .rotate_invite_impl(class_id, 1, None, None)
            .await
            .unwrap();

        assert_ne!(first.code, second.code);

        // 旧码立即失效
        assert!(storage.verify_invite_impl(&first.code).await.unwrap().is_none());
        // 新码可用
        assert!(storage.verify_invite_impl(&second.code).await.unwrap().is_some());

        // 任意时刻最多一个活跃码
        let active = storage.get_active_invite_impl(class_id).await.unwrap();
        assert_eq!(active.unwrap().code, second.code);
    }

    #[tokio::test]
    async fn test_verify_rejects_uniformly() {
        let storage = memory_storage().await;
        let class_id = setup_class(&storage).await;

        // 不存在的码
        assert!(storage.verify_invite_impl("ZZZZZZ").await.unwrap().is_none());

        // 已过期的码
        let past = chrono::Utc::now().timestamp_millis() - 1000;
        let expired = storage
            .rotate_invite_impl(class_id, 1, None, Some(past))
            .await
            .unwrap();
        assert!(
            storage
                .verify_invite_impl(&expired.code)
                .await
                .unwrap()
                .is_none()
        );

        // 限量为 0 的码
        let zero_limit = storage
            .rotate_invite_impl(class_id, 1, Some(0), None)
            .await
            .unwrap();
        assert!(
            storage
                .verify_invite_impl(&zero_limit.code)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_consume_respects_usage_limit() {
        let storage = memory_storage().await;
        let class_id = setup_class(&storage).await;

        let invite = storage
            .rotate_invite_impl(class_id, 1, Some(3), None)
            .await
            .unwrap();

        // 限量 3 次，恰好放行 3 次
        for _ in 0..3 {
            assert!(storage.consume_invite_impl(&invite.code).await.unwrap());
        }
        assert!(!storage.consume_invite_impl(&invite.code).await.unwrap());

        // 用完后校验也失败
        assert!(
            storage
                .verify_invite_impl(&invite.code)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_consume_rejects_revoked_and_expired() {
        let storage = memory_storage().await;
        let class_id = setup_class(&storage).await;

        let old = storage
            .rotate_invite_impl(class_id, 1, None, None)
            .await
            .unwrap();
        storage
            .rotate_invite_impl(class_id, 1, None, None)
            .await
            .unwrap();
        // 被轮换撤销的码不能消耗
        assert!(!storage.consume_invite_impl(&old.code).await.unwrap());

        let past = chrono::Utc::now().timestamp_millis() - 1000;
        let expired = storage
            .rotate_invite_impl(class_id, 1, None, Some(past))
            .await
            .unwrap();
        assert!(!storage.consume_invite_impl(&expired.code).await.unwrap());
    }

    #[tokio::test]
    async fn test_unlimited_invite_keeps_counting() {
        let storage = memory_storage().await;
        let class_id = setup_class(&storage).await;

        let invite = storage
            .rotate_invite_impl(class_id, 1, None, None)
            .await
            .unwrap();

        for _ in 0..10 {
            assert!(storage.consume_invite_impl(&invite.code).await.unwrap());
        }

        let current = storage
            .verify_invite_impl(&invite.code)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.usage_count, 10);
    }
}
