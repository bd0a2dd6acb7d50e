//! 班级邀请码实体
//!
//! 邀请码本身是主键，查找路径始终按 code 命中。
//! `status` 只有 active / revoked 两个存储状态；过期与用完是读取时计算的派生状态。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "class_invites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub class_id: i64,
    pub created_by: i64,
    pub status: String,
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    /// 过期时间，毫秒时间戳；NULL 表示永不过期
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub revoked_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::classes::Entity",
        from = "Column::ClassId",
        to = "super::classes::Column::Id"
    )]
    Class,
}

impl Related<super::classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_invite(self) -> crate::models::invites::entities::Invite {
        use crate::models::invites::entities::{Invite, InviteStatus};

        Invite {
            code: self.code,
            class_id: self.class_id,
            created_by: self.created_by,
            status: self
                .status
                .parse::<InviteStatus>()
                .unwrap_or(InviteStatus::Revoked),
            usage_limit: self.usage_limit,
            usage_count: self.usage_count,
            expires_at: self.expires_at,
            created_at: self.created_at,
            revoked_at: self.revoked_at,
        }
    }
}
