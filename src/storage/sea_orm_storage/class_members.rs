//! 班级成员存储操作
//!
//! 加入走 INSERT .. ON CONFLICT DO NOTHING，重复加入不报错也不产生
//! 重复行，幂等性由 (class_id, student_id) 唯一索引兜底。

use super::SeaOrmStorage;
use crate::entity::class_members::{ActiveModel, Column, Entity as ClassMembers};
use crate::entity::users::Entity as Users;
use crate::errors::{ClassHubError, Result};
use crate::models::{
    PaginationInfo,
    class_members::{
        entities::{ClassMember, ClassMemberItem},
        requests::MemberListQuery,
        responses::ClassMemberListResponse,
    },
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 加入班级（幂等）
    ///
    /// 返回成员记录和一个标记：true 表示本次为重复加入。
    pub async fn add_class_member_impl(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> Result<(ClassMember, bool)> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
            joined_at: Set(now),
            ..Default::default()
        };

        let inserted = ClassMembers::insert(model)
            .on_conflict(
                OnConflict::columns([Column::ClassId, Column::StudentId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("加入班级失败: {e}")))?;

        let member = ClassMembers::find()
            .filter(
                Condition::all()
                    .add(Column::ClassId.eq(class_id))
                    .add(Column::StudentId.eq(student_id)),
            )
            .one(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询班级成员失败: {e}")))?
            .ok_or_else(|| ClassHubError::database_operation("加入班级后未找到成员记录"))?;

        Ok((member.into_class_member(), inserted == 0))
    }

    /// 移除班级成员
    pub async fn remove_class_member_impl(&self, class_id: i64, student_id: i64) -> Result<bool> {
        let result = ClassMembers::delete_many()
            .filter(
                Condition::all()
                    .add(Column::ClassId.eq(class_id))
                    .add(Column::StudentId.eq(student_id)),
            )
            .exec(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("移除班级成员失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 查询用户是否为班级成员
    pub async fn is_class_member_impl(&self, class_id: i64, student_id: i64) -> Result<bool> {
        let count = ClassMembers::find()
            .filter(
                Condition::all()
                    .add(Column::ClassId.eq(class_id))
                    .add(Column::StudentId.eq(student_id)),
            )
            .count(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询班级成员失败: {e}")))?;

        Ok(count > 0)
    }

    /// 分页列出班级成员（带用户名）
    pub async fn list_class_members_with_pagination_impl(
        &self,
        class_id: i64,
        query: MemberListQuery,
    ) -> Result<ClassMemberListResponse> {
        let page = query.pagination.page.max(1) as u64;
        let size = query.pagination.size.clamp(1, 100) as u64;

        let select = ClassMembers::find()
            .filter(Column::ClassId.eq(class_id))
            .find_also_related(Users)
            .order_by_asc(Column::JoinedAt);

        // 分页查询
        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询成员总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询成员页数失败: {e}")))?;

        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询成员列表失败: {e}")))?;

        let items = rows
            .into_iter()
            .map(|(member, user)| {
                let member = member.into_class_member();
                ClassMemberItem {
                    student_id: member.student_id,
                    username: user.map(|u| u.username).unwrap_or_default(),
                    joined_at: member.joined_at,
                }
            })
            .collect();

        Ok(ClassMemberListResponse {
            items,
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, seed_user};
    use crate::models::class_members::requests::MemberListQuery;
    use crate::models::classes::requests::CreateClassRequest;

    async fn setup_class(storage: &super::SeaOrmStorage) -> i64 {
        seed_user(storage, 1, "teacher_wang", "teacher").await;
        seed_user(storage, 2, "student_zhang", "student").await;
        seed_user(storage, 3, "student_li", "student").await;
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
    async fn test_add_member_is_idempotent() {
        let storage = memory_storage().await;
        let class_id = setup_class(&storage).await;

        let (first, already) = storage.add_class_member_impl(class_id, 2).await.unwrap();
        assert!(!already);

        // 重复加入返回同一条记录，不报错
        let (second, already) = storage.add_class_member_impl(class_id, 2).await.unwrap();
        assert!(already);
        assert_eq!(first.id, second.id);

        let list = storage
            .list_class_members_with_pagination_impl(class_id, MemberListQuery::default())
            .await
            .unwrap();
        assert_eq!(list.pagination.total, 1);
    }

    #[tokio::test]
    async fn test_remove_member() {
        let storage = memory_storage().await;
        let class_id = setup_class(&storage).await;

        storage.add_class_member_impl(class_id, 2).await.unwrap();
        assert!(storage.is_class_member_impl(class_id, 2).await.unwrap());

        assert!(storage.remove_class_member_impl(class_id, 2).await.unwrap());
        assert!(!storage.is_class_member_impl(class_id, 2).await.unwrap());

        // 再次移除返回 false
        assert!(!storage.remove_class_member_impl(class_id, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_members_includes_username() {
        let storage = memory_storage().await;
        let class_id = setup_class(&storage).await;

        storage.add_class_member_impl(class_id, 2).await.unwrap();
        storage.add_class_member_impl(class_id, 3).await.unwrap();

        let list = storage
            .list_class_members_with_pagination_impl(class_id, MemberListQuery::default())
            .await
            .unwrap();
        assert_eq!(list.items.len(), 2);
        let usernames: Vec<_> = list.items.iter().map(|m| m.username.as_str()).collect();
        assert!(usernames.contains(&"student_zhang"));
        assert!(usernames.contains(&"student_li"));
    }
}
