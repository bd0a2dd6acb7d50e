//! 班级存储操作

use super::SeaOrmStorage;
use crate::entity::classes::{ActiveModel, Column, Entity as Classes};
use crate::errors::{ClassHubError, Result};
use crate::utils::escape_like_pattern;
use crate::models::{
    PaginationInfo,
    classes::{
        entities::Class,
        requests::{ClassListQuery, CreateClassRequest},
        responses::ClassListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 创建班级
    pub async fn create_class_impl(
        &self,
        teacher_id: i64,
        req: CreateClassRequest,
    ) -> Result<Class> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            teacher_id: Set(teacher_id),
            name: Set(req.name),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("创建班级失败: {e}")))?;

        Ok(result.into_class())
    }

    /// 通过 ID 获取班级
    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询班级失败: {e}")))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 通过名称获取班级
    pub async fn get_class_by_name_impl(&self, name: &str) -> Result<Option<Class>> {
        let result = Classes::find()
            .filter(Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询班级失败: {e}")))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 分页列出班级
    pub async fn list_classes_with_pagination_impl(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse> {
        let page = query.pagination.page.max(1) as u64;
        let size = query.pagination.size.clamp(1, 100) as u64;

        let mut select = Classes::find();

        // 教师筛选
        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        // 名称模糊搜索
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(Column::Name.contains(&escaped));
        }

        // 排序
        select = select.order_by_desc(Column::CreatedAt);

        // 分页查询
        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询班级总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询班级页数失败: {e}")))?;

        let classes = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("查询班级列表失败: {e}")))?;

        Ok(ClassListResponse {
            items: classes.into_iter().map(|m| m.into_class()).collect(),
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
    use crate::models::classes::requests::{ClassListQuery, CreateClassRequest};

    #[tokio::test]
    async fn test_create_and_get_class() {
        let storage = memory_storage().await;
        seed_user(&storage, 1, "teacher_wang", "teacher").await;

        let class = storage
            .create_class_impl(
                1,
                CreateClassRequest {
                    name: "高一(3)班".to_string(),
                    description: Some("物理重点班".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(class.teacher_id, 1);
        assert_eq!(class.name, "高一(3)班");

        let found = storage.get_class_by_id_impl(class.id).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().name, "高一(3)班");

        let by_name = storage.get_class_by_name_impl("高一(3)班").await.unwrap();
        assert!(by_name.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_class_name_rejected() {
        let storage = memory_storage().await;
        seed_user(&storage, 1, "teacher_wang", "teacher").await;

        let req = CreateClassRequest {
            name: "高二(1)班".to_string(),
            description: None,
        };
        storage.create_class_impl(1, req.clone()).await.unwrap();
        assert!(storage.create_class_impl(1, req).await.is_err());
    }

    #[tokio::test]
    async fn test_list_classes_filter_by_teacher() {
        let storage = memory_storage().await;
        seed_user(&storage, 1, "teacher_wang", "teacher").await;
        seed_user(&storage, 2, "teacher_li", "teacher").await;

        for (teacher_id, name) in [(1, "班级A"), (1, "班级B"), (2, "班级C")] {
            storage
                .create_class_impl(
                    teacher_id,
                    CreateClassRequest {
                        name: name.to_string(),
                        description: None,
                    },
                )
                .await
                .unwrap();
        }

        let all = storage
            .list_classes_with_pagination_impl(ClassListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 3);

        let mine = storage
            .list_classes_with_pagination_impl(ClassListQuery {
                teacher_id: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_list_classes_search_by_name() {
        let storage = memory_storage().await;
        seed_user(&storage, 1, "teacher_wang", "teacher").await;

        for name in ["高一(1)班", "高一(2)班", "高二(1)班"] {
            storage
                .create_class_impl(
                    1,
                    CreateClassRequest {
                        name: name.to_string(),
                        description: None,
                    },
                )
                .await
                .unwrap();
        }

        let hits = storage
            .list_classes_with_pagination_impl(ClassListQuery {
                search: Some("高一".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.pagination.total, 2);

        // 通配符按字面处理
        let none = storage
            .list_classes_with_pagination_impl(ClassListQuery {
                search: Some("%".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(none.pagination.total, 0);
    }
}
