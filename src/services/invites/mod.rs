pub mod get;
pub mod rotate;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::invites::requests::GenerateInviteRequest;
use crate::storage::Storage;

pub struct InviteService {
    storage: Option<Arc<dyn Storage>>,
}

impl InviteService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    /// 使用指定存储构造（测试注入用）
    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            super::storage_from_request(request)
        }
    }

    // 轮换邀请码（撤销旧码并签发新码）
    pub async fn rotate_invite(
        &self,
        req: &HttpRequest,
        class_id: i64,
        params: GenerateInviteRequest,
    ) -> ActixResult<HttpResponse> {
        rotate::rotate_invite(self, req, class_id, params).await
    }

    // 获取班级当前邀请码
    pub async fn get_invite(&self, req: &HttpRequest, class_id: i64) -> ActixResult<HttpResponse> {
        get::get_invite(self, req, class_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classes::requests::CreateClassRequest;
    use crate::models::users::entities::{Identity, UserRole};
    use crate::storage::sea_orm_storage::test_support::{memory_storage, seed_user};
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;

    fn teacher_request() -> actix_web::HttpRequest {
        let req = actix_web::test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(Identity {
            user_id: 1,
            role: UserRole::Teacher,
            request_id: None,
            ip: None,
            user_agent: None,
        });
        req
    }

    async fn setup() -> (Arc<dyn Storage>, i64) {
        let storage = memory_storage().await;
        seed_user(&storage, 1, "teacher_wang", "teacher").await;
        let storage: Arc<dyn Storage> = Arc::new(storage);
        let class = storage
            .create_class(
                1,
                CreateClassRequest {
                    name: "高一(1)班".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        (storage, class.id)
    }

    #[tokio::test]
    async fn test_rotate_defaults_usage_limit() {
        let (storage, class_id) = setup().await;
        let service = InviteService::with_storage(storage.clone());

        // 空请求体走默认限量
        let resp = service
            .rotate_invite(&teacher_request(), class_id, GenerateInviteRequest::default())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let invite = storage.get_active_invite(class_id).await.unwrap().unwrap();
        assert_eq!(invite.usage_limit, Some(30));
    }

    #[tokio::test]
    async fn test_rotate_zero_means_unlimited() {
        let (storage, class_id) = setup().await;
        let service = InviteService::with_storage(storage.clone());

        let params = GenerateInviteRequest {
            usage_limit: Some(0),
            ..Default::default()
        };
        let resp = service
            .rotate_invite(&teacher_request(), class_id, params)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let invite = storage.get_active_invite(class_id).await.unwrap().unwrap();
        assert_eq!(invite.usage_limit, None);
    }
}
