pub mod export;
pub mod query;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::audit::requests::{AuditExportParams, AuditQueryParams};
use crate::ratelimit::RateLimiter;
use crate::storage::Storage;

pub struct AuditService {
    storage: Option<Arc<dyn Storage>>,
    query_limiter: Arc<RateLimiter>,
}

impl AuditService {
    pub fn new_lazy() -> Self {
        let rule = &AppConfig::get().rate_limit.audit;
        Self {
            storage: None,
            query_limiter: Arc::new(RateLimiter::new(rule.max_requests, rule.window_secs)),
        }
    }

    /// 使用指定存储与限流器构造（测试注入用）
    pub fn with_parts(storage: Arc<dyn Storage>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            storage: Some(storage),
            query_limiter: limiter,
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            super::storage_from_request(request)
        }
    }

    // 查询审计日志
    pub async fn query_logs(
        &self,
        req: &HttpRequest,
        params: AuditQueryParams,
    ) -> ActixResult<HttpResponse> {
        query::query_logs(self, req, params).await
    }

    // 导出审计日志 CSV
    pub async fn export_logs(
        &self,
        req: &HttpRequest,
        params: AuditExportParams,
    ) -> ActixResult<HttpResponse> {
        export::export_logs(self, req, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{Identity, UserRole};
    use crate::storage::sea_orm_storage::test_support::{memory_storage, seed_user};
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;

    fn request_as(user_id: i64, role: UserRole) -> actix_web::HttpRequest {
        let req = actix_web::test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(Identity {
            user_id,
            role,
            request_id: Some("req-test".to_string()),
            ip: None,
            user_agent: None,
        });
        req
    }

    fn admin_request() -> actix_web::HttpRequest {
        request_as(9, UserRole::Admin)
    }

    #[tokio::test]
    async fn test_query_shares_rate_limit_window() {
        let storage = memory_storage().await;
        seed_user(&storage, 9, "admin_root", "admin").await;
        let storage: Arc<dyn Storage> = Arc::new(storage);
        let service = AuditService::with_parts(storage, Arc::new(RateLimiter::new(1, 60)));

        let resp = service
            .query_logs(&admin_request(), AuditQueryParams::default())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = service
            .query_logs(&admin_request(), AuditQueryParams::default())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_export_all_requires_time_range() {
        let storage = memory_storage().await;
        seed_user(&storage, 9, "admin_root", "admin").await;
        let storage: Arc<dyn Storage> = Arc::new(storage);
        let service = AuditService::with_parts(storage, Arc::new(RateLimiter::new(10, 60)));

        let params = AuditExportParams {
            mode: Some("all".to_string()),
            ..Default::default()
        };
        let resp = service.export_logs(&admin_request(), params).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_teacher_scope_enforced_and_denial_audited() {
        let storage = memory_storage().await;
        seed_user(&storage, 1, "teacher_wang", "teacher").await;
        seed_user(&storage, 2, "teacher_li", "teacher").await;
        let class_id = storage
            .create_class_impl(
                1,
                crate::models::classes::requests::CreateClassRequest {
                    name: "高一(1)班".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap()
            .id;
        let storage: Arc<dyn Storage> = Arc::new(storage);
        let service =
            AuditService::with_parts(storage.clone(), Arc::new(RateLimiter::new(10, 60)));

        // 班主任限定到自己的班级时放行
        let params = AuditQueryParams {
            class_id: Some(class_id),
            ..Default::default()
        };
        let resp = service
            .query_logs(&request_as(1, UserRole::Teacher), params)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // 不带班级、或查别人的班级都拒绝
        let resp = service
            .query_logs(&request_as(1, UserRole::Teacher), AuditQueryParams::default())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let params = AuditQueryParams {
            class_id: Some(class_id),
            ..Default::default()
        };
        let resp = service
            .query_logs(&request_as(2, UserRole::Teacher), params)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        // 拒绝本身也会留下审计记录
        let filters = crate::models::audit::requests::AuditLogFilters {
            result: Some("denied".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.count_audit_logs(filters).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_query_rejects_bad_action() {
        let storage = memory_storage().await;
        seed_user(&storage, 9, "admin_root", "admin").await;
        let storage: Arc<dyn Storage> = Arc::new(storage);
        let service = AuditService::with_parts(storage, Arc::new(RateLimiter::new(10, 60)));

        let params = AuditQueryParams {
            action: Some("DROP_TABLE".to_string()),
            ..Default::default()
        };
        let resp = service.query_logs(&admin_request(), params).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
