pub mod join;
pub mod kick;
pub mod leave;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::class_members::requests::{
    JoinClassRequest, LeaveClassRequest, MemberListQuery,
};
use crate::ratelimit::RateLimiter;
use crate::storage::Storage;

pub struct ClassMemberService {
    storage: Option<Arc<dyn Storage>>,
    join_limiter: Arc<RateLimiter>,
}

impl ClassMemberService {
    pub fn new_lazy() -> Self {
        let rule = &AppConfig::get().rate_limit.join;
        Self {
            storage: None,
            join_limiter: Arc::new(RateLimiter::new(rule.max_requests, rule.window_secs)),
        }
    }

    /// 使用指定存储与限流器构造（测试注入用）
    pub fn with_parts(storage: Arc<dyn Storage>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            storage: Some(storage),
            join_limiter: limiter,
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            super::storage_from_request(request)
        }
    }

    // 凭邀请码加入班级
    pub async fn join_class(
        &self,
        req: &HttpRequest,
        join_data: JoinClassRequest,
    ) -> ActixResult<HttpResponse> {
        join::join_class(self, req, join_data).await
    }

    // 退出班级
    pub async fn leave_class(
        &self,
        req: &HttpRequest,
        leave_data: LeaveClassRequest,
    ) -> ActixResult<HttpResponse> {
        leave::leave_class(self, req, leave_data).await
    }

    // 移除班级成员
    pub async fn kick_member(
        &self,
        req: &HttpRequest,
        class_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        kick::kick_member(self, req, class_id, student_id).await
    }

    // 列出班级成员
    pub async fn list_members(
        &self,
        req: &HttpRequest,
        class_id: i64,
        query: MemberListQuery,
    ) -> ActixResult<HttpResponse> {
        list::list_members(self, req, class_id, query).await
    }
}
