use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::ClassMemberService;
use crate::middlewares::RequireIdentity;
use crate::models::class_members::requests::MemberListQuery;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::ensure_class_manageable;

pub async fn list_members(
    service: &ClassMemberService,
    request: &HttpRequest,
    class_id: i64,
    query: MemberListQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let identity = match RequireIdentity::extract_identity(request) {
        Some(identity) => identity,
        None => {
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                ErrorCode::Unauthorized,
                "Unauthorized: missing identity",
            )));
        }
    };

    // 成员名单只对班级管理者可见
    if let Err(resp) = ensure_class_manageable(&storage, &identity, class_id).await {
        return Ok(resp);
    }

    match storage
        .list_class_members_with_pagination(class_id, query)
        .await
    {
        Ok(response) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Members retrieved")))
        }
        Err(e) => {
            error!("Failed to list members of class {}: {}", class_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to list members",
                )),
            )
        }
    }
}
