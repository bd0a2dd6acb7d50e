use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::InviteService;
use crate::middlewares::RequireIdentity;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::ensure_class_manageable;

pub async fn get_invite(
    service: &InviteService,
    request: &HttpRequest,
    class_id: i64,
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

    // 邀请码只对班级管理者可见
    if let Err(resp) = ensure_class_manageable(&storage, &identity, class_id).await {
        return Ok(resp);
    }

    match storage.get_active_invite(class_id).await {
        Ok(Some(invite)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(invite, "Invite retrieved")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::NotFound,
            "No active invite for this class",
        ))),
        Err(e) => {
            error!("Failed to get invite for class {}: {}", class_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to get invite",
                )),
            )
        }
    }
}
