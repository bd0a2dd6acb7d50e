use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::ClassMemberService;
use crate::middlewares::RequireIdentity;
use crate::models::audit::entities::{AuditAction, AuditResult, NewAuditEntry};
use crate::models::class_members::requests::LeaveClassRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::record_audit;

pub async fn leave_class(
    service: &ClassMemberService,
    request: &HttpRequest,
    leave_data: LeaveClassRequest,
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

    let class_id = leave_data.class_id;

    match storage.remove_class_member(class_id, identity.user_id).await {
        Ok(true) => {
            info!("User {} left class {}", identity.user_id, class_id);
            record_audit(
                &storage,
                &identity,
                NewAuditEntry::new(
                    identity.user_id,
                    identity.role.to_string(),
                    AuditAction::LeaveClass,
                    format!("class:{class_id}"),
                    AuditResult::Success,
                ),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Left class successfully")))
        }
        // 退出不是成员的班级视为幂等成功
        Ok(false) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success_empty("Not a member of this class"))),
        Err(e) => {
            error!("Failed to leave class {}: {}", class_id, e);
            record_audit(
                &storage,
                &identity,
                NewAuditEntry::new(
                    identity.user_id,
                    identity.role.to_string(),
                    AuditAction::LeaveClass,
                    format!("class:{class_id}"),
                    AuditResult::Fail,
                )
                .with_reason(e.to_string()),
            )
            .await;
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::ClassLeaveFailed,
                    "Failed to leave class",
                )),
            )
        }
    }
}
