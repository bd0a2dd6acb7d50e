use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::ClassMemberService;
use crate::middlewares::RequireIdentity;
use crate::models::audit::entities::{AuditAction, AuditResult, NewAuditEntry};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{ensure_class_manageable, record_audit};

pub async fn kick_member(
    service: &ClassMemberService,
    request: &HttpRequest,
    class_id: i64,
    student_id: i64,
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

    let target = format!("class:{class_id}:student:{student_id}");

    // 所有权校验
    if let Err(resp) = ensure_class_manageable(&storage, &identity, class_id).await {
        record_audit(
            &storage,
            &identity,
            NewAuditEntry::new(
                identity.user_id,
                identity.role.to_string(),
                AuditAction::KickMember,
                target,
                AuditResult::Denied,
            )
            .with_reason("not class owner"),
        )
        .await;
        return Ok(resp);
    }

    match storage.remove_class_member(class_id, student_id).await {
        Ok(true) => {
            info!(
                "Student {} removed from class {} by user {}",
                student_id, class_id, identity.user_id
            );
            record_audit(
                &storage,
                &identity,
                NewAuditEntry::new(
                    identity.user_id,
                    identity.role.to_string(),
                    AuditAction::KickMember,
                    target,
                    AuditResult::Success,
                ),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Member removed successfully")))
        }
        // 重复移除视为幂等成功
        Ok(false) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success_empty("Student is not a member of this class"))),
        Err(e) => {
            error!(
                "Failed to remove student {} from class {}: {}",
                student_id, class_id, e
            );
            record_audit(
                &storage,
                &identity,
                NewAuditEntry::new(
                    identity.user_id,
                    identity.role.to_string(),
                    AuditAction::KickMember,
                    target,
                    AuditResult::Fail,
                )
                .with_reason(e.to_string()),
            )
            .await;
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::MemberRemoveFailed,
                    "Failed to remove member",
                )),
            )
        }
    }
}
