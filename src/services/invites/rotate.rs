use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::InviteService;
use crate::middlewares::RequireIdentity;
use crate::models::audit::entities::{AuditAction, AuditResult, NewAuditEntry};
use crate::models::invites::requests::GenerateInviteRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{ensure_class_manageable, record_audit};

/// 请求未指定限用次数时的默认值
const DEFAULT_USAGE_LIMIT: i64 = 30;

pub async fn rotate_invite(
    service: &InviteService,
    request: &HttpRequest,
    class_id: i64,
    params: GenerateInviteRequest,
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

    // 参数校验
    if let Some(limit) = params.usage_limit
        && limit < 0
    {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "usage_limit must be non-negative",
        )));
    }

    // 省略限用次数时取默认值，显式传 0 表示不限量
    let usage_limit = match params.usage_limit {
        None => Some(DEFAULT_USAGE_LIMIT),
        Some(0) => None,
        Some(limit) => Some(limit),
    };
    if let Some(expires_at) = params.expires_at
        && expires_at <= chrono::Utc::now().timestamp_millis()
    {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "expires_at must be in the future",
        )));
    }

    // 所有权校验
    if let Err(resp) = ensure_class_manageable(&storage, &identity, class_id).await {
        record_audit(
            &storage,
            &identity,
            NewAuditEntry::new(
                identity.user_id,
                identity.role.to_string(),
                AuditAction::RotateInvite,
                format!("class:{class_id}"),
                AuditResult::Denied,
            )
            .with_reason("not class owner"),
        )
        .await;
        return Ok(resp);
    }

    match storage
        .rotate_invite(class_id, identity.user_id, usage_limit, params.expires_at)
        .await
    {
        Ok(invite) => {
            info!(
                "Invite rotated for class {} by user {}",
                class_id, identity.user_id
            );
            record_audit(
                &storage,
                &identity,
                NewAuditEntry::new(
                    identity.user_id,
                    identity.role.to_string(),
                    AuditAction::RotateInvite,
                    format!("class:{class_id}"),
                    AuditResult::Success,
                ),
            )
            .await;
            Ok(HttpResponse::Ok()
                .json(ApiResponse::success(invite, "Invite rotated successfully")))
        }
        Err(e) => {
            error!("Invite rotation failed for class {}: {}", class_id, e);
            record_audit(
                &storage,
                &identity,
                NewAuditEntry::new(
                    identity.user_id,
                    identity.role.to_string(),
                    AuditAction::RotateInvite,
                    format!("class:{class_id}"),
                    AuditResult::Fail,
                )
                .with_reason(e.to_string()),
            )
            .await;
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InviteRotateFailed,
                    "Invite rotation failed",
                )),
            )
        }
    }
}
