//! 凭邀请码加入班级
//!
//! 流程：限流 -> 校验邀请码 -> 幂等检查 -> 原子消耗用量 -> 写入成员。
//! 任何不可用的邀请码（不存在 / 已撤销 / 已过期 / 已用完）返回
//! 同一个错误响应，不向调用方泄露具体原因。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info, warn};

use super::ClassMemberService;
use crate::middlewares::RequireIdentity;
use crate::models::audit::entities::{AuditAction, AuditResult, NewAuditEntry};
use crate::models::class_members::requests::JoinClassRequest;
use crate::models::class_members::responses::JoinClassResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::ratelimit::RateDecision;
use crate::services::record_audit;

/// 邀请码不可用时的统一响应
fn invalid_invite_response() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::InviteCodeInvalid,
        "Invalid invite code",
    ))
}

pub async fn join_class(
    service: &ClassMemberService,
    request: &HttpRequest,
    join_data: JoinClassRequest,
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

    let code = join_data.code.trim().to_uppercase();
    if code.is_empty() || code.len() > 16 {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Invite code is required",
        )));
    }

    // 限流：按"来源 + 学生"组合键固定窗口
    if let RateDecision::Limited { retry_after_secs } =
        service.join_limiter.check(&identity.rate_key())
    {
        warn!("Join rate limit hit by user {}", identity.user_id);
        record_audit(
            &storage,
            &identity,
            NewAuditEntry::new(
                identity.user_id,
                identity.role.to_string(),
                AuditAction::JoinClass,
                format!("invite:{code}"),
                AuditResult::Denied,
            )
            .with_reason("rate limited"),
        )
        .await;
        return Ok(HttpResponse::TooManyRequests()
            .insert_header(("Retry-After", retry_after_secs.to_string()))
            .json(ApiResponse::error_empty(
                ErrorCode::RateLimitExceeded,
                "Too many join attempts, try again later",
            )));
    }

    // 校验邀请码（统一拒绝，不区分原因）
    let invite = match storage.verify_invite(&code).await {
        Ok(Some(invite)) => invite,
        Ok(None) => {
            record_audit(
                &storage,
                &identity,
                NewAuditEntry::new(
                    identity.user_id,
                    identity.role.to_string(),
                    AuditAction::JoinClass,
                    format!("invite:{code}"),
                    AuditResult::Fail,
                )
                .with_reason("invite not usable"),
            )
            .await;
            return Ok(invalid_invite_response());
        }
        Err(e) => {
            error!("Failed to verify invite: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to verify invite",
                )),
            );
        }
    };

    let class = match storage.get_class_by_id(invite.class_id).await {
        Ok(Some(class)) => class,
        Ok(None) => {
            // 班级已被删除而邀请码仍在，按无效码处理
            return Ok(invalid_invite_response());
        }
        Err(e) => {
            error!("Failed to get class {}: {}", invite.class_id, e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to get class",
                )),
            );
        }
    };

    // 幂等：已是成员直接返回成功，不消耗用量
    match storage.is_class_member(class.id, identity.user_id).await {
        Ok(true) => {
            return Ok(HttpResponse::Ok().json(ApiResponse::success(
                JoinClassResponse {
                    class_id: class.id,
                    class_name: class.name,
                    already_member: true,
                },
                "Already a member of this class",
            )));
        }
        Ok(false) => {}
        Err(e) => {
            error!("Failed to check membership: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to check membership",
                )),
            );
        }
    }

    // 原子消耗一次用量；并发下失败视为码已不可用
    match storage.consume_invite(&code).await {
        Ok(true) => {}
        Ok(false) => {
            record_audit(
                &storage,
                &identity,
                NewAuditEntry::new(
                    identity.user_id,
                    identity.role.to_string(),
                    AuditAction::JoinClass,
                    format!("invite:{code}"),
                    AuditResult::Fail,
                )
                .with_reason("invite exhausted"),
            )
            .await;
            return Ok(invalid_invite_response());
        }
        Err(e) => {
            error!("Failed to consume invite: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to consume invite",
                )),
            );
        }
    }

    match storage.add_class_member(class.id, identity.user_id).await {
        Ok((_, already_member)) => {
            info!(
                "User {} joined class {} via invite",
                identity.user_id, class.id
            );
            record_audit(
                &storage,
                &identity,
                NewAuditEntry::new(
                    identity.user_id,
                    identity.role.to_string(),
                    AuditAction::JoinClass,
                    format!("class:{}", class.id),
                    AuditResult::Success,
                ),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                JoinClassResponse {
                    class_id: class.id,
                    class_name: class.name,
                    already_member,
                },
                "Joined class successfully",
            )))
        }
        Err(e) => {
            error!("Failed to join class {}: {}", class.id, e);
            record_audit(
                &storage,
                &identity,
                NewAuditEntry::new(
                    identity.user_id,
                    identity.role.to_string(),
                    AuditAction::JoinClass,
                    format!("class:{}", class.id),
                    AuditResult::Fail,
                )
                .with_reason(e.to_string()),
            )
            .await;
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::ClassJoinFailed,
                    "Failed to join class",
                )),
            )
        }
    }
}
