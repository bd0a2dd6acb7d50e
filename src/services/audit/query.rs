//! 审计日志查询

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::{error, warn};

use super::AuditService;
use crate::middlewares::RequireIdentity;
use crate::models::audit::entities::{AuditAction, AuditResult, NewAuditEntry};
use crate::models::audit::requests::{AuditLogFilters, AuditQueryParams};
use crate::models::audit::responses::AuditLogListResponse;
use crate::models::users::entities::{Identity, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::ratelimit::RateDecision;
use crate::services::record_audit;
use crate::storage::Storage;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

/// 校验并规整过滤参数
///
/// action / actor_role / result 值非法直接报 400，避免静默返回空结果。
#[allow(clippy::too_many_arguments)]
pub(super) fn build_filters(
    from: Option<i64>,
    to: Option<i64>,
    class_id: Option<i64>,
    actor_id: Option<i64>,
    actor_role: Option<String>,
    action: Option<String>,
    target: Option<String>,
    result: Option<String>,
) -> Result<AuditLogFilters, String> {
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err("from must not be greater than to".to_string());
    }

    let actor_role = match actor_role {
        Some(raw) => {
            let parsed = raw
                .trim()
                .parse::<UserRole>()
                .map_err(|_| format!("Unknown actor_role: {raw}"))?;
            Some(parsed.to_string())
        }
        None => None,
    };

    let action = match action {
        Some(raw) => {
            let normalized = raw.trim().to_uppercase();
            let parsed = normalized
                .parse::<AuditAction>()
                .map_err(|_| format!("Unknown action: {raw}"))?;
            Some(parsed.to_string())
        }
        None => None,
    };

    let result = match result {
        Some(raw) => {
            let parsed = raw
                .trim()
                .parse::<AuditResult>()
                .map_err(|_| format!("Unknown result: {raw}"))?;
            Some(parsed.to_string())
        }
        None => None,
    };

    Ok(AuditLogFilters {
        from,
        to,
        class_id,
        actor_id,
        actor_role,
        action,
        target: target.filter(|t| !t.trim().is_empty()),
        result,
    })
}

/// 解析排序方向，返回是否升序
pub(super) fn parse_order(order: Option<&str>) -> Result<bool, String> {
    match order.map(|o| o.trim().to_lowercase()) {
        None => Ok(false),
        Some(o) if o == "desc" || o.is_empty() => Ok(false),
        Some(o) if o == "asc" => Ok(true),
        Some(o) => Err(format!("Unknown order: {o}")),
    }
}

/// 审计访问的范围校验
///
/// 管理员可查全部；教师必须限定到自己名下的班级。
/// 拒绝本身会被写入审计（审计接口属于安全敏感端点）。
pub(super) async fn ensure_audit_scope(
    storage: &Arc<dyn Storage>,
    identity: &Identity,
    action: AuditAction,
    class_id: Option<i64>,
) -> Result<(), HttpResponse> {
    if identity.role == UserRole::Admin {
        return Ok(());
    }

    let deny = |reason: &str| {
        (
            reason.to_string(),
            HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::Forbidden,
                "Forbidden",
            )),
        )
    };

    let denial = match class_id {
        None => Some(deny("class_id is required for non-admin audit access")),
        Some(class_id) => match storage.get_class_by_id(class_id).await {
            Ok(Some(class)) if class.teacher_id == identity.user_id => None,
            Ok(_) => Some(deny("not the owner of the requested class")),
            Err(e) => {
                error!("Failed to get class {} for audit scope check: {}", class_id, e);
                return Err(HttpResponse::InternalServerError().json(
                    ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        "Failed to verify audit scope",
                    ),
                ));
            }
        },
    };

    if let Some((reason, response)) = denial {
        record_audit(
            storage,
            identity,
            NewAuditEntry::new(
                identity.user_id,
                identity.role.to_string(),
                action,
                "audit_logs",
                AuditResult::Denied,
            )
            .with_reason(reason),
        )
        .await;
        return Err(response);
    }

    Ok(())
}

pub async fn query_logs(
    service: &AuditService,
    request: &HttpRequest,
    params: AuditQueryParams,
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

    // 限流：审计查询按"来源 + 调用方"组合键固定窗口
    if let RateDecision::Limited { retry_after_secs } =
        service.query_limiter.check(&identity.rate_key())
    {
        warn!("Audit query rate limit hit by user {}", identity.user_id);
        return Ok(HttpResponse::TooManyRequests()
            .insert_header(("Retry-After", retry_after_secs.to_string()))
            .json(ApiResponse::error_empty(
                ErrorCode::RateLimitExceeded,
                "Too many audit queries, try again later",
            )));
    }

    // 非管理员只能查自己名下班级的审计
    if let Err(response) =
        ensure_audit_scope(&storage, &identity, AuditAction::AuditQuery, params.class_id).await
    {
        return Ok(response);
    }

    let filters = match build_filters(
        params.from,
        params.to,
        params.class_id,
        params.actor_id,
        params.actor_role,
        params.action,
        params.target,
        params.result,
    ) {
        Ok(filters) => filters,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
        }
    };

    let ascending = match parse_order(params.order.as_deref()) {
        Ok(ascending) => ascending,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
        }
    };

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let total = match storage.count_audit_logs(filters.clone()).await {
        Ok(total) => total,
        Err(e) => {
            error!("Failed to count audit logs: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::AuditQueryFailed,
                    "Failed to query audit logs",
                )),
            );
        }
    };

    match storage
        .list_audit_logs(filters, limit, offset, ascending)
        .await
    {
        Ok(items) => {
            record_audit(
                &storage,
                &identity,
                NewAuditEntry::new(
                    identity.user_id,
                    identity.role.to_string(),
                    AuditAction::AuditQuery,
                    "audit_logs",
                    AuditResult::Success,
                ),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                AuditLogListResponse {
                    items,
                    total,
                    limit,
                    offset,
                },
                "Audit logs retrieved",
            )))
        }
        Err(e) => {
            error!("Failed to list audit logs: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::AuditQueryFailed,
                    "Failed to query audit logs",
                )),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filters_normalizes_action() {
        let filters = build_filters(
            None,
            None,
            None,
            None,
            None,
            Some("join_class".to_string()),
            None,
            None,
        )
        .unwrap();
        assert_eq!(filters.action.as_deref(), Some("JOIN_CLASS"));
    }

    #[test]
    fn test_build_filters_rejects_unknown_action() {
        assert!(
            build_filters(
                None,
                None,
                None,
                None,
                None,
                Some("DROP_TABLE".to_string()),
                None,
                None,
            )
            .is_err()
        );
    }

    #[test]
    fn test_build_filters_rejects_inverted_range() {
        assert!(build_filters(Some(2000), Some(1000), None, None, None, None, None, None).is_err());
    }

    #[test]
    fn test_build_filters_normalizes_result() {
        let filters = build_filters(
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            Some("DENIED".to_string()),
        )
        .unwrap();
        assert_eq!(filters.result.as_deref(), Some("denied"));
    }

    #[test]
    fn test_build_filters_normalizes_actor_role() {
        let filters = build_filters(
            None,
            None,
            None,
            None,
            Some("Teacher".to_string()),
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(filters.actor_role.as_deref(), Some("teacher"));

        assert!(
            build_filters(
                None,
                None,
                None,
                None,
                Some("principal".to_string()),
                None,
                None,
                None,
            )
            .is_err()
        );
    }

    #[test]
    fn test_parse_order() {
        assert!(!parse_order(None).unwrap());
        assert!(!parse_order(Some("desc")).unwrap());
        assert!(parse_order(Some("ASC")).unwrap());
        assert!(parse_order(Some("random")).is_err());
    }
}
