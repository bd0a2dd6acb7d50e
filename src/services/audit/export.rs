//! 审计日志 CSV 导出
//!
//! 两种模式：
//! - `mode=page`（默认）：单次查询，最多导出配置的页上限行数，整体返回；
//! - `mode=all`：必须给定 from / to 时间范围，按批次流式输出，
//!   总量受配置上限约束，避免一次性把大结果集拉进内存。

use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::AuditService;
use crate::config::AppConfig;
use crate::middlewares::RequireIdentity;
use crate::models::audit::entities::{AuditAction, AuditLogEntry, AuditResult, NewAuditEntry};
use crate::models::audit::requests::{AuditExportParams, AuditLogFilters};
use crate::models::{ApiResponse, ErrorCode};
use crate::ratelimit::RateDecision;
use crate::services::record_audit;
use crate::storage::Storage;

const CSV_HEADER: [&str; 10] = [
    "time",
    "actor_id",
    "actor_role",
    "action",
    "target",
    "result",
    "reason",
    "request_id",
    "ip",
    "user_agent",
];

/// 把一批日志编码为 CSV 字节
fn encode_batch(entries: &[AuditLogEntry], include_header: bool) -> std::io::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    if include_header {
        wtr.write_record(CSV_HEADER)?;
    }

    for entry in entries {
        wtr.write_record([
            entry.timestamp.to_rfc3339().as_str(),
            &entry.actor_id.to_string(),
            &entry.actor_role,
            &entry.action.to_string(),
            &entry.target,
            &entry.result.to_string(),
            entry.reason.as_deref().unwrap_or(""),
            entry.request_id.as_deref().unwrap_or(""),
            entry.ip.as_deref().unwrap_or(""),
            entry.user_agent.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))
}

pub async fn export_logs(
    service: &AuditService,
    request: &HttpRequest,
    params: AuditExportParams,
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

    // 导出与查询共用同一个限流窗口
    if let RateDecision::Limited { retry_after_secs } =
        service.query_limiter.check(&identity.rate_key())
    {
        warn!("Audit export rate limit hit by user {}", identity.user_id);
        return Ok(HttpResponse::TooManyRequests()
            .insert_header(("Retry-After", retry_after_secs.to_string()))
            .json(ApiResponse::error_empty(
                ErrorCode::RateLimitExceeded,
                "Too many audit exports, try again later",
            )));
    }

    let mode = params.mode.as_deref().unwrap_or("page");

    // all 模式必须限定时间范围
    if mode == "all" && (params.from.is_none() || params.to.is_none()) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "mode=all requires both from and to",
        )));
    }

    // 非管理员只能导出自己名下班级的审计
    if let Err(response) = super::query::ensure_audit_scope(
        &storage,
        &identity,
        AuditAction::AuditExport,
        params.class_id,
    )
    .await
    {
        return Ok(response);
    }

    let filters = match super::query::build_filters(
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

    info!(
        "Audit export (mode={}) requested by user {}",
        mode, identity.user_id
    );
    record_audit(
        &storage,
        &identity,
        NewAuditEntry::new(
            identity.user_id,
            identity.role.to_string(),
            AuditAction::AuditExport,
            "audit_logs",
            AuditResult::Success,
        )
        .with_reason(format!("mode={mode}")),
    )
    .await;

    match mode {
        "all" => export_streaming(storage, filters),
        _ => export_page(storage, filters, params.limit, params.offset).await,
    }
}

/// page 模式：单次查询并整体返回
async fn export_page(
    storage: Arc<dyn Storage>,
    filters: AuditLogFilters,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ActixResult<HttpResponse> {
    let page_limit = AppConfig::get().audit.export_page_limit;
    let limit = limit.unwrap_or(page_limit).clamp(1, page_limit);
    let offset = offset.unwrap_or(0).max(0);

    let entries = match storage.list_audit_logs(filters, limit, offset, true).await {
        Ok(entries) => entries,
        Err(e) => {
            error!("Audit export failed: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::AuditExportFailed,
                    "Audit export failed",
                )),
            );
        }
    };

    let data = encode_batch(&entries, true).map_err(|e| {
        error!("CSV 生成失败: {}", e);
        actix_web::error::ErrorInternalServerError(format!("CSV 生成失败: {e}"))
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"audit_logs.csv\"",
        ))
        .body(data))
}

/// all 模式：按批次流式输出
fn export_streaming(
    storage: Arc<dyn Storage>,
    filters: AuditLogFilters,
) -> ActixResult<HttpResponse> {
    let audit_config = &AppConfig::get().audit;
    let batch_size = audit_config.export_batch_size;
    let max_rows = audit_config.export_max_rows;

    struct StreamState {
        storage: Arc<dyn Storage>,
        filters: AuditLogFilters,
        offset: i64,
        exported: i64,
        header_sent: bool,
        done: bool,
    }

    let state = StreamState {
        storage,
        filters,
        offset: 0,
        exported: 0,
        header_sent: false,
        done: false,
    };

    let stream = futures_util::stream::try_unfold(state, move |mut state| async move {
        if state.done {
            return Ok::<_, actix_web::Error>(None);
        }

        let remaining = (max_rows - state.exported).min(batch_size);
        if remaining <= 0 {
            return Ok(None);
        }

        let entries = state
            .storage
            .list_audit_logs(state.filters.clone(), remaining, state.offset, true)
            .await
            .map_err(|e| {
                error!("Audit export batch failed: {}", e);
                actix_web::error::ErrorInternalServerError("Audit export failed")
            })?;

        let fetched = entries.len() as i64;
        if fetched < remaining {
            state.done = true;
        }

        // 最后一批可能为空，仍需确保表头已输出
        if fetched == 0 && state.header_sent {
            return Ok(None);
        }

        let include_header = !state.header_sent;
        let data = encode_batch(&entries, include_header).map_err(|e| {
            error!("CSV 生成失败: {}", e);
            actix_web::error::ErrorInternalServerError("Audit export failed")
        })?;

        state.header_sent = true;
        state.offset += fetched;
        state.exported += fetched;

        Ok(Some((Bytes::from(data), state)))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"audit_logs.csv\"",
        ))
        .streaming(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::entities::{AuditAction, AuditResult};

    fn sample_entry(reason: Option<&str>) -> AuditLogEntry {
        AuditLogEntry {
            id: 1,
            timestamp: chrono::DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            actor_id: 42,
            actor_role: "admin".to_string(),
            action: AuditAction::AuditQuery,
            target: "audit_logs".to_string(),
            result: AuditResult::Success,
            reason: reason.map(str::to_string),
            request_id: Some("req-1".to_string()),
            ip: Some("10.0.0.1".to_string()),
            user_agent: None,
        }
    }

    #[test]
    fn test_encode_batch_with_header() {
        let data = encode_batch(&[sample_entry(None)], true).unwrap();
        let text = String::from_utf8(data).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "time,actor_id,actor_role,action,target,result,reason,request_id,ip,user_agent"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("AUDIT_QUERY"));
        assert!(row.contains("42"));
    }

    #[test]
    fn test_encode_batch_escapes_fields() {
        // 含逗号和引号的字段必须被正确转义
        let data = encode_batch(&[sample_entry(Some("bad, \"input\""))], false).unwrap();
        let text = String::from_utf8(data).unwrap();
        assert!(text.contains("\"bad, \"\"input\"\"\""));
    }

    #[test]
    fn test_encode_empty_batch_header_only() {
        let data = encode_batch(&[], true).unwrap();
        let text = String::from_utf8(data).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
