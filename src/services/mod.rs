pub mod audit;
pub mod class_members;
pub mod classes;
pub mod invites;

pub use audit::AuditService;
pub use class_members::ClassMemberService;
pub use classes::ClassService;
pub use invites::InviteService;

use std::sync::Arc;

use actix_web::HttpRequest;
use tracing::error;

use actix_web::HttpResponse;

use crate::models::audit::entities::NewAuditEntry;
use crate::models::classes::entities::Class;
use crate::models::users::entities::{Identity, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// 从应用数据中取存储实例
pub(crate) fn storage_from_request(request: &HttpRequest) -> Arc<dyn Storage> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .expect("Storage not found in app data")
        .get_ref()
        .clone()
}

/// 尽力写入审计日志
///
/// 审计落库失败不能影响业务操作本身，只记录错误日志。
pub(crate) async fn record_audit(storage: &Arc<dyn Storage>, identity: &Identity, entry: NewAuditEntry) {
    let entry = entry.with_context(
        identity.request_id.clone(),
        identity.ip.clone(),
        identity.user_agent.clone(),
    );
    if let Err(e) = storage.append_audit_log(entry).await {
        error!("审计日志写入失败: {}", e);
    }
}

/// 校验请求方是否有权管理指定班级
///
/// 管理员或班级创建教师放行；班级不存在返回 404，无权限返回 403。
pub(crate) async fn ensure_class_manageable(
    storage: &Arc<dyn Storage>,
    identity: &Identity,
    class_id: i64,
) -> Result<Class, HttpResponse> {
    let class = match storage.get_class_by_id(class_id).await {
        Ok(Some(class)) => class,
        Ok(None) => {
            return Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ClassNotFound,
                "Class not found",
            )));
        }
        Err(e) => {
            error!("Failed to get class {}: {}", class_id, e);
            return Err(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to get class",
                )),
            );
        }
    };

    if identity.role != UserRole::Admin && class.teacher_id != identity.user_id {
        return Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::ClassPermissionDenied,
            "You are not the owner of this class",
        )));
    }

    Ok(class)
}
