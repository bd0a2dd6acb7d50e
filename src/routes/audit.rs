use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::audit::requests::{AuditExportParams, AuditQueryParams};
use crate::models::users::entities::UserRole;
use crate::services::AuditService;

// 懒加载的全局 AUDIT_SERVICE 实例
static AUDIT_SERVICE: Lazy<AuditService> = Lazy::new(AuditService::new_lazy);

// HTTP处理程序
pub async fn query_logs(
    req: HttpRequest,
    query: web::Query<AuditQueryParams>,
) -> ActixResult<HttpResponse> {
    AUDIT_SERVICE.query_logs(&req, query.into_inner()).await
}

pub async fn export_logs(
    req: HttpRequest,
    query: web::Query<AuditExportParams>,
) -> ActixResult<HttpResponse> {
    AUDIT_SERVICE.export_logs(&req, query.into_inner()).await
}

// 配置路由
pub fn configure_audit_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/audit")
            // 管理员可查全部，教师在服务层进一步限定到自己名下的班级
            .wrap(middlewares::RequireRole::new_any(UserRole::manager_roles()))
            .wrap(middlewares::RequireIdentity)
            .service(web::resource("").route(web::get().to(query_logs)))
            .service(web::resource("/export").route(web::get().to(export_logs))),
    );
}
