use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::invites::requests::GenerateInviteRequest;
use crate::models::users::entities::UserRole;
use crate::services::InviteService;
use crate::utils::SafeClassIdI64;

// 懒加载的全局 INVITE_SERVICE 实例
static INVITE_SERVICE: Lazy<InviteService> = Lazy::new(InviteService::new_lazy);

// HTTP处理程序
pub async fn rotate_invite(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    params: web::Json<GenerateInviteRequest>,
) -> ActixResult<HttpResponse> {
    INVITE_SERVICE
        .rotate_invite(&req, class_id.0, params.into_inner())
        .await
}

pub async fn get_invite(req: HttpRequest, class_id: SafeClassIdI64) -> ActixResult<HttpResponse> {
    INVITE_SERVICE.get_invite(&req, class_id.0).await
}

// 配置路由
//
// 注意：必须在 /api/v1/classes 总scope之前注册，否则会被其前缀拦截。
pub fn configure_invites_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes/{class_id}/invite")
            .wrap(middlewares::RequireRole::new_any(UserRole::manager_roles()))
            .wrap(middlewares::RequireIdentity)
            .service(
                web::resource("")
                    // 轮换邀请码：旧码立即失效
                    .route(web::post().to(rotate_invite))
                    // 查看当前活跃邀请码
                    .route(web::get().to(get_invite)),
            ),
    );
}
