use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::class_members::requests::{
    JoinClassRequest, LeaveClassRequest, MemberListQuery,
};
use crate::models::users::entities::UserRole;
use crate::services::ClassMemberService;
use crate::utils::{SafeClassIdI64, SafeStudentIdI64};

// 懒加载的全局 CLASS_MEMBER_SERVICE 实例
static CLASS_MEMBER_SERVICE: Lazy<ClassMemberService> = Lazy::new(ClassMemberService::new_lazy);

// HTTP处理程序
pub async fn join_class(
    req: HttpRequest,
    join_data: web::Json<JoinClassRequest>,
) -> ActixResult<HttpResponse> {
    CLASS_MEMBER_SERVICE
        .join_class(&req, join_data.into_inner())
        .await
}

pub async fn leave_class(
    req: HttpRequest,
    leave_data: web::Json<LeaveClassRequest>,
) -> ActixResult<HttpResponse> {
    CLASS_MEMBER_SERVICE
        .leave_class(&req, leave_data.into_inner())
        .await
}

pub async fn list_members(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    query: web::Query<MemberListQuery>,
) -> ActixResult<HttpResponse> {
    CLASS_MEMBER_SERVICE
        .list_members(&req, class_id.0, query.into_inner())
        .await
}

pub async fn kick_member(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    CLASS_MEMBER_SERVICE
        .kick_member(&req, class_id.0, student_id.0)
        .await
}

// 配置路由
//
// 注意：join / leave 是静态路径，必须在带 {class_id} 参数的scope以及
// /api/v1/classes 总scope之前注册。
pub fn configure_class_members_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes/join")
            // 学生凭邀请码加入班级
            .wrap(middlewares::RequireRole::new(UserRole::Student))
            .wrap(middlewares::RequireIdentity)
            .service(web::resource("").route(web::post().to(join_class))),
    );
    cfg.service(
        web::scope("/api/v1/classes/leave")
            // 学生退出班级
            .wrap(middlewares::RequireRole::new(UserRole::Student))
            .wrap(middlewares::RequireIdentity)
            .service(web::resource("").route(web::post().to(leave_class))),
    );
    cfg.service(
        web::scope("/api/v1/classes/{class_id}/members")
            .wrap(middlewares::RequireRole::new_any(UserRole::manager_roles()))
            .wrap(middlewares::RequireIdentity)
            .service(
                // 班级成员名单
                web::resource("").route(web::get().to(list_members)),
            )
            .service(
                // 移除班级成员
                web::resource("/{student_id}").route(web::delete().to(kick_member)),
            ),
    );
}
