/*!
 * 可信头身份中间件
 *
 * 本服务部署在受信网关之后，网关完成认证并注入 `x-user-id` / `x-role`
 * 请求头。此中间件解析这些头，校验用户存在且处于激活状态，并把
 * `Identity` 放入请求扩展供后续处理程序使用。
 *
 * 角色来源规则：
 * - 默认以数据库中的角色为准；
 * - 仅当配置 `app.allow_role_override` 开启且请求携带 `x-role` 时，
 *   才采用头中的角色（用于网关侧已做角色决策的部署）。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * web::scope("/api/v1/classes")
 *     .wrap(middlewares::RequireIdentity)
 *     .route("", web::post().to(create_class))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::models::users::entities::{Identity, UserRole, UserStatus};
use crate::storage::Storage;

use super::create_error_response;

const USER_ID_HEADER: &str = "x-user-id";
const ROLE_HEADER: &str = "x-role";
const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct RequireIdentity;

fn header_str<'a>(req: &'a ServiceRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|h| h.to_str().ok())
}

// 辅助函数：解析可信头并装配身份
async fn resolve_identity(req: &ServiceRequest) -> Result<Identity, String> {
    let user_id = header_str(req, USER_ID_HEADER)
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| "Missing or invalid x-user-id header".to_string())?;

    let storage = req
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .expect("Storage not found in app data")
        .get_ref()
        .clone();

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|_| "Failed to retrieve user from storage".to_string())?
        .ok_or_else(|| "User not found".to_string())?;

    if user.status != UserStatus::Active {
        return Err("User is not active".to_string());
    }

    // 角色以数据库为准，仅在显式开启时允许头覆盖
    let mut role = user.role;
    if AppConfig::get().app.allow_role_override
        && let Some(raw) = header_str(req, ROLE_HEADER)
    {
        role = raw
            .parse::<UserRole>()
            .map_err(|_| "Invalid x-role header".to_string())?;
    }

    Ok(Identity {
        user_id,
        role,
        request_id: header_str(req, REQUEST_ID_HEADER).map(str::to_string),
        ip: req
            .connection_info()
            .realip_remote_addr()
            .map(str::to_string),
        user_agent: header_str(req, "user-agent").map(str::to_string),
    })
}

impl<S, B> Transform<S, ServiceRequest> for RequireIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireIdentityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireIdentityMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireIdentityMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireIdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 处理 OPTIONS 请求
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            match resolve_identity(&req).await {
                Ok(identity) => {
                    debug!(
                        "Identity resolved: user {} role {}",
                        identity.user_id, identity.role
                    );
                    req.extensions_mut().insert(identity);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "Identity resolution failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 辅助函数：从请求中提取身份信息
impl RequireIdentity {
    /// 从请求扩展中提取身份
    /// 此函数应该在应用了 RequireIdentity 中间件的路由处理程序中使用
    pub fn extract_identity(req: &actix_web::HttpRequest) -> Option<Identity> {
        req.extensions().get::<Identity>().cloned()
    }

    /// 从请求扩展中提取用户 ID
    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<Identity>().map(|id| id.user_id)
    }

    /// 从请求扩展中提取用户角色
    pub fn extract_user_role(req: &actix_web::HttpRequest) -> Option<UserRole> {
        req.extensions().get::<Identity>().map(|id| id.role)
    }
}
