pub mod audit;
pub mod class_members;
pub mod classes;
pub mod common;
pub mod invites;
pub mod users;

pub use common::pagination::{PaginatedResponse, PaginationInfo, PaginationQuery};
pub use common::response::ApiResponse;

/// API 业务错误码
///
/// 与 HTTP 状态码配合使用：HTTP 状态表达大类，业务码表达具体原因。
/// 注意：无效 / 过期 / 用完的邀请码统一使用 `InviteCodeInvalid`，
/// 不区分具体原因（防枚举攻击）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 4000,
    Unauthorized = 4001,
    Forbidden = 4003,
    NotFound = 4004,
    RateLimitExceeded = 4029,
    InternalServerError = 5000,

    // 班级相关
    ClassCreationFailed = 5001,
    ClassAlreadyExists = 5002,
    ClassPermissionDenied = 5003,
    ClassNotFound = 5004,

    // 邀请码与成员相关
    InviteCodeInvalid = 5101,
    InviteRotateFailed = 5102,
    ClassJoinFailed = 5103,
    ClassLeaveFailed = 5104,
    MemberRemoveFailed = 5105,

    // 审计相关
    AuditQueryFailed = 5201,
    AuditExportFailed = 5202,
}

/// 程序启动时间（用于统计启动耗时）
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
