use crate::models::PaginatedResponse;
use crate::models::classes::entities::Class;

// 班级列表响应
pub type ClassListResponse = PaginatedResponse<Class>;
