//! 路径参数安全提取器
//!
//! 对非法路径参数（非数字、越界）统一返回 400 + ApiResponse 错误体，
//! 避免默认的纯文本错误页。

/// 定义一个按名称提取路径中 i64 参数的提取器
///
/// 用法：`define_safe_i64_extractor!(SafeClassIdI64, "class_id");`
#[macro_export]
macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:expr) => {
        pub struct $name(pub i64);

        impl actix_web::FromRequest for $name {
            type Error = actix_web::Error;
            type Future = std::future::Ready<Result<Self, Self::Error>>;

            fn from_request(
                req: &actix_web::HttpRequest,
                _payload: &mut actix_web::dev::Payload,
            ) -> Self::Future {
                let result = req
                    .match_info()
                    .get($param)
                    .and_then(|raw| raw.parse::<i64>().ok())
                    .filter(|id| *id > 0)
                    .map($name)
                    .ok_or_else(|| {
                        actix_web::error::ErrorBadRequest(serde_json::json!(
                            $crate::models::ApiResponse::error_empty(
                                $crate::models::ErrorCode::BadRequest,
                                format!("Invalid path parameter: {}", $param),
                            )
                        ))
                    });
                std::future::ready(result)
            }
        }
    };
}

define_safe_i64_extractor!(SafeClassIdI64, "class_id");
define_safe_i64_extractor!(SafeStudentIdI64, "student_id");
