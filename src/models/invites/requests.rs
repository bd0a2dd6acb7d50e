use serde::Deserialize;

// 生成（轮换）邀请码请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateInviteRequest {
    /// 最大可用次数，省略时取默认值，0 表示不限
    #[serde(default)]
    pub usage_limit: Option<i64>,
    /// 过期时间（毫秒时间戳），None 表示永不过期
    #[serde(default)]
    pub expires_at: Option<i64>,
}
