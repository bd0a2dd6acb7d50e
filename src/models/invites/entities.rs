use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// 邀请码状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Active,
    Revoked,
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InviteStatus::Active => write!(f, "active"),
            InviteStatus::Revoked => write!(f, "revoked"),
        }
    }
}

impl FromStr for InviteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(InviteStatus::Active),
            "revoked" => Ok(InviteStatus::Revoked),
            _ => Err(format!("Invalid invite status: {}", s)),
        }
    }
}

// 邀请码信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub code: String,
    pub class_id: i64,
    pub created_by: i64,
    pub status: InviteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    /// 过期时间（毫秒时间戳），None 表示永不过期
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<i64>,
}

impl Invite {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|ts| ts <= now_ms)
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.usage_count >= limit)
    }

    /// 邀请码当前是否可用
    ///
    /// 已撤销 / 已过期 / 已用完都视为不可用，调用方不得区分原因。
    pub fn is_usable(&self, now_ms: i64) -> bool {
        self.status == InviteStatus::Active && !self.is_expired(now_ms) && !self.is_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_invite() -> Invite {
        Invite {
            code: "A2B3C4".to_string(),
            class_id: 1,
            created_by: 10,
            status: InviteStatus::Active,
            usage_limit: None,
            usage_count: 0,
            expires_at: None,
            created_at: 1_700_000_000_000,
            revoked_at: None,
        }
    }

    #[test]
    fn test_active_invite_is_usable() {
        let invite = sample_invite();
        assert!(invite.is_usable(1_700_000_100_000));
    }

    #[test]
    fn test_revoked_invite_is_not_usable() {
        let mut invite = sample_invite();
        invite.status = InviteStatus::Revoked;
        assert!(!invite.is_usable(1_700_000_100_000));
    }

    #[test]
    fn test_expired_invite_is_not_usable() {
        let mut invite = sample_invite();
        invite.expires_at = Some(1_700_000_050_000);
        assert!(!invite.is_usable(1_700_000_100_000));
        // 边界：恰好等于过期时间视为已过期
        assert!(!invite.is_usable(1_700_000_050_000));
        assert!(invite.is_usable(1_700_000_049_999));
    }

    #[test]
    fn test_exhausted_invite_is_not_usable() {
        let mut invite = sample_invite();
        invite.usage_limit = Some(3);
        invite.usage_count = 3;
        assert!(!invite.is_usable(1_700_000_100_000));
        invite.usage_count = 2;
        assert!(invite.is_usable(1_700_000_100_000));
    }

    #[test]
    fn test_zero_limit_invite_never_usable() {
        let mut invite = sample_invite();
        invite.usage_limit = Some(0);
        assert!(!invite.is_usable(1_700_000_100_000));
    }
}
