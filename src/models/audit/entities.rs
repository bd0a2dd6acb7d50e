use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// 审计动作枚举
//
// 落库时使用大写蛇形命名，与导出 CSV 中的值一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "CREATE_CLASS")]
    CreateClass,
    #[serde(rename = "ROTATE_INVITE")]
    RotateInvite,
    #[serde(rename = "JOIN_CLASS")]
    JoinClass,
    #[serde(rename = "LEAVE_CLASS")]
    LeaveClass,
    #[serde(rename = "KICK_MEMBER")]
    KickMember,
    #[serde(rename = "AUDIT_QUERY")]
    AuditQuery,
    #[serde(rename = "AUDIT_EXPORT")]
    AuditExport,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditAction::CreateClass => "CREATE_CLASS",
            AuditAction::RotateInvite => "ROTATE_INVITE",
            AuditAction::JoinClass => "JOIN_CLASS",
            AuditAction::LeaveClass => "LEAVE_CLASS",
            AuditAction::KickMember => "KICK_MEMBER",
            AuditAction::AuditQuery => "AUDIT_QUERY",
            AuditAction::AuditExport => "AUDIT_EXPORT",
            AuditAction::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE_CLASS" => Ok(AuditAction::CreateClass),
            "ROTATE_INVITE" => Ok(AuditAction::RotateInvite),
            "JOIN_CLASS" => Ok(AuditAction::JoinClass),
            "LEAVE_CLASS" => Ok(AuditAction::LeaveClass),
            "KICK_MEMBER" => Ok(AuditAction::KickMember),
            "AUDIT_QUERY" => Ok(AuditAction::AuditQuery),
            "AUDIT_EXPORT" => Ok(AuditAction::AuditExport),
            _ => Err(format!("Invalid audit action: {}", s)),
        }
    }
}

// 审计结果枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditResult {
    Success,
    Fail,
    Denied,
}

impl fmt::Display for AuditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditResult::Success => write!(f, "success"),
            AuditResult::Fail => write!(f, "fail"),
            AuditResult::Denied => write!(f, "denied"),
        }
    }
}

impl FromStr for AuditResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(AuditResult::Success),
            "fail" => Ok(AuditResult::Fail),
            "denied" => Ok(AuditResult::Denied),
            _ => Err(format!("Invalid audit result: {}", s)),
        }
    }
}

// 审计日志条目（查询返回）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub actor_id: i64,
    pub actor_role: String,
    pub action: AuditAction,
    pub target: String,
    pub result: AuditResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// 新审计条目（写入用，id 与 timestamp 由存储层生成）
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: i64,
    pub actor_role: String,
    pub action: AuditAction,
    pub target: String,
    pub result: AuditResult,
    pub reason: Option<String>,
    pub request_id: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditEntry {
    pub fn new(
        actor_id: i64,
        actor_role: impl Into<String>,
        action: AuditAction,
        target: impl Into<String>,
        result: AuditResult,
    ) -> Self {
        Self {
            actor_id,
            actor_role: actor_role.into(),
            action,
            target: target.into(),
            result,
            reason: None,
            request_id: None,
            ip: None,
            user_agent: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// 附加请求上下文（request_id / ip / user_agent）
    pub fn with_context(
        mut self,
        request_id: Option<String>,
        ip: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        self.request_id = request_id;
        self.ip = ip;
        self.user_agent = user_agent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_action_roundtrip() {
        for action in [
            AuditAction::CreateClass,
            AuditAction::RotateInvite,
            AuditAction::JoinClass,
            AuditAction::LeaveClass,
            AuditAction::KickMember,
            AuditAction::AuditQuery,
            AuditAction::AuditExport,
        ] {
            assert_eq!(action.to_string().parse::<AuditAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_audit_result_parse() {
        assert_eq!(
            "success".parse::<AuditResult>().unwrap(),
            AuditResult::Success
        );
        assert_eq!("DENIED".parse::<AuditResult>().unwrap(), AuditResult::Denied);
        assert!("maybe".parse::<AuditResult>().is_err());
    }
}
