use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// 用户角色枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
    Admin,
}

impl UserRole {
    /// 具备教学管理权限的角色（建班、换码、踢人）
    pub fn manager_roles() -> &'static [UserRole] {
        &[UserRole::Teacher, UserRole::Admin]
    }

    /// 是否具备教学管理权限
    pub fn can_manage_class(&self) -> bool {
        Self::manager_roles().contains(self)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Student => write!(f, "student"),
            UserRole::Teacher => write!(f, "teacher"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(UserRole::Student),
            "teacher" => Ok(UserRole::Teacher),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

// 自定义反序列化，大小写不敏感
impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// 用户状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Disabled,
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Disabled => write!(f, "disabled"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "disabled" => Ok(UserStatus::Disabled),
            _ => Err(format!("Invalid user status: {}", s)),
        }
    }
}

// 用户信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 请求方身份（由网关注入的可信头解析而来）
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    pub role: UserRole,
    pub request_id: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl Identity {
    /// 限流组合键：来源 IP + 用户 ID
    pub fn rate_key(&self) -> String {
        format!("{}:{}", self.ip.as_deref().unwrap_or("unknown"), self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_parse() {
        assert_eq!("student".parse::<UserRole>().unwrap(), UserRole::Student);
        assert_eq!("Teacher".parse::<UserRole>().unwrap(), UserRole::Teacher);
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("principal".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_rate_key_includes_origin() {
        let identity = Identity {
            user_id: 7,
            role: UserRole::Student,
            request_id: None,
            ip: Some("10.0.0.1".to_string()),
            user_agent: None,
        };
        assert_eq!(identity.rate_key(), "10.0.0.1:7");

        let no_ip = Identity {
            ip: None,
            ..identity
        };
        assert_eq!(no_ip.rate_key(), "unknown:7");
    }

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Admin.can_manage_class());
        assert!(UserRole::Teacher.can_manage_class());
        assert!(!UserRole::Student.can_manage_class());
    }
}
