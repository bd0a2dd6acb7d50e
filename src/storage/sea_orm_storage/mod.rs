//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod audit_logs;
mod class_members;
mod classes;
mod invites;
mod users;

use crate::config::AppConfig;
use crate::errors::{ClassHubError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config.database.pool_size, config.database.timeout)
                .await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| ClassHubError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| ClassHubError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| ClassHubError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| ClassHubError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(ClassHubError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use crate::models::{
    audit::{
        entities::{AuditLogEntry, NewAuditEntry},
        requests::AuditLogFilters,
    },
    class_members::{
        entities::ClassMember,
        requests::MemberListQuery,
        responses::ClassMemberListResponse,
    },
    classes::{
        entities::Class,
        requests::{ClassListQuery, CreateClassRequest},
        responses::ClassListResponse,
    },
    invites::entities::Invite,
    users::entities::{User, UserRole},
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn count_users(&self) -> Result<i64> {
        self.count_users_impl().await
    }

    async fn create_user(&self, username: &str, role: UserRole) -> Result<User> {
        self.create_user_impl(username, role).await
    }

    // 班级模块
    async fn create_class(&self, teacher_id: i64, class: CreateClassRequest) -> Result<Class> {
        self.create_class_impl(teacher_id, class).await
    }

    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>> {
        self.get_class_by_id_impl(class_id).await
    }

    async fn get_class_by_name(&self, name: &str) -> Result<Option<Class>> {
        self.get_class_by_name_impl(name).await
    }

    async fn list_classes_with_pagination(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse> {
        self.list_classes_with_pagination_impl(query).await
    }

    // 邀请码模块
    async fn rotate_invite(
        &self,
        class_id: i64,
        created_by: i64,
        usage_limit: Option<i64>,
        expires_at: Option<i64>,
    ) -> Result<Invite> {
        self.rotate_invite_impl(class_id, created_by, usage_limit, expires_at)
            .await
    }

    async fn get_active_invite(&self, class_id: i64) -> Result<Option<Invite>> {
        self.get_active_invite_impl(class_id).await
    }

    async fn verify_invite(&self, code: &str) -> Result<Option<Invite>> {
        self.verify_invite_impl(code).await
    }

    async fn consume_invite(&self, code: &str) -> Result<bool> {
        self.consume_invite_impl(code).await
    }

    // 班级成员模块
    async fn add_class_member(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> Result<(ClassMember, bool)> {
        self.add_class_member_impl(class_id, student_id).await
    }

    async fn remove_class_member(&self, class_id: i64, student_id: i64) -> Result<bool> {
        self.remove_class_member_impl(class_id, student_id).await
    }

    async fn is_class_member(&self, class_id: i64, student_id: i64) -> Result<bool> {
        self.is_class_member_impl(class_id, student_id).await
    }

    async fn list_class_members_with_pagination(
        &self,
        class_id: i64,
        query: MemberListQuery,
    ) -> Result<ClassMemberListResponse> {
        self.list_class_members_with_pagination_impl(class_id, query)
            .await
    }

    // 审计模块
    async fn append_audit_log(&self, entry: NewAuditEntry) -> Result<AuditLogEntry> {
        self.append_audit_log_impl(entry).await
    }

    async fn list_audit_logs(
        &self,
        filters: AuditLogFilters,
        limit: i64,
        offset: i64,
        ascending: bool,
    ) -> Result<Vec<AuditLogEntry>> {
        self.list_audit_logs_impl(filters, limit, offset, ascending)
            .await
    }

    async fn count_audit_logs(&self, filters: AuditLogFilters) -> Result<i64> {
        self.count_audit_logs_impl(filters).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// 建立单连接内存 SQLite 存储并跑迁移
    ///
    /// 内存库按连接隔离，必须限制连接池为 1。
    pub async fn memory_storage() -> SeaOrmStorage {
        let db = SeaOrmStorage::connect_sqlite("sqlite::memory:", 1, 5)
            .await
            .expect("connect in-memory sqlite");
        Migrator::up(&db, None).await.expect("run migrations");
        SeaOrmStorage { db }
    }

    /// 插入一个测试用户
    pub async fn seed_user(storage: &SeaOrmStorage, id: i64, username: &str, role: &str) {
        use crate::entity::users;
        use sea_orm::{ActiveModelTrait, Set};

        let now = chrono::Utc::now().timestamp();
        users::ActiveModel {
            id: Set(id),
            username: Set(username.to_string()),
            role: Set(role.to_string()),
            status: Set("active".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&storage.db)
        .await
        .expect("seed user");
    }
}
