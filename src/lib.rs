//! ClassHub - 班级邀请与审计子系统后端服务
//!
//! 基于 Actix Web 构建的班级邀请码生命周期与审计日志后端。
//!
//! # 架构
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: 身份与授权中间件
//! - `models`: 数据模型定义
//! - `ratelimit`: 固定窗口限流器（可注入组件）
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod config;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod ratelimit;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
