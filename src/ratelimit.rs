//! 固定窗口限流器
//!
//! 按"来源 IP + 调用方 ID"的组合键维护 `{窗口起点, 计数}`，窗口过期
//! 后重新计数。作为普通组件注入服务层使用，而不是全局中间件，便于
//! 按操作配置不同阈值，也便于测试中注入时钟。

use dashmap::DashMap;

/// 单个窗口的状态
#[derive(Debug, Clone, Copy)]
struct WindowState {
    window_start: i64,
    count: u32,
}

/// 限流判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// 被拒绝，附带距窗口重置的剩余秒数
    Limited { retry_after_secs: i64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

/// 固定窗口限流器
///
/// 同一 key 在任意一个长度为 `window_secs` 的窗口内最多放行
/// `max_requests` 次。计数在进入新窗口时重置；持续探测不会顺延窗口。
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window_secs: i64,
    windows: DashMap<String, WindowState>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: i64) -> Self {
        Self {
            max_requests,
            window_secs,
            windows: DashMap::new(),
        }
    }

    /// 以当前时间判定并计数
    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, chrono::Utc::now().timestamp())
    }

    /// 以给定时间判定并计数（测试用注入时钟）
    pub fn check_at(&self, key: &str, now_secs: i64) -> RateDecision {
        let mut entry = self.windows.entry(key.to_string()).or_insert(WindowState {
            window_start: now_secs,
            count: 0,
        });

        // 进入新窗口则重置计数
        if now_secs - entry.window_start >= self.window_secs {
            entry.window_start = now_secs;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            // 拒绝不计数，窗口起点保持不变
            let retry_after_secs = entry.window_start + self.window_secs - now_secs;
            return RateDecision::Limited {
                retry_after_secs: retry_after_secs.max(1),
            };
        }

        entry.count += 1;
        RateDecision::Allowed
    }

    /// 清理已过期的窗口，避免长时间运行后内存增长
    pub fn prune(&self, now_secs: i64) {
        self.windows
            .retain(|_, state| now_secs - state.window_start < self.window_secs);
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(5, 60);
        for _ in 0..5 {
            assert!(limiter.check_at("10.0.0.1:1", 1000).is_allowed());
        }
        assert!(!limiter.check_at("10.0.0.1:1", 1000).is_allowed());
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.check_at("10.0.0.1:1", 1000).is_allowed());
        assert!(limiter.check_at("10.0.0.1:1", 1001).is_allowed());
        assert!(!limiter.check_at("10.0.0.1:1", 1002).is_allowed());
        // 窗口结束后恢复放行
        assert!(limiter.check_at("10.0.0.1:1", 1060).is_allowed());
    }

    #[test]
    fn test_rejections_do_not_extend_window() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.check_at("10.0.0.1:1", 1000).is_allowed());
        // 持续探测不会顺延窗口起点
        for t in 1001..1060 {
            assert!(!limiter.check_at("10.0.0.1:1", t).is_allowed());
        }
        assert!(limiter.check_at("10.0.0.1:1", 1060).is_allowed());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.check_at("10.0.0.1:1", 1000).is_allowed());
        assert!(limiter.check_at("10.0.0.1:2", 1000).is_allowed());
        assert!(!limiter.check_at("10.0.0.1:1", 1000).is_allowed());
    }

    #[test]
    fn test_same_user_different_origins_do_not_share_window() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.check_at("10.0.0.1:7", 1000).is_allowed());
        // 同一用户换来源不占用原窗口
        assert!(limiter.check_at("10.0.0.2:7", 1000).is_allowed());
        assert!(!limiter.check_at("10.0.0.1:7", 1000).is_allowed());
    }

    #[test]
    fn test_retry_after() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.check_at("10.0.0.1:1", 1000).is_allowed());
        match limiter.check_at("10.0.0.1:1", 1030) {
            RateDecision::Limited { retry_after_secs } => assert_eq!(retry_after_secs, 30),
            RateDecision::Allowed => panic!("should be limited"),
        }
    }

    #[test]
    fn test_prune_drops_expired_windows() {
        let limiter = RateLimiter::new(1, 60);
        limiter.check_at("10.0.0.1:1", 1000);
        limiter.check_at("10.0.0.1:2", 1050);
        limiter.prune(1065);
        assert_eq!(limiter.tracked_keys(), 1);
    }
}
