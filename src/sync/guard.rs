//! 有界等待互斥锁
//!
//! `ExclusionGuard` 仲裁写任务对共享输出线的访问:
//! - 任意时刻至多一个持有者
//! - 获取最多等待 `wait_timeout`，超时返回 `LockTimeout` 而不是无限阻塞
//! - 释放由 `Held` 的所有权表达，未持有时调用 release 在类型上不可能发生
//!
//! 不做优先级继承: 低优先级持有者被抢占时，高优先级等待者只会超时跳过。

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::MutexGuard;
use embassy_time::{with_timeout, Duration};
use portable_atomic::{AtomicU8, Ordering};

use crate::error::LockTimeout;
use crate::sync::primitives::{AtomicCounter, CriticalMutex};
use crate::tasks::descriptor::TaskId;

/// `held_by` 的空值
const NO_HOLDER: u8 = u8::MAX;

/// 有界等待互斥锁
pub struct ExclusionGuard {
    lock: CriticalMutex<()>,
    held_by: AtomicU8,
    wait_timeout: Duration,
    acquisitions: AtomicCounter,
    timeouts: AtomicCounter,
}

impl ExclusionGuard {
    /// 创建处于未锁定状态的互斥锁
    pub const fn new(wait_timeout: Duration) -> Self {
        Self {
            lock: CriticalMutex::new(()),
            held_by: AtomicU8::new(NO_HOLDER),
            wait_timeout,
            acquisitions: AtomicCounter::new(),
            timeouts: AtomicCounter::new(),
        }
    }

    /// 默认的最长等待时间
    #[inline]
    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// 以默认等待上限获取锁
    pub async fn acquire(&self, who: TaskId) -> Result<Held<'_>, LockTimeout> {
        self.acquire_within(who, self.wait_timeout).await
    }

    /// 最多等待 `timeout` 获取锁
    ///
    /// 等待期间任务挂起，调度器可以运行其他任务。
    pub async fn acquire_within(
        &self,
        who: TaskId,
        timeout: Duration,
    ) -> Result<Held<'_>, LockTimeout> {
        if timeout == Duration::from_ticks(0) {
            return self.try_acquire(who);
        }
        match with_timeout(timeout, self.lock.lock()).await {
            Ok(lock) => Ok(self.hold(who, lock)),
            Err(_) => {
                self.timeouts.increment();
                Err(LockTimeout)
            }
        }
    }

    /// 不等待，立即尝试获取锁
    pub fn try_acquire(&self, who: TaskId) -> Result<Held<'_>, LockTimeout> {
        match self.lock.try_lock() {
            Ok(lock) => Ok(self.hold(who, lock)),
            Err(_) => {
                self.timeouts.increment();
                Err(LockTimeout)
            }
        }
    }

    fn hold<'a>(
        &'a self,
        who: TaskId,
        lock: MutexGuard<'a, CriticalSectionRawMutex, ()>,
    ) -> Held<'a> {
        self.held_by.store(who.0, Ordering::Release);
        self.acquisitions.increment();
        Held {
            guard: self,
            holder: who,
            _lock: lock,
        }
    }

    /// 当前持有者
    pub fn held_by(&self) -> Option<TaskId> {
        match self.held_by.load(Ordering::Acquire) {
            NO_HOLDER => None,
            id => Some(TaskId(id)),
        }
    }

    /// 是否被持有
    #[inline]
    pub fn is_held(&self) -> bool {
        self.held_by().is_some()
    }

    /// 成功获取次数
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.get()
    }

    /// 超时次数
    pub fn timeouts(&self) -> u64 {
        self.timeouts.get()
    }
}

/// 持有凭证 - drop 时释放锁
pub struct Held<'a> {
    guard: &'a ExclusionGuard,
    holder: TaskId,
    _lock: MutexGuard<'a, CriticalSectionRawMutex, ()>,
}

impl Held<'_> {
    /// 持有者
    #[inline]
    pub fn holder(&self) -> TaskId {
        self.holder
    }

    /// 显式释放
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Held<'_> {
    fn drop(&mut self) {
        // 先清除持有者，随后字段析构时才真正解锁
        self.guard.held_by.store(NO_HOLDER, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    const RAISER: TaskId = TaskId(0);
    const LOWERER: TaskId = TaskId(1);

    #[test]
    fn test_uncontended_acquire_succeeds() {
        let guard = ExclusionGuard::new(Duration::from_millis(10));
        block_on(async {
            let held = guard.acquire(RAISER).await.unwrap();
            assert_eq!(held.holder(), RAISER);
            assert_eq!(guard.held_by(), Some(RAISER));
            held.release();
        });
        assert_eq!(guard.held_by(), None);
        assert_eq!(guard.acquisitions(), 1);
        assert_eq!(guard.timeouts(), 0);
    }

    #[test]
    fn test_contended_acquire_times_out() {
        let guard = ExclusionGuard::new(Duration::from_millis(10));
        block_on(async {
            let _held = guard.acquire(LOWERER).await.unwrap();
            let start = embassy_time::Instant::now();
            let result = guard.acquire(RAISER).await;
            assert_eq!(result.err(), Some(LockTimeout));
            assert!(start.elapsed() >= Duration::from_millis(10));
            assert_eq!(guard.held_by(), Some(LOWERER));
        });
        assert_eq!(guard.timeouts(), 1);
        assert!(!guard.is_held());
    }

    #[test]
    fn test_zero_timeout_is_try_lock() {
        let guard = ExclusionGuard::new(Duration::from_millis(10));
        let held = guard.try_acquire(LOWERER).unwrap();
        let result = block_on(guard.acquire_within(RAISER, Duration::from_ticks(0)));
        assert!(result.is_err());
        drop(held);
        assert!(guard.try_acquire(RAISER).is_ok());
    }
}
