//! 同步原语封装
//!
//! 统一使用 CriticalSectionRawMutex，保证在 ESP32-S3 中断执行器之间
//! (不同优先级相互抢占) 的正确性。

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use portable_atomic::{AtomicU64, Ordering};

/// 临界区互斥锁 - 异步互斥访问
///
/// `lock()` 返回的 future 在锁被占用时挂起任务，不会自旋。
pub type CriticalMutex<T> = Mutex<CriticalSectionRawMutex, T>;

/// 原子计数器 - 用于统计
///
/// Xtensa 没有原生 64 位原子指令，由 portable-atomic 通过临界区实现。
pub struct AtomicCounter {
    count: AtomicU64,
}

impl AtomicCounter {
    /// 创建新的计数器
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    /// 增加并返回新值
    #[inline(always)]
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 获取当前值
    #[inline(always)]
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_increment() {
        let counter = AtomicCounter::new();
        assert_eq!(counter.get(), 0);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.get(), 2);
    }
}
