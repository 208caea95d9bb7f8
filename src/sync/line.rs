//! 共享输出线
//!
//! 写路径: `acquire` 拿到 `LineWriter` 后才能 `set`，写入总在锁内完成。
//! 读路径: `get` 直接读驱动的输出电平，不经过 `ExclusionGuard`。
//! 读可能与并发写竞争，读到的是"最终可见"的值，这对状态显示已经足够，
//! 不要给读路径加锁。

use embassy_time::Duration;

use crate::error::{Error, LockTimeout};
use crate::hal::{Level, OutputDriver, PinConfig};
use crate::sync::guard::{ExclusionGuard, Held};
use crate::sync::primitives::AtomicCounter;
use crate::tasks::descriptor::TaskId;
use crate::util::log::*;

/// 由互斥锁保护的单根输出线
pub struct SharedOutputLine<D> {
    config: PinConfig,
    driver: D,
    guard: ExclusionGuard,
    mutations: AtomicCounter,
}

impl<D: OutputDriver> SharedOutputLine<D> {
    /// 启动序列: 配置驱动 -> 构造未锁定的互斥锁 -> 设置初始电平
    pub fn init(
        config: PinConfig,
        mut driver: D,
        initial: Level,
        wait_timeout: Duration,
    ) -> Result<Self, Error> {
        driver.configure_output(&config)?;
        let guard = ExclusionGuard::new(wait_timeout);
        driver.set_level(initial);
        log_info!("GPIO{} initial level {}", config.pin, initial);
        Ok(Self {
            config,
            driver,
            guard,
            mutations: AtomicCounter::new(),
        })
    }

    /// 在 `wait_timeout` 内获取写权限
    pub async fn acquire(&self, who: TaskId) -> Result<LineWriter<'_, D>, LockTimeout> {
        let held = self.guard.acquire(who).await?;
        Ok(LineWriter { line: self, held })
    }

    /// 无锁读取当前电平
    #[inline]
    pub fn get(&self) -> Level {
        self.driver.output_level()
    }

    /// 引脚编号
    #[inline]
    pub fn pin(&self) -> u8 {
        self.config.pin
    }

    /// 底层驱动
    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// 互斥锁
    #[inline]
    pub fn guard(&self) -> &ExclusionGuard {
        &self.guard
    }

    /// 锁内写入次数
    pub fn mutations(&self) -> u64 {
        self.mutations.get()
    }
}

/// 写权限 - 只能由 `SharedOutputLine::acquire` 产生
pub struct LineWriter<'a, D> {
    line: &'a SharedOutputLine<D>,
    held: Held<'a>,
}

impl<D: OutputDriver> LineWriter<'_, D> {
    /// 设置输出电平
    pub fn set(&mut self, level: Level) {
        debug_assert_eq!(self.line.guard.held_by(), Some(self.held.holder()));
        self.line.driver.set_level(level);
        self.line.mutations.increment();
        log_trace!("GPIO{} <- {} (task {})", self.line.config.pin, level, self.held.holder().0);
    }

    /// 持有者
    #[inline]
    pub fn holder(&self) -> TaskId {
        self.held.holder()
    }

    /// 释放写权限
    pub fn release(self) {
        self.held.release();
    }
}
