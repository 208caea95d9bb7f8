//! 空闲功耗钩子
//!
//! 只有在没有任何任务处于 Ready/Running 时才进入浅睡眠:
//! 先设置定时唤醒，再进入低功耗，定时器或其他唤醒源触发后返回。
//! 钩子不触碰互斥锁和输出线。
//!
//! 唤醒定时器设置失败是致命错误: 系统可能再也无法恢复，宁可重启也不能睡死。

use core::convert::Infallible;

use embassy_time::{Duration, Instant};

use crate::config;
use crate::error::{Error, WakeArmError};
use crate::tasks::descriptor::{TaskId, TaskTable};
use crate::util::log::*;

/// 低功耗能力
pub trait LowPowerSleep {
    /// 设置 `quantum` 之后的定时唤醒
    fn arm_timer_wakeup(&mut self, quantum: Duration) -> Result<(), WakeArmError>;

    /// 进入浅睡眠，直到唤醒源触发
    fn enter_light_sleep(&mut self);
}

/// 单次空闲调用的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdleOutcome {
    /// 进入并退出了一次浅睡眠
    Slept,
    /// 仍有任务可运行，未睡眠
    Busy(TaskId),
}

/// 空闲钩子
pub struct IdlePowerHook<S> {
    sleeper: S,
    sleep_quantum: Duration,
    sleeps: u64,
}

impl<S: LowPowerSleep> IdlePowerHook<S> {
    pub const fn new(sleeper: S, sleep_quantum: Duration) -> Self {
        Self {
            sleeper,
            sleep_quantum,
            sleeps: 0,
        }
    }

    /// 使用默认睡眠时长 (500μs)
    pub const fn with_default_quantum(sleeper: S) -> Self {
        Self::new(sleeper, Duration::from_micros(config::IDLE_SLEEP_QUANTUM_US))
    }

    /// 累计睡眠次数
    #[inline]
    pub fn sleeps(&self) -> u64 {
        self.sleeps
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// 空闲路径调用一次
    pub fn on_idle<const N: usize>(&mut self, tasks: &TaskTable<N>) -> Result<IdleOutcome, Error> {
        self.on_idle_at(tasks, Instant::now())
    }

    /// 以给定时刻判断是否空闲
    pub fn on_idle_at<const N: usize>(
        &mut self,
        tasks: &TaskTable<N>,
        now: Instant,
    ) -> Result<IdleOutcome, Error> {
        if let Some(task) = tasks.highest_runnable(now) {
            return Ok(IdleOutcome::Busy(task.id()));
        }

        log_trace!("idle: entering sleep for {}us", self.sleep_quantum.as_micros());
        self.sleeper.arm_timer_wakeup(self.sleep_quantum)?;
        self.sleeper.enter_light_sleep();
        self.sleeps += 1;
        Ok(IdleOutcome::Slept)
    }

    /// 空闲循环，永不返回
    ///
    /// 运行在最低优先级 (thread mode) 执行器上: 只要任何中断执行器有任务就绪，
    /// 这里就会被抢占，因此执行到这里时所有任务都已阻塞。
    pub async fn run<const N: usize>(mut self, tasks: &TaskTable<N>) -> Infallible {
        log_info!("idle: hook registered, quantum {}us", self.sleep_quantum.as_micros());
        loop {
            if let Err(e) = self.on_idle(tasks) {
                log_error!("idle: fatal {}", e);
                panic!("idle hook could not arm wake timer: {}", e);
            }
            embassy_futures::yield_now().await;
        }
    }
}
