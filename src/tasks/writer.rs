//! 写任务
//!
//! 两个实例按目标电平区分: Raiser 写高电平，Lowerer 写低电平。
//! 每个周期: 获取锁 -> 写入 -> 释放 (可选) -> 忙等 -> 协作延时，永不退出。
//! 周期长度取自任务描述符，协作延时是周期中忙等之后剩下的部分。
//!
//! 获取锁超时不是错误: 本周期跳过写入，也不在本周期内重试。
//! Raiser 优先级高于 Lowerer，但两者的超时相互独立，
//! Lowerer 的写入落在 Raiser 之后是正常现象。

use core::convert::Infallible;

use embassy_time::{Duration, Instant};

use crate::config;
use crate::hal::{Level, OutputDriver};
use crate::sync::line::SharedOutputLine;
use crate::tasks::active_wait::ActiveWaitTimer;
use crate::tasks::descriptor::TaskDescriptor;
use crate::util::log::*;

/// 写任务角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriterRole {
    /// 把输出线拉高
    Raiser,
    /// 把输出线拉低
    Lowerer,
}

impl WriterRole {
    /// 本角色写入的电平
    #[inline]
    pub fn target_level(self) -> Level {
        match self {
            WriterRole::Raiser => Level::High,
            WriterRole::Lowerer => Level::Low,
        }
    }

    /// 名义优先级
    pub const fn priority(self) -> u8 {
        match self {
            WriterRole::Raiser => config::RAISER_PRIORITY,
            WriterRole::Lowerer => config::LOWERER_PRIORITY,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            WriterRole::Raiser => "raiser",
            WriterRole::Lowerer => "lowerer",
        }
    }
}

/// 写任务时序配置
#[derive(Debug, Clone, Copy)]
pub struct WriterConfig {
    /// 忙等阶段
    pub active_wait: Duration,
    /// 忙等诊断间隔 (自旋次数)
    pub spin_report_interval: u32,
}

impl WriterConfig {
    pub const DEFAULT: Self = Self {
        active_wait: config::ticks(config::ACTIVE_WAIT_TICKS),
        spin_report_interval: config::SPIN_REPORT_INTERVAL,
    };
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 单周期内写入的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MutationOutcome {
    /// 拿到锁并写入了该电平
    Applied(Level),
    /// 锁等待超时，本周期未写入
    Skipped,
}

/// 单周期报告
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterCycle {
    pub outcome: MutationOutcome,
    /// 忙等阶段的自旋次数
    pub spins: u32,
    /// 忙等 + 协作延时的实际耗时
    pub waited: Duration,
}

/// 写任务
pub struct WriterTask<'a, D> {
    role: WriterRole,
    line: &'a SharedOutputLine<D>,
    task: &'a TaskDescriptor,
    timer: ActiveWaitTimer,
}

impl<'a, D: OutputDriver> WriterTask<'a, D> {
    pub fn new(
        role: WriterRole,
        line: &'a SharedOutputLine<D>,
        task: &'a TaskDescriptor,
        config: WriterConfig,
    ) -> Self {
        Self {
            role,
            line,
            task,
            timer: ActiveWaitTimer::new(config.active_wait, config.spin_report_interval),
        }
    }

    /// 执行一个完整周期
    pub async fn cycle(&mut self) -> WriterCycle {
        self.task.mark_running();
        log_debug!("{}: loop iteration", self.task.name());

        let outcome = self.mutate().await;
        let started = Instant::now();
        let spins = self.timer.wait(self.task).await;
        let waited = started.elapsed();

        self.task.record_cycle();
        WriterCycle {
            outcome,
            spins,
            waited,
        }
    }

    /// 获取锁 -> 写入 -> 释放；超时则跳过
    async fn mutate(&self) -> MutationOutcome {
        let target = self.role.target_level();

        // 有界等待也是挂起点
        self.task.block_until(Instant::now() + self.line.guard().wait_timeout());
        let acquired = self.line.acquire(self.task.id()).await;
        self.task.mark_running();

        match acquired {
            Ok(mut writer) => {
                writer.set(target);
                writer.release();
                log_debug!("{}: lock acquired, line set {}", self.task.name(), target);
                MutationOutcome::Applied(target)
            }
            Err(_) => {
                let skipped = self.task.record_skip();
                log_warn!(
                    "{}: lock timeout, skipping mutation (skipped {} so far)",
                    self.task.name(),
                    skipped
                );
                MutationOutcome::Skipped
            }
        }
    }

    /// 任务主体，永不返回
    pub async fn run(mut self) -> Infallible {
        log_info!(
            "{}: entry (priority {}, target {})",
            self.task.name(),
            self.task.priority(),
            self.role.target_level()
        );
        loop {
            self.cycle().await;
        }
    }
}
