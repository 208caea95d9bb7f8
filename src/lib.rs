//! gpio-mutex - 基于优先级调度的共享 GPIO 输出线
//!
//! 两个写任务 (Raiser / Lowerer) 通过有界等待互斥锁争用同一根输出线，
//! 观察任务不加锁读取其电平，空闲时由 IdlePowerHook 进入浅睡眠。
//!
//! 本库提供以下核心功能:
//! - 有界等待互斥锁 `ExclusionGuard`
//! - 共享输出线 `SharedOutputLine` (加锁写 / 无锁读)
//! - 忙等 + 协作延时的混合计时 `ActiveWaitTimer`
//! - 写任务 / 观察任务 / 空闲钩子
//! - 条件编译日志系统
//!
//! 库本身与硬件无关，硬件适配在 `esp32s3` feature 下提供。

#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod hal;
pub mod sync;
pub mod tasks;
pub mod util;

// ===== 重导出常用类型 =====
pub use error::{Error, LockTimeout, WakeArmError};
pub use hal::{Level, OutputDriver, PinConfig, PinDriver};
pub use sync::guard::{ExclusionGuard, Held};
pub use sync::line::{LineWriter, SharedOutputLine};
pub use tasks::active_wait::ActiveWaitTimer;
pub use tasks::descriptor::{TaskDescriptor, TaskId, TaskState, TaskTable};
pub use tasks::idle::{IdleOutcome, IdlePowerHook, LowPowerSleep};
pub use tasks::observer::{ObserverReading, ObserverTask};
pub use tasks::writer::{MutationOutcome, WriterConfig, WriterCycle, WriterRole, WriterTask};

// ===== 版本信息 =====
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 系统配置常量
///
/// 时间单位统一为 tick (1 tick = 1ms)
pub mod config {
    use embassy_time::Duration;

    /// 系统 Tick 频率 (Hz) - 配置层面的 tick
    pub const TICK_RATE_HZ: u64 = 1_000;

    /// 共享输出引脚 (板载 LED)
    pub const OUTPUT_PIN: u8 = 2;

    /// 启动时输出线的初始电平
    pub const INITIAL_LEVEL: bool = true;

    /// 写任务获取互斥锁的最长等待 (ticks)
    pub const WRITER_LOCK_TIMEOUT_TICKS: u64 = 10;

    /// 忙等阶段时长 (ticks)
    pub const ACTIVE_WAIT_TICKS: u64 = 500;

    /// 协作延时阶段时长 (ticks)
    pub const COOPERATIVE_DELAY_TICKS: u64 = 1_000;

    /// 观察任务周期 (ticks)
    pub const OBSERVER_PERIOD_TICKS: u64 = 1_000;

    /// 空闲钩子单次睡眠时长 (μs)
    pub const IDLE_SLEEP_QUANTUM_US: u64 = 500;

    /// 忙等诊断输出间隔 (自旋次数)
    pub const SPIN_REPORT_INTERVAL: u32 = 400_000;

    /// 名义任务优先级 (数值越大越紧急)
    pub const RAISER_PRIORITY: u8 = 10;
    pub const LOWERER_PRIORITY: u8 = 9;
    pub const OBSERVER_PRIORITY: u8 = 8;

    /// tick 转换为 Duration
    #[inline]
    pub const fn ticks(n: u64) -> Duration {
        Duration::from_millis(n * 1_000 / TICK_RATE_HZ)
    }
}
