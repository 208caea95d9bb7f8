//! 忙等 + 协作延时
//!
//! 两个阶段必须保持分离:
//! 1. 忙等: 在 tick 时钟越过 `now + spin` 之前自旋计数，占用 CPU、不让出，
//!    但可以被更高优先级的执行器抢占
//! 2. 协作延时: 挂起任务直到名义周期的剩余部分耗尽，调度器可以运行低优先级任务或空闲钩子
//!
//! 名义周期只记在 `TaskDescriptor` 上，协作延时 = 周期 - 忙等时长。
//!
//! 不能合并成一次 `Timer::after(period)`: 写任务之间的优先级顺序依赖忙等阶段。

use embassy_time::{Duration, Instant, Timer};

use crate::tasks::descriptor::TaskDescriptor;
use crate::util::log::*;

/// 混合计时器
#[derive(Debug, Clone, Copy)]
pub struct ActiveWaitTimer {
    spin: Duration,
    report_every: u32,
}

impl ActiveWaitTimer {
    /// `report_every` 为 0 时不输出忙等诊断
    pub const fn new(spin: Duration, report_every: u32) -> Self {
        Self { spin, report_every }
    }

    /// 周期中忙等之后剩下的部分，忙等超过周期时为 0
    #[inline]
    pub fn rest_of_period(&self, task: &TaskDescriptor) -> Duration {
        task.period().checked_sub(self.spin).unwrap_or(Duration::from_ticks(0))
    }

    /// 忙等阶段，返回自旋次数
    ///
    /// 不是挂起点: 调用期间任务保持 Running。
    pub fn spin(&self, label: &str) -> u32 {
        let start = Instant::now();
        let deadline = start + self.spin;
        log_debug!("{}: tick count before active wait: 0x{:x}", label, start.as_ticks());

        let mut counter: u32 = 0;
        loop {
            counter = counter.wrapping_add(1);
            if self.report_every != 0 && counter % self.report_every == 0 {
                log_debug!("{}: busy waiting", label);
            }
            if Instant::now() >= deadline {
                break;
            }
            core::hint::spin_loop();
        }

        log_debug!("{}: tick count after active wait: 0x{:x}", label, Instant::now().as_ticks());
        counter
    }

    /// 协作延时阶段
    pub async fn rest(&self, task: &TaskDescriptor) {
        let deadline = Instant::now() + self.rest_of_period(task);
        task.block_until(deadline);
        Timer::at(deadline).await;
        task.mark_running();
    }

    /// 完整的一次等待: 先忙等，再让出
    pub async fn wait(&self, task: &TaskDescriptor) -> u32 {
        let spins = self.spin(task.name());
        self.rest(task).await;
        spins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::descriptor::{TaskId, TaskState};
    use embassy_futures::block_on;

    #[test]
    fn test_spin_consumes_interval() {
        let timer = ActiveWaitTimer::new(Duration::from_millis(20), 1_000);
        let start = Instant::now();
        let spins = timer.spin("test");
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert!(spins > 0);
    }

    #[test]
    fn test_wait_blocks_then_resumes() {
        let task = TaskDescriptor::new(TaskId(0), "raiser", 10, Duration::from_millis(30));
        let timer = ActiveWaitTimer::new(Duration::from_millis(10), 0);
        assert_eq!(timer.rest_of_period(&task), Duration::from_millis(20));

        let start = Instant::now();
        block_on(timer.wait(&task));
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert_eq!(task.state(), TaskState::Running);
    }

    #[test]
    fn test_rest_saturates_when_spin_exceeds_period() {
        let task = TaskDescriptor::new(TaskId(0), "raiser", 10, Duration::from_millis(5));
        let timer = ActiveWaitTimer::new(Duration::from_millis(10), 0);
        assert_eq!(timer.rest_of_period(&task), Duration::from_ticks(0));
    }
}
