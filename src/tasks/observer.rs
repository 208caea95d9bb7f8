//! 观察任务
//!
//! 优先级低于两个写任务。每个周期无锁读取输出线、报告电平，
//! 然后协作延时到本周期结束 (周期取自任务描述符)。
//! 读到的值可能正处于变化之中，这是有意为之。

use core::convert::Infallible;
use core::fmt;

use embassy_time::{Instant, Timer};

use crate::hal::{Level, OutputDriver};
use crate::sync::line::SharedOutputLine;
use crate::tasks::descriptor::TaskDescriptor;
use crate::util::log::*;

/// 一次读数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ObserverReading {
    pub pin: u8,
    pub level: Level,
}

impl fmt::Display for ObserverReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO pin {} is {}", self.pin, self.level)
    }
}

/// 观察任务
pub struct ObserverTask<'a, D> {
    line: &'a SharedOutputLine<D>,
    task: &'a TaskDescriptor,
}

impl<'a, D: OutputDriver> ObserverTask<'a, D> {
    pub fn new(line: &'a SharedOutputLine<D>, task: &'a TaskDescriptor) -> Self {
        Self { line, task }
    }

    /// 无锁读取
    pub fn read(&self) -> ObserverReading {
        ObserverReading {
            pin: self.line.pin(),
            level: self.line.get(),
        }
    }

    /// 读取 -> 报告 -> 延时到周期结束
    ///
    /// 周期以开始时刻为基准，整个周期不超过一个名义周期。
    pub async fn cycle(&mut self) -> ObserverReading {
        let start = Instant::now();
        self.task.mark_running();
        log_debug!("{}: loop iteration", self.task.name());

        let reading = self.read();
        log_info!("GPIO pin {} is {}", reading.pin, reading.level);

        let deadline = start + self.task.period();
        self.task.block_until(deadline);
        Timer::at(deadline).await;
        self.task.mark_running();

        self.task.record_cycle();
        reading
    }

    /// 任务主体，永不返回
    pub async fn run(mut self) -> Infallible {
        log_info!("{}: entry (priority {})", self.task.name(), self.task.priority());
        loop {
            self.cycle().await;
        }
    }
}
