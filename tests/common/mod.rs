//! 主机端测试辅助: 记录型驱动、假睡眠器、缩短时序的配置

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use embassy_time::Duration;
use gpio_mutex::{
    Error, Level, LowPowerSleep, OutputDriver, PinConfig, SharedOutputLine, TaskDescriptor, TaskId,
    TaskTable, WakeArmError, WriterConfig, WriterRole, WriterTask,
};

pub const RAISER: TaskId = TaskId(0);
pub const LOWERER: TaskId = TaskId(1);
pub const OBSERVER: TaskId = TaskId(2);

pub const PIN: u8 = 2;
pub const LOCK_TIMEOUT: Duration = Duration::from_millis(10);

/// 记录每次写入，并检测写入是否重叠
#[derive(Default)]
pub struct RecordingDriver {
    level: AtomicBool,
    configured: AtomicBool,
    history: Mutex<Vec<Level>>,
    in_set: AtomicUsize,
    max_concurrent_sets: AtomicUsize,
}

impl RecordingDriver {
    pub fn history(&self) -> Vec<Level> {
        self.history.lock().unwrap().clone()
    }

    pub fn max_concurrent_sets(&self) -> usize {
        self.max_concurrent_sets.load(Ordering::SeqCst)
    }

    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }
}

impl OutputDriver for RecordingDriver {
    fn configure_output(&mut self, config: &PinConfig) -> Result<(), Error> {
        config.validate()?;
        self.configured.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn set_level(&self, level: Level) {
        let concurrent = self.in_set.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_sets.fetch_max(concurrent, Ordering::SeqCst);

        self.level.store(level.is_high(), Ordering::SeqCst);
        self.history.lock().unwrap().push(level);
        // 拉长写入窗口，让重叠更容易暴露
        for _ in 0..1_000 {
            std::hint::spin_loop();
        }

        self.in_set.fetch_sub(1, Ordering::SeqCst);
    }

    fn output_level(&self) -> Level {
        Level::from(self.level.load(Ordering::SeqCst))
    }
}

/// 假睡眠器 - 只计数
#[derive(Default)]
pub struct CountingSleeper {
    armed: AtomicBool,
    pub sleeps: AtomicU32,
}

impl LowPowerSleep for CountingSleeper {
    fn arm_timer_wakeup(&mut self, quantum: Duration) -> Result<(), WakeArmError> {
        if quantum.as_ticks() == 0 {
            return Err(WakeArmError::ZeroQuantum);
        }
        self.armed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn enter_light_sleep(&mut self) {
        assert!(self.armed.swap(false, Ordering::SeqCst), "sleep without armed wake timer");
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn line(initial: Level) -> SharedOutputLine<RecordingDriver> {
    let config = PinConfig::output(PIN);
    SharedOutputLine::init(config, RecordingDriver::default(), initial, LOCK_TIMEOUT).unwrap()
}

pub fn task_table() -> TaskTable<3> {
    TaskTable::new([
        TaskDescriptor::new(RAISER, "raiser", 10, Duration::from_millis(50)),
        TaskDescriptor::new(LOWERER, "lowerer", 9, Duration::from_millis(50)),
        TaskDescriptor::new(OBSERVER, "observer", 8, Duration::from_millis(50)),
    ])
}

/// 缩短后的写任务时序: 周期 50ms 中忙等 20ms，剩余 30ms 协作延时
pub fn writer_config() -> WriterConfig {
    WriterConfig {
        active_wait: Duration::from_millis(20),
        spin_report_interval: 0,
    }
}

/// 按角色在任务表中取描述符，使用缩短后的时序
pub fn writer<'a>(
    role: WriterRole,
    line: &'a SharedOutputLine<RecordingDriver>,
    tasks: &'a TaskTable<3>,
) -> WriterTask<'a, RecordingDriver> {
    let id = match role {
        WriterRole::Raiser => RAISER,
        WriterRole::Lowerer => LOWERER,
    };
    WriterTask::new(role, line, tasks.get(id).unwrap(), writer_config())
}
