//! gpio-mutex 固件入口
//!
//! 三个任务共享 GPIO2:
//! - Raiser (P3 中断执行器): 加锁拉高，忙等 500ms，延时 1s
//! - Lowerer (P2 中断执行器): 加锁拉低，忙等 500ms，延时 1s
//! - Observer (P1 中断执行器): 无锁读取并报告电平，周期 1s
//!
//! thread mode 执行器只运行空闲循环: 只有所有中断执行器都无事可做时
//! 才会执行到这里，此时由 IdlePowerHook 进入 500μs 浅睡眠。
//!
//! 硬件目标: ESP32-S3 (Xtensa LX7 @ 240MHz)

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use esp_hal::{
    clock::CpuClock,
    gpio::Output,
    interrupt::{software::SoftwareInterruptControl, Priority},
    rtc_cntl::Rtc,
    timer::timg::TimerGroup,
};
use esp_rtos::embassy::InterruptExecutor;
use static_cell::StaticCell;

use gpio_mutex::{
    config,
    hal::esp::{self, EspLightSleep, EspOutputDriver},
    IdlePowerHook, Level, ObserverTask, PinConfig, PinDriver, SharedOutputLine,
    TaskDescriptor, TaskId, TaskTable, WriterConfig, WriterRole, WriterTask,
};

// ===== 条件编译日志 =====
#[allow(unused_imports)]
use gpio_mutex::util::log::*;

#[cfg(feature = "log-defmt")]
use defmt_rtt as _;

// ===== Panic Handler =====
#[cfg(any(feature = "dev", feature = "log-println"))]
use esp_backtrace as _;

/// 发布版本: 致命错误直接重启，不能停在死循环里
#[cfg(not(any(feature = "dev", feature = "log-println")))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    esp_hal::system::software_reset()
}

esp_bootloader_esp_idf::esp_app_desc!();

// ===== 任务表 =====
const RAISER: TaskId = TaskId(0);
const LOWERER: TaskId = TaskId(1);
const OBSERVER: TaskId = TaskId(2);

/// 写任务周期 = 忙等 + 协作延时；协作延时由周期和 `WriterConfig::active_wait` 推出
const WRITER_PERIOD: embassy_time::Duration =
    config::ticks(config::ACTIVE_WAIT_TICKS + config::COOPERATIVE_DELAY_TICKS);

static TASKS: TaskTable<3> = TaskTable::new([
    TaskDescriptor::new(
        RAISER,
        WriterRole::Raiser.name(),
        WriterRole::Raiser.priority(),
        WRITER_PERIOD,
    ),
    TaskDescriptor::new(
        LOWERER,
        WriterRole::Lowerer.name(),
        WriterRole::Lowerer.priority(),
        WRITER_PERIOD,
    ),
    TaskDescriptor::new(
        OBSERVER,
        "observer",
        config::OBSERVER_PRIORITY,
        config::ticks(config::OBSERVER_PERIOD_TICKS),
    ),
]);

/// 引脚配置 - 启动时构造一次，之后只读
static PIN_CONFIG: PinConfig = PinConfig::output(config::OUTPUT_PIN);

// ===== 静态分配 =====
static LINE: StaticCell<SharedOutputLine<EspOutputDriver>> = StaticCell::new();

/// Raiser 执行器
static HIGH_PRIO_EXECUTOR: StaticCell<InterruptExecutor<2>> = StaticCell::new();

/// Lowerer 执行器
static MID_PRIO_EXECUTOR: StaticCell<InterruptExecutor<1>> = StaticCell::new();

/// Observer 执行器
static LOW_PRIO_EXECUTOR: StaticCell<InterruptExecutor<3>> = StaticCell::new();

type Line = SharedOutputLine<EspOutputDriver>;

#[embassy_executor::task(pool_size = 2)]
async fn writer_task(task: WriterTask<'static, EspOutputDriver>) {
    match task.run().await {}
}

#[embassy_executor::task]
async fn observer_task(task: ObserverTask<'static, EspOutputDriver>) {
    match task.run().await {}
}

fn task(id: TaskId) -> &'static TaskDescriptor {
    match TASKS.get(id) {
        Some(task) => task,
        None => panic!("task {} missing from task table", id.0),
    }
}

// ===== 主入口点 =====
#[esp_rtos::main]
async fn main(_spawner: Spawner) {
    // ========================================
    // 1. 硬件初始化
    // ========================================
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));
    esp_alloc::heap_allocator!(size: 64 * 1024);

    log_info!("{} {} starting on ESP32-S3", gpio_mutex::NAME, gpio_mutex::VERSION);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_ints = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0);

    log_info!("esp-rtos started");

    // ========================================
    // 2. GPIO 配置 + 互斥锁 + 初始电平
    // ========================================
    let initial = Level::from(config::INITIAL_LEVEL);
    let output = Output::new(
        peripherals.GPIO2,
        esp::initial_level(initial),
        esp::output_config(&PIN_CONFIG),
    );
    let driver = PinDriver::new(PIN_CONFIG.pin, output);
    let line: &'static Line = match SharedOutputLine::init(
        PIN_CONFIG,
        driver,
        initial,
        config::ticks(config::WRITER_LOCK_TIMEOUT_TICKS),
    ) {
        Ok(line) => LINE.init(line),
        Err(e) => {
            log_error!("GPIO configuration failed: {}", e);
            panic!("GPIO configuration failed: {}", e);
        }
    };

    // ========================================
    // 3. 任务注册: Raiser > Lowerer > Observer
    // ========================================
    let high_prio_executor =
        HIGH_PRIO_EXECUTOR.init(InterruptExecutor::new(sw_ints.software_interrupt2));
    let high_prio_spawner = high_prio_executor.start(Priority::Priority3);
    high_prio_spawner.must_spawn(writer_task(WriterTask::new(
        WriterRole::Raiser,
        line,
        task(RAISER),
        WriterConfig::DEFAULT,
    )));
    log_info!("raiser spawned (Priority3)");

    let mid_prio_executor =
        MID_PRIO_EXECUTOR.init(InterruptExecutor::new(sw_ints.software_interrupt1));
    let mid_prio_spawner = mid_prio_executor.start(Priority::Priority2);
    mid_prio_spawner.must_spawn(writer_task(WriterTask::new(
        WriterRole::Lowerer,
        line,
        task(LOWERER),
        WriterConfig::DEFAULT,
    )));
    log_info!("lowerer spawned (Priority2)");

    let low_prio_executor =
        LOW_PRIO_EXECUTOR.init(InterruptExecutor::new(sw_ints.software_interrupt3));
    let low_prio_spawner = low_prio_executor.start(Priority::Priority1);
    low_prio_spawner.must_spawn(observer_task(ObserverTask::new(line, task(OBSERVER))));
    log_info!("observer spawned (Priority1)");

    // ========================================
    // 4. 空闲钩子 - thread mode 只剩空闲循环
    // ========================================
    let sleeper = EspLightSleep::new(Rtc::new(peripherals.LPWR));
    let hook = IdlePowerHook::with_default_quantum(sleeper);

    log_info!("All tasks spawned, handing over to the idle loop");
    match hook.run(&TASKS).await {}
}
