//! ESP32-S3 硬件适配
//!
//! - `EspOutputDriver`: esp-hal `Output` 上的输出驱动
//! - `EspLightSleep`: RTC 定时器唤醒的浅睡眠

use esp_hal::gpio::{DriveMode, Output, OutputConfig, Pull};
use esp_hal::rtc_cntl::sleep::TimerWakeupSource;
use esp_hal::rtc_cntl::Rtc;

use crate::error::WakeArmError;
use crate::hal::{Level, PinConfig, PinDriver};
use crate::tasks::idle::LowPowerSleep;
use crate::util::log::*;

/// ESP32-S3 输出驱动
pub type EspOutputDriver = PinDriver<Output<'static>>;

/// RTC 定时器允许的最长睡眠 (μs)
pub const MAX_WAKE_QUANTUM_US: u64 = 3_600_000_000;

/// 把引脚配置翻译成 esp-hal 的输出配置
pub fn output_config(config: &PinConfig) -> OutputConfig {
    let pull = match (config.pull_up, config.pull_down) {
        (true, _) => Pull::Up,
        (false, true) => Pull::Down,
        (false, false) => Pull::None,
    };
    OutputConfig::default()
        .with_drive_mode(DriveMode::PushPull)
        .with_pull(pull)
}

/// esp-hal 电平转换
pub fn initial_level(level: Level) -> esp_hal::gpio::Level {
    if level.is_high() {
        esp_hal::gpio::Level::High
    } else {
        esp_hal::gpio::Level::Low
    }
}

/// 浅睡眠 (light sleep)
///
/// 每次进入前必须先 `arm_timer_wakeup`，否则不会进入睡眠。
pub struct EspLightSleep {
    rtc: Rtc<'static>,
    wake: Option<TimerWakeupSource>,
}

impl EspLightSleep {
    pub fn new(rtc: Rtc<'static>) -> Self {
        Self { rtc, wake: None }
    }
}

impl LowPowerSleep for EspLightSleep {
    fn arm_timer_wakeup(&mut self, quantum: embassy_time::Duration) -> Result<(), WakeArmError> {
        let us = quantum.as_micros();
        if us == 0 {
            return Err(WakeArmError::ZeroQuantum);
        }
        if us > MAX_WAKE_QUANTUM_US {
            return Err(WakeArmError::QuantumOutOfRange);
        }
        self.wake = Some(TimerWakeupSource::new(core::time::Duration::from_micros(us)));
        Ok(())
    }

    fn enter_light_sleep(&mut self) {
        match self.wake.take() {
            Some(timer) => self.rtc.sleep_light(&[&timer]),
            None => log_warn!("Light sleep requested without an armed wake timer"),
        }
    }
}
