//! 引脚驱动能力
//!
//! 核心逻辑只依赖三个操作: 配置输出、设置电平、读取输出电平。
//! 引脚配置是启动时构造一次的不可变值，按引用传给驱动，不需要全局可变状态。
//!
//! - `OutputDriver`: 驱动能力 trait
//! - `PinDriver`: 基于 embedded-hal `StatefulOutputPin` 的通用实现
//! - `esp`: ESP32-S3 适配 (feature = "esp32s3")

use core::cell::RefCell;
use core::convert::Infallible;
use core::fmt;

use critical_section::Mutex;
use embedded_hal::digital::{PinState, StatefulOutputPin};

use crate::error::Error;
use crate::util::log::*;

#[cfg(feature = "esp32s3")]
pub mod esp;

/// ESP32-S3 最大 GPIO 编号
pub const MAX_GPIO: u8 = 48;

/// 输出电平
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[inline]
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    #[inline]
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    #[inline]
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "LOW"),
            Level::High => write!(f, "HIGH"),
        }
    }
}

/// 引脚模式 (本系统只用到输出)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Output,
}

/// 引脚中断类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    Disabled,
}

/// 引脚配置
///
/// 对应 ESP-IDF 的 `gpio_config_t`: 输出模式、禁用上下拉、禁用中断、单引脚位掩码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    /// GPIO 编号
    pub pin: u8,
    /// 引脚模式
    pub mode: PinMode,
    /// 上拉使能
    pub pull_up: bool,
    /// 下拉使能
    pub pull_down: bool,
    /// 中断类型
    pub interrupt: InterruptType,
}

impl PinConfig {
    /// 推挽输出，无上下拉，无中断
    pub const fn output(pin: u8) -> Self {
        Self {
            pin,
            mode: PinMode::Output,
            pull_up: false,
            pull_down: false,
            interrupt: InterruptType::Disabled,
        }
    }

    /// 单引脚位掩码
    #[inline]
    pub const fn pin_bit_mask(&self) -> u64 {
        1u64 << self.pin
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), Error> {
        if self.pin > MAX_GPIO {
            return Err(Error::InvalidPin(self.pin));
        }
        Ok(())
    }
}

/// 输出驱动能力
///
/// `set_level` / `output_level` 只需要 `&self`: 写路径由 `ExclusionGuard` 串行化，
/// 读路径不加锁，两者都可以同时持有驱动的共享引用。
pub trait OutputDriver {
    /// 按配置初始化输出引脚
    fn configure_output(&mut self, config: &PinConfig) -> Result<(), Error>;

    /// 设置输出电平
    fn set_level(&self, level: Level);

    /// 读取当前输出电平 (无副作用)
    fn output_level(&self) -> Level;
}

/// 基于 embedded-hal 的通用输出驱动
///
/// 引脚放在 `critical_section::Mutex<RefCell<_>>` 中，每次寄存器访问只占用极短的临界区。
pub struct PinDriver<P> {
    pin_number: u8,
    pin: Mutex<RefCell<P>>,
}

impl<P> PinDriver<P>
where
    P: StatefulOutputPin<Error = Infallible>,
{
    /// 包装一个已拥有的输出引脚
    pub const fn new(pin_number: u8, pin: P) -> Self {
        Self {
            pin_number,
            pin: Mutex::new(RefCell::new(pin)),
        }
    }
}

impl<P> OutputDriver for PinDriver<P>
where
    P: StatefulOutputPin<Error = Infallible>,
{
    fn configure_output(&mut self, config: &PinConfig) -> Result<(), Error> {
        config.validate()?;
        if config.pin != self.pin_number {
            log_error!(
                "Pin config targets GPIO{} but driver owns GPIO{}",
                config.pin,
                self.pin_number
            );
            return Err(Error::InvalidPin(config.pin));
        }
        log_info!(
            "GPIO{} configured as output (mask=0x{:x}, pull_up={}, pull_down={})",
            config.pin,
            config.pin_bit_mask(),
            config.pull_up,
            config.pull_down
        );
        Ok(())
    }

    fn set_level(&self, level: Level) {
        let state = if level.is_high() { PinState::High } else { PinState::Low };
        critical_section::with(|cs| match self.pin.borrow_ref_mut(cs).set_state(state) {
            Ok(()) => {}
            Err(never) => match never {},
        })
    }

    fn output_level(&self) -> Level {
        critical_section::with(|cs| match self.pin.borrow_ref_mut(cs).is_set_high() {
            Ok(high) => Level::from(high),
            Err(never) => match never {},
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorType, OutputPin};

    struct FakePin(bool);

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0 = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0 = true;
            Ok(())
        }
    }

    impl StatefulOutputPin for FakePin {
        fn is_set_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0)
        }

        fn is_set_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0)
        }
    }

    #[test]
    fn test_pin_config_defaults() {
        let config = PinConfig::output(2);
        assert_eq!(config.pin_bit_mask(), 0b100);
        assert!(!config.pull_up);
        assert!(!config.pull_down);
        assert_eq!(config.interrupt, InterruptType::Disabled);
        assert!(config.validate().is_ok());
        assert_eq!(PinConfig::output(49).validate(), Err(Error::InvalidPin(49)));
    }

    #[test]
    fn test_pin_driver_levels() {
        let driver = PinDriver::new(2, FakePin(false));
        assert_eq!(driver.output_level(), Level::Low);
        driver.set_level(Level::High);
        assert_eq!(driver.output_level(), Level::High);
        driver.set_level(Level::Low);
        assert_eq!(driver.output_level(), Level::Low);
    }

    #[test]
    fn test_pin_driver_rejects_foreign_pin() {
        let mut driver = PinDriver::new(2, FakePin(false));
        assert_eq!(driver.configure_output(&PinConfig::output(4)), Err(Error::InvalidPin(4)));
        assert!(driver.configure_output(&PinConfig::output(2)).is_ok());
    }

    #[test]
    fn test_level_display() {
        assert_eq!(std::format!("{}", Level::High), "HIGH");
        assert_eq!(Level::from(false), Level::Low);
    }
}
