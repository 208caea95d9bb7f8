//! 错误类型
//!
//! 运行期只有两类错误:
//! - `LockTimeout`: 有界等待超时，由写任务就地处理 (跳过本周期的写入)
//! - `WakeArmFailure`: 空闲钩子无法设置唤醒定时器，属于致命错误
//!
//! `InvalidPin` 只可能出现在启动阶段的引脚配置中。

use core::fmt;

/// 互斥锁获取超时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LockTimeout;

impl fmt::Display for LockTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lock acquisition timed out")
    }
}

/// 唤醒定时器设置失败的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeArmError {
    /// 睡眠时长为 0，定时器永远不会触发
    ZeroQuantum,
    /// 睡眠时长超出 RTC 定时器范围
    QuantumOutOfRange,
}

impl fmt::Display for WakeArmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroQuantum => write!(f, "Wake timer quantum is zero"),
            Self::QuantumOutOfRange => write!(f, "Wake timer quantum out of range"),
        }
    }
}

/// 系统错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// 有界等待超时
    LockTimeout,
    /// 唤醒定时器设置失败 (致命)
    WakeArmFailure(WakeArmError),
    /// 引脚编号无效
    InvalidPin(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LockTimeout => write!(f, "Lock acquisition timed out"),
            Self::WakeArmFailure(e) => write!(f, "Wake arm failure: {}", e),
            Self::InvalidPin(pin) => write!(f, "Invalid GPIO pin {}", pin),
        }
    }
}

impl From<LockTimeout> for Error {
    fn from(_: LockTimeout) -> Self {
        Self::LockTimeout
    }
}

impl From<WakeArmError> for Error {
    fn from(e: WakeArmError) -> Self {
        Self::WakeArmFailure(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        assert_eq!(Error::from(LockTimeout), Error::LockTimeout);
        assert_eq!(
            Error::from(WakeArmError::ZeroQuantum),
            Error::WakeArmFailure(WakeArmError::ZeroQuantum)
        );
    }

    #[test]
    fn test_error_display() {
        let msg = std::format!("{}", Error::WakeArmFailure(WakeArmError::QuantumOutOfRange));
        assert_eq!(msg, "Wake arm failure: Wake timer quantum out of range");
        assert_eq!(std::format!("{}", Error::InvalidPin(60)), "Invalid GPIO pin 60");
    }
}
