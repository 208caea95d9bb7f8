//! 条件编译日志系统
//!
//! 根据 feature 选择不同的日志后端:
//! - `log-defmt`: 使用 defmt (高效二进制日志)
//! - `dev` / `log-println`: 使用 esp-println (文本日志，每条一行)
//! - 默认 (release / 主机端测试): 不输出，参数只做类型检查
//!
//! # 日志级别
//! - `log_error!`: 错误信息
//! - `log_warn!`: 警告信息 (例如锁等待超时)
//! - `log_info!`: 一般信息 (任务入口、引脚电平报告)
//! - `log_debug!`: 调试信息 (循环迭代、忙等诊断)
//! - `log_trace!`: 详细跟踪 (每次写入、每次空闲睡眠)

// ===================================================================
// 后端选择
// ===================================================================

#[cfg(feature = "log-defmt")]
#[doc(hidden)]
#[macro_export]
macro_rules! __log_backend {
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[cfg(all(any(feature = "dev", feature = "log-println"), not(feature = "log-defmt")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __log_backend {
    (error, $($arg:tt)*) => { esp_println::println!("[ERROR] {}", format_args!($($arg)*)) };
    (warn, $($arg:tt)*) => { esp_println::println!("[WARN] {}", format_args!($($arg)*)) };
    (info, $($arg:tt)*) => { esp_println::println!("[INFO] {}", format_args!($($arg)*)) };
    (debug, $($arg:tt)*) => { esp_println::println!("[DEBUG] {}", format_args!($($arg)*)) };
    (trace, $($arg:tt)*) => { esp_println::println!("[TRACE] {}", format_args!($($arg)*)) };
}

#[cfg(not(any(feature = "dev", feature = "log-defmt", feature = "log-println")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __log_backend {
    ($level:ident, $($arg:tt)*) => {{
        if false {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

// ===================================================================
// 日志级别宏
// ===================================================================

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log_backend!(error, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__log_backend!(warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log_backend!(info, $($arg)*) };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log_backend!(debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => { $crate::__log_backend!(trace, $($arg)*) };
}

// ===================================================================
// 便捷重导出
// ===================================================================
#[allow(unused_imports)]
pub use crate::{log_debug, log_error, log_info, log_trace, log_warn};
