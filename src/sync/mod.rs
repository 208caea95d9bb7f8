//! 同步原语模块
//!
//! 基于 embassy-sync 封装:
//! - `ExclusionGuard`: 有界等待互斥锁，记录当前持有者
//! - `SharedOutputLine`: 加锁写、无锁读的共享输出线
//! - `primitives`: 类型别名与原子计数器

pub mod guard;
pub mod line;
pub mod primitives;

pub use guard::{ExclusionGuard, Held};
pub use line::{LineWriter, SharedOutputLine};
pub use primitives::{AtomicCounter, CriticalMutex};
