//! 任务模块
//!
//! - `descriptor`: 任务描述符与任务表
//! - `active_wait`: 忙等 + 协作延时
//! - `writer`: Raiser / Lowerer 写任务
//! - `observer`: 无锁读取的观察任务
//! - `idle`: 空闲功耗钩子

pub mod active_wait;
pub mod descriptor;
pub mod idle;
pub mod observer;
pub mod writer;
