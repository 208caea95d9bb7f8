//! 任务描述符
//!
//! 调度器持有的任务表。任务本身是 embassy 的 async 任务，描述符只记录
//! 名称、名义优先级、周期和运行状态，供空闲钩子判断"是否还有就绪任务"。
//!
//! 阻塞状态附带唤醒截止时间: 截止时间已过的 Blocked 任务视为 Ready，
//! 即使执行器还没来得及轮询它。

use embassy_time::{Duration, Instant};
use portable_atomic::{AtomicU64, AtomicU8, Ordering};

use crate::sync::primitives::AtomicCounter;

/// 任务句柄 (任务表下标)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(pub u8);

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TaskState {
    Ready = 0,
    Running = 1,
    Blocked = 2,
    Suspended = 3,
}

impl TaskState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => TaskState::Ready,
            1 => TaskState::Running,
            2 => TaskState::Blocked,
            _ => TaskState::Suspended,
        }
    }
}

/// 任务描述符
pub struct TaskDescriptor {
    id: TaskId,
    name: &'static str,
    priority: u8,
    period: Duration,
    state: AtomicU8,
    /// 阻塞截止时间 (embassy tick)
    wake_at: AtomicU64,
    cycles: AtomicCounter,
    skips: AtomicCounter,
}

impl TaskDescriptor {
    /// 新建描述符，初始为 Ready
    pub const fn new(id: TaskId, name: &'static str, priority: u8, period: Duration) -> Self {
        Self {
            id,
            name,
            priority,
            period,
            state: AtomicU8::new(TaskState::Ready as u8),
            wake_at: AtomicU64::new(0),
            cycles: AtomicCounter::new(),
            skips: AtomicCounter::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// 名义周期
    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[inline]
    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn mark_running(&self) {
        self.state.store(TaskState::Running as u8, Ordering::Release);
    }

    /// 进入挂起点，最迟在 `deadline` 恢复
    pub fn block_until(&self, deadline: Instant) {
        self.wake_at.store(deadline.as_ticks(), Ordering::Relaxed);
        self.state.store(TaskState::Blocked as u8, Ordering::Release);
    }

    /// 在 `now` 时刻是否可运行
    pub fn is_runnable(&self, now: Instant) -> bool {
        match self.state() {
            TaskState::Ready | TaskState::Running => true,
            TaskState::Blocked => now.as_ticks() >= self.wake_at.load(Ordering::Relaxed),
            TaskState::Suspended => false,
        }
    }

    /// 记录一个完整周期
    pub fn record_cycle(&self) -> u64 {
        self.cycles.increment()
    }

    /// 记录一次跳过的写入
    pub fn record_skip(&self) -> u64 {
        self.skips.increment()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.get()
    }

    pub fn skips(&self) -> u64 {
        self.skips.get()
    }
}

/// 任务表 - 启动时一次性构造，之后不再增删
pub struct TaskTable<const N: usize> {
    tasks: [TaskDescriptor; N],
}

impl<const N: usize> TaskTable<N> {
    pub const fn new(tasks: [TaskDescriptor; N]) -> Self {
        Self { tasks }
    }

    /// 按句柄查找
    pub fn get(&self, id: TaskId) -> Option<&TaskDescriptor> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskDescriptor> {
        self.tasks.iter()
    }

    /// 优先级最高的可运行任务
    pub fn highest_runnable(&self, now: Instant) -> Option<&TaskDescriptor> {
        self.tasks
            .iter()
            .filter(|t| t.is_runnable(now))
            .max_by_key(|t| t.priority)
    }

    /// 所有任务都处于阻塞/挂起状态
    pub fn all_blocked(&self, now: Instant) -> bool {
        self.highest_runnable(now).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TaskTable<3> {
        TaskTable::new([
            TaskDescriptor::new(TaskId(0), "raiser", 10, Duration::from_millis(1500)),
            TaskDescriptor::new(TaskId(1), "lowerer", 9, Duration::from_millis(1500)),
            TaskDescriptor::new(TaskId(2), "observer", 8, Duration::from_millis(1000)),
        ])
    }

    #[test]
    fn test_new_tasks_are_ready() {
        let tasks = table();
        let now = Instant::from_ticks(0);
        assert!(tasks.iter().all(|t| t.state() == TaskState::Ready));
        assert!(!tasks.all_blocked(now));
        assert_eq!(tasks.highest_runnable(now).map(|t| t.name()), Some("raiser"));
    }

    #[test]
    fn test_blocked_until_deadline() {
        let tasks = table();
        for t in tasks.iter() {
            t.block_until(Instant::from_ticks(1_000));
        }
        assert!(tasks.all_blocked(Instant::from_ticks(999)));
        // 截止时间已过即视为就绪
        assert!(!tasks.all_blocked(Instant::from_ticks(1_000)));
    }

    #[test]
    fn test_priority_order_of_runnable() {
        let tasks = table();
        let now = Instant::from_ticks(10);
        tasks.get(TaskId(0)).unwrap().block_until(Instant::from_ticks(500));
        assert_eq!(tasks.highest_runnable(now).map(|t| t.id()), Some(TaskId(1)));
        tasks.get(TaskId(1)).unwrap().block_until(Instant::from_ticks(500));
        assert_eq!(tasks.highest_runnable(now).map(|t| t.id()), Some(TaskId(2)));
        tasks.get(TaskId(2)).unwrap().block_until(Instant::from_ticks(20));
        assert!(tasks.all_blocked(now));
    }
}
