//! 目录级并发锁
//!
//! 遍历目录期间，目录不允许发生结构性变化（除遍历者自己的操作外）。
//! 每个目录一把锁，以目录对象 ID 为键，通过 RAII guard 自动释放。

use crate::store::ObjectId;
use alloc::collections::BTreeSet;
use core::hint::spin_loop;
use spin::Mutex;

/// 目录锁表
///
/// 表中只记录当前被持有的目录，未持有的目录不占空间。
pub struct DirLockTable {
    held: Mutex<BTreeSet<ObjectId>>,
}

impl DirLockTable {
    /// 创建空锁表
    pub const fn new() -> Self {
        Self {
            held: Mutex::new(BTreeSet::new()),
        }
    }

    /// 获取目录锁（阻塞直到可用）
    pub fn lock(&self, dir: ObjectId) -> DirGuard<'_> {
        loop {
            if let Some(guard) = self.try_lock(dir) {
                return guard;
            }
            spin_loop();
        }
    }

    /// 尝试获取目录锁
    pub fn try_lock(&self, dir: ObjectId) -> Option<DirGuard<'_>> {
        let mut held = self.held.lock();
        if held.insert(dir) {
            Some(DirGuard { table: self, dir })
        } else {
            None
        }
    }

    /// 目录是否被持有
    pub fn is_locked(&self, dir: ObjectId) -> bool {
        self.held.lock().contains(&dir)
    }
}

impl Default for DirLockTable {
    fn default() -> Self {
        Self::new()
    }
}

/// 目录锁 guard，Drop 时释放
pub struct DirGuard<'a> {
    table: &'a DirLockTable,
    dir: ObjectId,
}

impl DirGuard<'_> {
    /// 被锁定的目录
    pub fn dir(&self) -> ObjectId {
        self.dir
    }
}

impl Drop for DirGuard<'_> {
    fn drop(&mut self) {
        self.table.held.lock().remove(&self.dir);
    }
}
