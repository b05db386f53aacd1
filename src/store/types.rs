//! 存储层类型定义

use crate::consts::*;
use bitflags::bitflags;
use core::fmt;

/// 存储对象 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 对象键：对象 ID + 代数
///
/// 对象 ID 在删除后可被复用，代数随之变化，
/// 因此属性目录以二者共同命名，避免命中残留的旧目录。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// 对象 ID
    pub object_id: u64,
    /// 代数
    pub generation: u32,
}

impl ObjectKey {
    /// 创建对象键
    pub const fn new(object_id: u64, generation: u32) -> Self {
        Self {
            object_id,
            generation,
        }
    }
}

impl fmt::Display for ObjectKey {
    /// 属性目录名：大写十六进制，以 '.' 分隔
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}.{:X}", self.object_id, self.generation)
    }
}

/// 对象元数据格式版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectFormat {
    /// 旧格式：没有代数，不支持扩展属性
    Legacy,
    /// 当前格式
    #[default]
    Current,
}

/// 对象状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectStat {
    /// 对象 ID
    pub id: ObjectId,
    /// 代数
    pub generation: u32,
    /// 元数据格式
    pub format: ObjectFormat,
    /// 文件模式（类型 + 权限）
    pub mode: u32,
    /// 硬链接数
    pub nlink: u32,
    /// 大小（字节）
    pub size: u64,
    /// 用户 ID
    pub uid: u32,
    /// 组 ID
    pub gid: u32,
    /// 状态改变时间（秒）
    pub ctime: u64,
    /// 是否属于私有命名空间
    pub private: bool,
}

impl ObjectStat {
    /// 对象键
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.id.0, self.generation)
    }

    /// 是否为目录
    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    /// 是否为旧格式对象
    pub fn is_legacy(&self) -> bool {
        self.format == ObjectFormat::Legacy
    }
}

bitflags! {
    /// 属性修改的有效字段
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AttrValid: u32 {
        /// 所有者
        const UID   = 0x01;
        /// 组
        const GID   = 0x02;
        /// 大小（截断/扩展）
        const SIZE  = 0x04;
        /// 状态改变时间
        const CTIME = 0x08;
        /// 权限
        const MODE  = 0x10;
    }
}

/// 属性修改请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrChange {
    /// 有效字段
    pub valid: AttrValid,
    /// 新所有者
    pub uid: u32,
    /// 新组
    pub gid: u32,
    /// 新大小
    pub size: u64,
    /// 新状态改变时间
    pub ctime: u64,
    /// 新权限位
    pub mode: u32,
}

impl AttrChange {
    /// 空修改
    pub const fn empty() -> Self {
        Self {
            valid: AttrValid::empty(),
            uid: 0,
            gid: 0,
            size: 0,
            ctime: 0,
            mode: 0,
        }
    }

    /// 修改所有者和组
    pub const fn chown(uid: u32, gid: u32) -> Self {
        Self {
            valid: AttrValid::UID.union(AttrValid::GID),
            uid,
            gid,
            ..Self::empty()
        }
    }

    /// 调整大小
    pub const fn resize(size: u64) -> Self {
        Self {
            valid: AttrValid::SIZE,
            size,
            ..Self::empty()
        }
    }

    /// 附带状态改变时间
    pub const fn with_ctime(mut self, ctime: u64) -> Self {
        self.valid = self.valid.union(AttrValid::CTIME);
        self.ctime = ctime;
        self
    }

    /// 只保留给定字段
    pub fn restricted(mut self, mask: AttrValid) -> Self {
        self.valid &= mask;
        self
    }
}

impl Default for AttrChange {
    fn default() -> Self {
        Self::empty()
    }
}

/// 目录项位置快照
///
/// 由 [`ObjectStore::locate_entry`](super::ObjectStore::locate_entry) 返回。
/// 只是数据快照，返回后存储层不持有任何游标或锁。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirSlot {
    /// 逻辑偏移
    pub offset: u64,
    /// 目录项指向的对象
    pub object_id: ObjectId,
    /// 是否可见（隐藏项在遍历时跳过）
    pub visible: bool,
    /// 定位时的目录版本，用于检测目录项是否已移动
    pub stamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_object_key_dir_name() {
        assert_eq!(ObjectKey::new(12648430, 0).to_string(), "C0FFEE.0");
        assert_eq!(ObjectKey::new(0x1f, 0xab).to_string(), "1F.AB");
    }

    #[test]
    fn test_attr_change_restricted() {
        let change = AttrChange::chown(5, 6).with_ctime(10);
        let mut wide = change;
        wide.valid |= AttrValid::SIZE | AttrValid::MODE;
        let narrowed = wide.restricted(AttrValid::UID | AttrValid::GID | AttrValid::CTIME);
        assert_eq!(narrowed, change);
    }

    #[test]
    fn test_stat_is_dir() {
        let stat = ObjectStat {
            id: ObjectId(1),
            generation: 0,
            format: ObjectFormat::Current,
            mode: S_IFDIR | 0o755,
            nlink: 2,
            size: 0,
            uid: 0,
            gid: 0,
            ctime: 0,
            private: false,
        };
        assert!(stat.is_dir());
        assert!(!stat.is_legacy());
        assert_eq!(stat.key(), ObjectKey::new(1, 0));
    }
}
