//! 属性目录遍历
//!
//! 按逻辑偏移从大到小反向扫描：每一步定位偏移不大于当前位置的目录项，
//! 拷贝出名称后再交给调用者，交出期间存储层不持有任何游标。
//! 调用者可以删除刚拿到的目录项，下一步从更小的偏移继续，不会漏项。
//!
//! ## 设计说明
//!
//! [`XattrDirScan`] 只保存扫描位置，任何时刻都可以从
//! [`position`](XattrDirScan::position) 重新开始；目录项在定位和拷贝名称之间被移动时，
//! 在同一位置重新定位。

use crate::{
    consts::*,
    error::Result,
    fs::XattrFs,
    lock::DirGuard,
    store::{DirSlot, ObjectId, ObjectStore},
};
use alloc::string::String;

/// 反向目录扫描
///
/// 跳过 "."、".."、隐藏目录项、名称过长的目录项，
/// 以及根目录下的私有根目录。扫描期间持有目录锁，Drop 时释放。
pub struct XattrDirScan<'a, S: ObjectStore> {
    fs: &'a XattrFs<S>,
    _guard: DirGuard<'a>,
    dir: ObjectId,
    /// 下一次定位的位置
    pos: u64,
    at_root: bool,
    priv_root: Option<ObjectId>,
    done: bool,
}

impl<'a, S: ObjectStore> XattrDirScan<'a, S> {
    /// 从 `pos` 开始扫描（含 `pos`）
    pub fn new(fs: &'a XattrFs<S>, dir: ObjectId, pos: u64) -> Self {
        let guard = fs.dir_locks.lock(dir);
        Self {
            fs,
            _guard: guard,
            dir,
            pos,
            at_root: dir == fs.store.root(),
            priv_root: fs.private_root(),
            done: false,
        }
    }

    /// 当前扫描位置
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// 被扫描的目录
    pub fn dir(&self) -> ObjectId {
        self.dir
    }

    fn should_skip(&self, name: &str, slot: &DirSlot) -> bool {
        if name.len() > NAME_MAX {
            return true;
        }
        self.at_root && (self.priv_root == Some(slot.object_id) || name == PRIVROOT_NAME)
    }

    fn advance(&mut self) -> Result<Option<(String, DirSlot)>> {
        loop {
            let slot = match self.fs.store.locate_entry(self.dir, self.pos)? {
                Some(slot) if slot.offset > DOT_DOT_OFFSET => slot,
                _ => return Ok(None),
            };

            if !slot.visible {
                self.pos = slot.offset - 1;
                continue;
            }

            let name = match self.fs.store.entry_name(self.dir, &slot)? {
                Some(name) => name,
                None => {
                    // 目录项已移动，在同一位置重新定位
                    log::trace!("[XATTR] entry at {} moved in dir {}, retry", slot.offset, self.dir);
                    continue;
                }
            };
            self.pos = slot.offset - 1;

            if self.should_skip(&name, &slot) {
                continue;
            }
            return Ok(Some((name, slot)));
        }
    }
}

impl<S: ObjectStore> Iterator for XattrDirScan<'_, S> {
    type Item = Result<(String, DirSlot)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<S: ObjectStore> XattrFs<S> {
    /// 从最大偏移开始反向扫描目录
    pub fn scan_dir(&self, dir: ObjectId) -> XattrDirScan<'_, S> {
        XattrDirScan::new(self, dir, MAX_OFFSET)
    }

    /// 遍历目录，对每个目录项调用 `filler`
    ///
    /// `filler` 返回错误时停止并返回该错误
    pub fn xattr_readdir<F>(&self, dir: ObjectId, mut filler: F) -> Result<()>
    where
        F: FnMut(&str, &DirSlot) -> Result<()>,
    {
        for entry in self.scan_dir(dir) {
            let (name, slot) = entry?;
            filler(&name, &slot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::XattrDirScan;
    use crate::xattr::testing::{mounted_fs, new_file};
    use crate::{
        error::{Error, ErrorKind},
        fs::{MountOptions, XattrFlags},
        store::{MemStore, ObjectStore},
    };
    use alloc::{string::String, vec::Vec};

    fn collect(fs: &crate::fs::XattrFs<MemStore>, dir: crate::store::ObjectId) -> Vec<String> {
        let mut names = Vec::new();
        fs.xattr_readdir(dir, |name, _| {
            names.push(String::from(name));
            Ok(())
        })
        .unwrap();
        names
    }

    #[test]
    fn test_reverse_order() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let dir = fs.store().mkdir(fs.store().root(), "d", 0o755).unwrap();
        for name in ["a", "b", "c"] {
            fs.store().create(dir, name, 0o644).unwrap();
        }
        assert_eq!(collect(&fs, dir), ["c", "b", "a"]);
    }

    #[test]
    fn test_root_hides_private_root() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        new_file(&fs, "visible");
        let root = fs.store().root();
        assert!(fs.store().lookup(root, crate::consts::PRIVROOT_NAME).unwrap().is_some());
        assert_eq!(collect(&fs, root), ["visible"]);
    }

    #[test]
    fn test_hidden_entries_skipped() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let dir = fs.store().mkdir(fs.store().root(), "d", 0o755).unwrap();
        for name in ["a", "b", "c"] {
            fs.store().create(dir, name, 0o644).unwrap();
        }
        fs.store().set_entry_visible(dir, "b", false).unwrap();
        assert_eq!(collect(&fs, dir), ["c", "a"]);
    }

    #[test]
    fn test_moved_entry_retried() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let dir = fs.store().mkdir(fs.store().root(), "d", 0o755).unwrap();
        for name in ["a", "b"] {
            fs.store().create(dir, name, 0o644).unwrap();
        }
        fs.store().inject_entry_moves(3);
        assert_eq!(collect(&fs, dir), ["b", "a"]);
    }

    #[test]
    fn test_filler_may_delete_current_entry() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let dir = fs.store().mkdir(fs.store().root(), "d", 0o755).unwrap();
        for name in ["a", "b", "c", "d"] {
            fs.store().create(dir, name, 0o644).unwrap();
        }

        let mut seen = 0;
        fs.xattr_readdir(dir, |name, _| {
            seen += 1;
            fs.store().unlink(dir, name)
        })
        .unwrap();
        assert_eq!(seen, 4);
        assert!(collect(&fs, dir).is_empty());
    }

    #[test]
    fn test_filler_error_stops_scan() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let dir = fs.store().mkdir(fs.store().root(), "d", 0o755).unwrap();
        for name in ["a", "b", "c"] {
            fs.store().create(dir, name, 0o644).unwrap();
        }

        let mut seen = Vec::new();
        let err = fs
            .xattr_readdir(dir, |name, _| {
                seen.push(String::from(name));
                if name == "b" {
                    return Err(Error::new(ErrorKind::Io, "stop"));
                }
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(seen, ["c", "b"]);
    }

    #[test]
    fn test_scan_restart_from_position() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let dir = fs.store().mkdir(fs.store().root(), "d", 0o755).unwrap();
        for name in ["a", "b", "c"] {
            fs.store().create(dir, name, 0o644).unwrap();
        }

        let mut scan = fs.scan_dir(dir);
        let (first, _) = scan.next().unwrap().unwrap();
        assert_eq!(first, "c");
        let pos = scan.position();
        drop(scan);

        let rest: Vec<String> = XattrDirScan::new(&fs, dir, pos)
            .map(|entry| entry.unwrap().0)
            .collect();
        assert_eq!(rest, ["b", "a"]);
    }

    #[test]
    fn test_dir_locked_during_scan() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");
        fs.xattr_set(obj, "user.a", b"x", XattrFlags::empty()).unwrap();
        let stat = fs.store().stat(obj).unwrap();
        let dir = fs.open_xattr_dir(&stat, XattrFlags::READONLY).unwrap();

        fs.xattr_readdir(dir, |_, _| {
            assert!(fs.dir_locks.is_locked(dir));
            Ok(())
        })
        .unwrap();
        assert!(!fs.dir_locks.is_locked(dir));
    }
}
