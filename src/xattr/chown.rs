//! 属性所有权同步
//!
//! 对象的所有者变化时，属性目录和其中的记录跟随变化，
//! 使配额等按所有者统计的信息保持一致。

use crate::{
    error::{Error, ErrorKind, Result},
    fs::{XattrFlags, XattrFs},
    store::{AttrChange, AttrValid, ObjectId, ObjectStore},
};

impl<S: ObjectStore> XattrFs<S> {
    /// 把所有权变化传递给对象的全部属性
    ///
    /// 只保留 `UID`、`GID`、`CTIME` 三个字段。跳过规则同 [`delete_xattrs`](Self::delete_xattrs)；
    /// 对象没有属性目录视为成功。
    pub fn chown_xattrs(&self, obj: ObjectId, change: &AttrChange) -> Result<()> {
        let stat = self.store.stat(obj)?;
        if stat.private || stat.is_legacy() || !self.xattrs_enabled() {
            return Ok(());
        }

        let change = change.restricted(AttrValid::UID | AttrValid::GID | AttrValid::CTIME);

        let _tree = self.tree_lock.write();
        let dir = match self.open_xattr_dir(&stat, XattrFlags::READONLY) {
            Ok(dir) => dir,
            Err(err) if err.is_no_attribute() => return Ok(()),
            Err(err) => return Err(err),
        };

        self.xattr_readdir(dir, |name, _slot| {
            let id = self
                .store
                .lookup(dir, name)?
                .ok_or(Error::new(ErrorKind::NoAttribute, "xattr vanished during chown"))?;
            if self.store.stat(id)?.is_dir() {
                return Ok(());
            }
            self.store.set_attr(id, &change)
        })?;

        self.store.set_attr(dir, &change)
    }
}

#[cfg(test)]
mod tests {
    use crate::xattr::testing::{mounted_fs, new_file, record_of};
    use super::*;
    use crate::{fs::MountOptions, store::MemStore};

    #[test]
    fn test_chown_all_records_and_dir() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");
        for name in ["user.a", "user.b"] {
            fs.xattr_set(obj, name, b"v", XattrFlags::empty()).unwrap();
        }

        let change = AttrChange::chown(1000, 100).with_ctime(42);
        fs.chown_xattrs(obj, &change).unwrap();

        for name in ["user.a", "user.b"] {
            let record = fs.store().stat(record_of(&fs, obj, name)).unwrap();
            assert_eq!((record.uid, record.gid, record.ctime), (1000, 100, 42));
        }
        let stat = fs.store().stat(obj).unwrap();
        let dir = fs.open_xattr_dir(&stat, XattrFlags::READONLY).unwrap();
        let dir_stat = fs.store().stat(dir).unwrap();
        assert_eq!((dir_stat.uid, dir_stat.gid), (1000, 100));
    }

    #[test]
    fn test_chown_ignores_other_fields() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");
        fs.xattr_set(obj, "user.a", b"value", XattrFlags::empty()).unwrap();

        let mut change = AttrChange::chown(7, 8);
        change.valid |= AttrValid::SIZE | AttrValid::MODE;
        change.size = 0;
        change.mode = 0o777;
        fs.chown_xattrs(obj, &change).unwrap();

        let record = fs.store().stat(record_of(&fs, obj, "user.a")).unwrap();
        assert_eq!(record.uid, 7);
        assert_eq!(record.mode & 0o777, 0o700);
        assert_eq!(fs.xattr_get(obj, "user.a", None).unwrap(), 5);
    }

    #[test]
    fn test_chown_without_dir() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");
        fs.chown_xattrs(obj, &AttrChange::chown(1, 1)).unwrap();
    }

    #[test]
    fn test_chown_skips_subdirectories() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");
        fs.xattr_set(obj, "user.a", b"v", XattrFlags::empty()).unwrap();
        let stat = fs.store().stat(obj).unwrap();
        let dir = fs.open_xattr_dir(&stat, XattrFlags::READONLY).unwrap();
        let sub = fs.store().mkdir(dir, "user.sub", 0o700).unwrap();

        fs.chown_xattrs(obj, &AttrChange::chown(5, 5)).unwrap();
        assert_eq!(fs.store().stat(sub).unwrap().uid, 0);
    }
}
