//! 属性删除
//!
//! 单个属性删除只移除目录项；对象被删除时由 [`XattrFs::delete_xattrs`]
//! 清空并移除整个属性目录。

use super::root::validate_xattr_name;
use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
    fs::{XattrFlags, XattrFs},
    store::{ObjectId, ObjectStat, ObjectStore},
};
use alloc::string::ToString;

impl<S: ObjectStore> XattrFs<S> {
    /// 删除属性记录
    ///
    /// 只应在 [`XattrHandler`](crate::handler::XattrHandler) 的分派中调用，
    /// 此时 [`setxattr`](Self::setxattr) 或 [`removexattr`](Self::removexattr) 已持有树写锁。
    pub fn xattr_del(&self, obj: ObjectId, name: &str) -> Result<()> {
        let stat = self.store.stat(obj)?;
        self.del_record(&stat, name)
    }

    pub(crate) fn del_record(&self, stat: &ObjectStat, name: &str) -> Result<()> {
        validate_xattr_name(name)?;
        let dir = self.open_xattr_dir(stat, XattrFlags::READONLY)?;
        self.del_entry(dir, name)
    }

    /// 删除属性目录中的一个目录项
    ///
    /// 子目录跳过；不在私有命名空间内的目标拒绝删除
    fn del_entry(&self, dir: ObjectId, name: &str) -> Result<()> {
        let id = self
            .store
            .lookup(dir, name)?
            .ok_or(Error::new(ErrorKind::NoAttribute, "xattr not found"))?;
        let target = self.store.stat(id)?;

        if target.is_dir() {
            return Ok(());
        }

        if !target.private {
            log::warn!(
                "Refusing to unlink {} ({}) outside of the private xattr namespace",
                name,
                id
            );
            return Err(Error::new(ErrorKind::Corrupted, "xattr entry not private"));
        }

        self.store.unlink(dir, name)
    }

    /// 属性目录为空时移除它
    ///
    /// 返回目录是否被移除
    pub(crate) fn remove_xattr_dir_if_empty(&self, stat: &ObjectStat, dir: ObjectId) -> Result<bool> {
        if let Some(slot) = self.store.locate_entry(dir, MAX_OFFSET)? {
            if slot.offset > DOT_DOT_OFFSET {
                return Ok(false);
            }
        }

        let key = stat.key();
        let xa_root = self.get_or_create_root(false)?;
        self.dir_cache.invalidate(&key);
        self.store.rmdir(xa_root, &key.to_string())?;
        log::debug!("[XATTR] removed xattr dir {} of object {}", key, stat.id);
        Ok(true)
    }

    /// 删除对象的全部属性
    ///
    /// 对象被删除时调用。私有对象、旧格式对象、扩展属性关闭时什么也不做；
    /// 对象没有属性目录也视为成功。
    ///
    /// 返回遍历中的第一个错误，否则返回移除目录的结果。
    pub fn delete_xattrs(&self, obj: ObjectId) -> Result<()> {
        let stat = self.store.stat(obj)?;
        if stat.private || stat.is_legacy() || !self.xattrs_enabled() {
            return Ok(());
        }

        let _tree = self.tree_lock.write();
        let dir = match self.open_xattr_dir(&stat, XattrFlags::READONLY) {
            Ok(dir) => dir,
            Err(err) if err.is_no_attribute() => return Ok(()),
            Err(err) => return Err(err),
        };

        let scan = self.xattr_readdir(dir, |name, _slot| self.del_entry(dir, name));

        let prune = match self.remove_xattr_dir_if_empty(&stat, dir) {
            Ok(true) => Ok(()),
            Ok(false) => {
                log::warn!("Couldn't delete all xattrs of object {} (generation {})", obj, stat.generation);
                Ok(())
            }
            Err(err) => Err(err),
        };

        scan.and(prune)
    }
}
