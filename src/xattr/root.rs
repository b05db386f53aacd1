//! 属性目录树的定位与创建
//!
//! ```text
//! <root>/.xastore_priv/xattrs/<HEX id>.<HEX gen>/<属性名>
//! ```
//!
//! xattr 根目录在第一次需要时创建；每个对象的属性目录在第一次写入时创建。
//! 并发创建同名目录时，失败方重新查找即可。

use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
    fs::{XattrFlags, XattrFs},
    store::{ObjectId, ObjectStat, ObjectStore},
};
use alloc::string::ToString;

/// 记录查找结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordLookup {
    /// 记录存在（或刚被创建）
    Found(ObjectId),
    /// 记录不存在，且按标志不应创建
    Missing,
}

/// 检查属性名是否可以作为目录项名
pub(crate) fn validate_xattr_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > XATTR_NAME_MAX || name == "." || name == ".." {
        return Err(Error::new(ErrorKind::InvalidInput, "invalid xattr name"));
    }
    if name.bytes().any(|b| b == b'/' || b == 0) {
        return Err(Error::new(ErrorKind::InvalidInput, "invalid character in xattr name"));
    }
    Ok(())
}

impl<S: ObjectStore> XattrFs<S> {
    /// 创建目录，已存在时返回现有目录
    pub(crate) fn mkdir_tolerant(&self, parent: ObjectId, name: &str) -> Result<ObjectId> {
        match self.store.mkdir(parent, name, XATTR_MODE) {
            Ok(id) => Ok(id),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                log::debug!("[XATTR] lost mkdir race for {}, re-lookup", name);
                self.store
                    .lookup(parent, name)?
                    .ok_or(Error::new(ErrorKind::NotFound, "directory vanished after mkdir race"))
            }
            Err(err) => Err(err),
        }
    }

    /// 获取 xattr 根目录
    ///
    /// 没有私有根目录时返回 `Unsupported`；
    /// 根目录不存在且不允许创建时返回 `NoAttribute`
    pub(crate) fn get_or_create_root(&self, allow_create: bool) -> Result<ObjectId> {
        let priv_root = self
            .private_root()
            .ok_or(Error::new(ErrorKind::Unsupported, "no private root"))?;

        if let Some(id) = *self.xa_root.read() {
            return Ok(id);
        }

        let id = match self.store.lookup(priv_root, XAROOT_NAME)? {
            Some(id) => id,
            None if allow_create => {
                let id = self.mkdir_tolerant(priv_root, XAROOT_NAME)?;
                log::debug!("[XATTR] created xattr root {}", id);
                id
            }
            None => return Err(Error::new(ErrorKind::NoAttribute, "xattr root not found")),
        };

        *self.xa_root.write() = Some(id);
        Ok(id)
    }

    /// 打开对象的属性目录
    ///
    /// `flags` 允许创建（见 [`XattrFlags::allows_create`]）时，目录不存在则创建
    pub(crate) fn open_xattr_dir(&self, stat: &ObjectStat, flags: XattrFlags) -> Result<ObjectId> {
        let key = stat.key();
        if let Some(dir) = self.dir_cache.get(&key) {
            return Ok(dir);
        }

        let create = flags.allows_create();
        let xa_root = self.get_or_create_root(create)?;
        let name = key.to_string();

        let dir = match self.store.lookup(xa_root, &name)? {
            Some(dir) => dir,
            None if create => {
                let dir = self.mkdir_tolerant(xa_root, &name)?;
                log::debug!("[XATTR] created xattr dir {} for object {}", name, stat.id);
                dir
            }
            None => return Err(Error::new(ErrorKind::NoAttribute, "xattr dir not found")),
        };

        self.dir_cache.insert(key, dir);
        Ok(dir)
    }

    /// 在属性目录中按策略查找或创建记录
    pub(crate) fn resolve_record(
        &self,
        stat: &ObjectStat,
        name: &str,
        flags: XattrFlags,
    ) -> Result<RecordLookup> {
        validate_xattr_name(name)?;
        let dir = self.open_xattr_dir(stat, flags)?;

        if let Some(id) = self.store.lookup(dir, name)? {
            if flags.contains(XattrFlags::CREATE) {
                return Err(Error::new(ErrorKind::AlreadyExists, "xattr already exists"));
            }
            return Ok(RecordLookup::Found(id));
        }

        if flags.intersects(XattrFlags::REPLACE | XattrFlags::READONLY) {
            return Ok(RecordLookup::Missing);
        }

        let id = match self.store.create(dir, name, S_IFREG | XATTR_MODE) {
            Ok(id) => id,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => self
                .store
                .lookup(dir, name)?
                .ok_or(Error::new(ErrorKind::NotFound, "record vanished after create race"))?,
            Err(err) => return Err(err),
        };
        Ok(RecordLookup::Found(id))
    }
}
