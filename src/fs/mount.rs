//! 挂载时初始化
//!
//! 整理互斥的挂载选项，决定扩展属性是否启用，并确定私有根目录。

use super::{
    types::{MountFlags, MountOptions},
    xattr_fs::XattrFs,
};
use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
    store::{ObjectFormat, ObjectId, ObjectStore},
};

impl<S: ObjectStore> XattrFs<S> {
    /// 挂载时初始化扩展属性
    ///
    /// # 流程
    ///
    /// 1. 禁用位胜出：`NO_XATTRS_USER` 清除 `XATTRS_USER`，`NO_POSIXACL` 清除 `POSIXACL`
    /// 2. 任一可选类别启用则设置 `XATTRS`，否则清除
    /// 3. 启用时：旧格式文件系统直接失败；否则查找或创建私有根目录
    ///    - 可写挂载：失败则挂载失败（`Unsupported`）
    ///    - 只读挂载：失败只是关闭本次挂载的扩展属性
    /// 4. 出错时清除全部扩展属性选项
    /// 5. 同步对外的 POSIXACL 标志
    ///
    /// 重新挂载时可以再次调用。
    pub fn init_on_mount(&self, mount_flags: MountFlags) -> Result<()> {
        let mut opts = self.options();

        if opts.contains(MountOptions::NO_XATTRS_USER) {
            opts.remove(MountOptions::XATTRS_USER | MountOptions::NO_XATTRS_USER);
        }
        if opts.contains(MountOptions::NO_POSIXACL) {
            opts.remove(MountOptions::POSIXACL | MountOptions::NO_POSIXACL);
        }

        opts.set(MountOptions::XATTRS, opts.intersects(MountOptions::OPTIONAL));

        let result = if opts.contains(MountOptions::XATTRS) {
            self.setup_private_root(&mut opts, mount_flags)
        } else {
            Ok(())
        };

        if result.is_err() {
            opts.remove(MountOptions::ALL_XATTR);
        }

        self.set_mount_options(opts);
        self.set_posixacl_flag(opts.contains(MountOptions::POSIXACL));
        result
    }

    fn setup_private_root(&self, opts: &mut MountOptions, mount_flags: MountFlags) -> Result<()> {
        // 属性目录名依赖代数，旧格式没有代数
        if self.store.format() == ObjectFormat::Legacy {
            log::warn!("xattrs/ACLs not supported on legacy format filesystem, failing mount");
            return Err(Error::new(ErrorKind::Unsupported, "legacy format has no generations"));
        }

        if self.private_root().is_some() {
            return Ok(());
        }

        match self.find_or_create_private_root(mount_flags) {
            Ok(id) => {
                *self.priv_root.write() = Some(id);
                Ok(())
            }
            Err(err) if mount_flags.contains(MountFlags::RDONLY) => {
                // 只读挂载时私有根目录可能还没建立，不是错误，
                // 重新以读写挂载时会再检查
                log::debug!("[XATTR] no {} on read-only mount ({}), xattrs off", PRIVROOT_NAME, err);
                opts.remove(MountOptions::ALL_XATTR);
                Ok(())
            }
            Err(err) => {
                log::warn!(
                    "xattrs/ACLs enabled and couldn't find/create {} ({}), failing mount",
                    PRIVROOT_NAME,
                    err
                );
                Err(Error::new(ErrorKind::Unsupported, "private root unavailable"))
            }
        }
    }

    fn find_or_create_private_root(&self, mount_flags: MountFlags) -> Result<ObjectId> {
        let root = self.store.root();
        let id = match self.store.lookup(root, PRIVROOT_NAME)? {
            Some(id) => id,
            None if mount_flags.contains(MountFlags::RDONLY) => {
                return Err(Error::new(ErrorKind::NoAttribute, "private root not found"));
            }
            None => {
                let id = self.mkdir_tolerant(root, PRIVROOT_NAME)?;
                log::warn!("Created {} - reserved for xattr storage.", PRIVROOT_NAME);
                id
            }
        };
        self.store.mark_private(id)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        consts::PRIVROOT_NAME,
        error::ErrorKind,
        fs::{MountFlags, MountOptions, SuperFlags, XattrConfig, XattrFs},
        handler::HandlerRegistry,
        store::{MemStore, ObjectFormat, ObjectStore},
    };
    use alloc::sync::Arc;

    fn new_fs(store: MemStore, options: MountOptions) -> XattrFs<MemStore> {
        let registry = Arc::new(HandlerRegistry::with_default_handlers());
        XattrFs::new(store, registry, XattrConfig { options, ..Default::default() })
    }

    #[test]
    fn test_no_optional_classes_disables_xattrs() {
        let fs = new_fs(MemStore::new(), MountOptions::XATTRS);
        fs.init_on_mount(MountFlags::empty()).unwrap();
        assert!(!fs.xattrs_enabled());
        assert!(fs.private_root().is_none());
        let root = fs.store().root();
        assert_eq!(fs.store().lookup(root, PRIVROOT_NAME).unwrap(), None);
    }

    #[test]
    fn test_mount_creates_private_root() {
        let fs = new_fs(MemStore::new(), MountOptions::XATTRS_USER | MountOptions::POSIXACL);
        fs.init_on_mount(MountFlags::empty()).unwrap();

        assert!(fs.xattrs_enabled());
        assert_eq!(fs.super_flags(), SuperFlags::POSIXACL);

        let root = fs.store().root();
        let priv_root = fs.store().lookup(root, PRIVROOT_NAME).unwrap().unwrap();
        assert_eq!(fs.private_root(), Some(priv_root));
        assert!(fs.store().stat(priv_root).unwrap().private);
    }

    #[test]
    fn test_disable_bit_wins() {
        let options = MountOptions::XATTRS_USER
            | MountOptions::NO_XATTRS_USER
            | MountOptions::POSIXACL;
        let fs = new_fs(MemStore::new(), options);
        fs.init_on_mount(MountFlags::empty()).unwrap();
        assert_eq!(fs.options(), MountOptions::XATTRS | MountOptions::POSIXACL);

        let fs = new_fs(MemStore::new(), MountOptions::POSIXACL | MountOptions::NO_POSIXACL);
        fs.init_on_mount(MountFlags::empty()).unwrap();
        assert!(fs.options().is_empty());
        assert!(fs.super_flags().is_empty());
    }

    #[test]
    fn test_legacy_format_fails_mount() {
        let store = MemStore::new().with_format(ObjectFormat::Legacy);
        let fs = new_fs(store, MountOptions::XATTRS_USER | MountOptions::POSIXACL);
        let err = fs.init_on_mount(MountFlags::empty()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(fs.options().is_empty());
        assert!(fs.super_flags().is_empty());
    }

    #[test]
    fn test_legacy_format_without_xattrs_mounts() {
        let store = MemStore::new().with_format(ObjectFormat::Legacy);
        let fs = new_fs(store, MountOptions::empty());
        fs.init_on_mount(MountFlags::empty()).unwrap();
        assert!(!fs.xattrs_enabled());
    }

    #[test]
    fn test_read_only_mount_without_private_root() {
        let fs = new_fs(MemStore::new(), MountOptions::XATTRS_USER);
        fs.init_on_mount(MountFlags::RDONLY).unwrap();
        assert!(!fs.xattrs_enabled());
        assert!(fs.private_root().is_none());

        // 重新以读写方式挂载后可用
        fs.set_mount_options(MountOptions::XATTRS_USER);
        fs.init_on_mount(MountFlags::empty()).unwrap();
        assert!(fs.xattrs_enabled());
        assert!(fs.private_root().is_some());
    }

    #[test]
    fn test_read_only_mount_with_existing_private_root() {
        let store = MemStore::new();
        let root = store.root();
        let priv_root = store.mkdir(root, PRIVROOT_NAME, 0o700).unwrap();

        let fs = new_fs(store, MountOptions::XATTRS_USER);
        fs.init_on_mount(MountFlags::RDONLY).unwrap();
        assert!(fs.xattrs_enabled());
        assert_eq!(fs.private_root(), Some(priv_root));
        assert!(fs.store().stat(priv_root).unwrap().private);
    }
}
