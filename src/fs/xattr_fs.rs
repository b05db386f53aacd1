//! 扩展属性文件系统上下文

use super::types::{MountOptions, SuperFlags, XattrConfig};
use crate::{
    error::Result,
    handler::HandlerRegistry,
    lock::DirLockTable,
    store::{ObjectId, ObjectStore},
    xattr::XattrDirCache,
};
use alloc::{string::{String, ToString}, sync::Arc};
use core::sync::atomic::{AtomicU32, Ordering};
use spin::RwLock;

/// 扩展属性文件系统上下文
///
/// # 锁
///
/// - `tree_lock`：保护属性目录树的形状。创建/删除目录、删除记录、
///   批量 chown 时取写锁；读取记录和列表时取读锁。
/// - `dir_locks`：遍历目录期间持有，目录不发生结构变化。
/// - handler 注册表有自己的读写锁，见 [`HandlerRegistry`]。
///
/// 所有入口都假定调用者已持有目标对象的独占锁。
///
/// # 示例
///
/// ```rust,ignore
/// let registry = Arc::new(HandlerRegistry::with_default_handlers());
/// let config = XattrConfig { options: MountOptions::XATTRS_USER, ..Default::default() };
/// let fs = XattrFs::new(MemStore::new(), registry, config);
/// fs.init_on_mount(MountFlags::empty())?;
///
/// fs.setxattr(obj, "user.comment", b"hello", XattrFlags::empty())?;
/// let mut buf = [0u8; 16];
/// let len = fs.getxattr(obj, "user.comment", Some(&mut buf))?;
/// ```
pub struct XattrFs<S: ObjectStore> {
    pub(crate) store: S,
    pub(crate) registry: Arc<HandlerRegistry<S>>,
    options: AtomicU32,
    super_flags: AtomicU32,
    /// 私有根目录（挂载时确定）
    pub(crate) priv_root: RwLock<Option<ObjectId>>,
    /// xattr 根目录（首次需要时确定）
    pub(crate) xa_root: RwLock<Option<ObjectId>>,
    pub(crate) tree_lock: RwLock<()>,
    pub(crate) dir_locks: DirLockTable,
    pub(crate) dir_cache: XattrDirCache,
}

impl<S: ObjectStore> XattrFs<S> {
    /// 创建上下文
    ///
    /// 创建后需调用 [`init_on_mount`](Self::init_on_mount) 才能使用扩展属性
    pub fn new(store: S, registry: Arc<HandlerRegistry<S>>, config: XattrConfig) -> Self {
        Self {
            store,
            registry,
            options: AtomicU32::new(config.options.bits()),
            super_flags: AtomicU32::new(0),
            priv_root: RwLock::new(None),
            xa_root: RwLock::new(None),
            tree_lock: RwLock::new(()),
            dir_locks: DirLockTable::new(),
            dir_cache: XattrDirCache::new(config.dir_cache_size),
        }
    }

    /// 底层存储
    pub fn store(&self) -> &S {
        &self.store
    }

    /// handler 注册表
    pub fn registry(&self) -> &Arc<HandlerRegistry<S>> {
        &self.registry
    }

    /// 当前挂载选项
    pub fn options(&self) -> MountOptions {
        MountOptions::from_bits_truncate(self.options.load(Ordering::Acquire))
    }

    /// 设置挂载选项（重新挂载前调用，随后再次 `init_on_mount`）
    pub fn set_mount_options(&self, options: MountOptions) {
        self.options.store(options.bits(), Ordering::Release);
    }

    /// 对外可见的文件系统标志
    pub fn super_flags(&self) -> SuperFlags {
        SuperFlags::from_bits_truncate(self.super_flags.load(Ordering::Acquire))
    }

    pub(crate) fn set_posixacl_flag(&self, enabled: bool) {
        if enabled {
            self.super_flags.fetch_or(SuperFlags::POSIXACL.bits(), Ordering::AcqRel);
        } else {
            self.super_flags.fetch_and(!SuperFlags::POSIXACL.bits(), Ordering::AcqRel);
        }
    }

    /// 扩展属性是否可用
    pub fn xattrs_enabled(&self) -> bool {
        self.options().contains(MountOptions::XATTRS)
    }

    /// user. 属性是否启用
    pub fn user_xattrs_enabled(&self) -> bool {
        self.options().contains(MountOptions::XATTRS | MountOptions::XATTRS_USER)
    }

    /// POSIX ACL 是否启用
    pub fn posixacl_enabled(&self) -> bool {
        self.options().contains(MountOptions::XATTRS | MountOptions::POSIXACL)
    }

    /// 私有根目录
    pub fn private_root(&self) -> Option<ObjectId> {
        *self.priv_root.read()
    }

    /// 对象的属性目录名
    pub fn xattr_dir_name(&self, obj: ObjectId) -> Result<String> {
        Ok(self.store.stat(obj)?.key().to_string())
    }
}
