//! xastore_core: 基于私有目录树的扩展属性存储
//!
//! 底层文件系统不原生支持扩展属性时，把每个属性保存为隐藏私有目录树中的一个普通文件：
//! - **handler 注册表**：按命名空间前缀分派（user. / trusted. / security. / POSIX ACL）
//! - **记录格式**：magic + CRC32 校验和 + payload，按页读写
//! - **可重启的反向遍历**：遍历期间允许删除当前目录项
//! - **写时复制**：共享的记录在修改前先断开
//!
//! # 示例
//!
//! ```rust,ignore
//! use xastore_core::{HandlerRegistry, MemStore, MountFlags, MountOptions, XattrConfig, XattrFlags, XattrFs};
//! use alloc::sync::Arc;
//!
//! fn main() -> xastore_core::Result<()> {
//!     let registry = Arc::new(HandlerRegistry::with_default_handlers());
//!     let config = XattrConfig { options: MountOptions::XATTRS_USER, ..Default::default() };
//!     let fs = XattrFs::new(MemStore::new(), registry, config);
//!     fs.init_on_mount(MountFlags::empty())?;
//!
//!     let root = fs.store().root();
//!     let obj = fs.store().create(root, "file", 0o644)?;
//!     fs.setxattr(obj, "user.comment", b"hello", XattrFlags::empty())?;
//!
//!     let mut buf = [0u8; 16];
//!     let len = fs.getxattr(obj, "user.comment", Some(&mut buf))?;
//!     assert_eq!(&buf[..len], b"hello");
//!     Ok(())
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`consts`] - 常量定义
//! - [`store`] - 底层对象存储抽象和内存实现
//! - [`fs`] - 文件系统级上下文、挂载初始化
//! - [`handler`] - 命名空间 handler 与注册表
//! - [`xattr`] - 属性记录的读写、删除、遍历
//! - [`lock`] - 目录级并发锁

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(all(feature = "std", not(test)))]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 常量定义
pub mod consts;

/// 对象存储抽象
pub mod store;

/// 文件系统级上下文
pub mod fs;

/// 命名空间 handler
pub mod handler;

/// Extended Attributes (xattr)
pub mod xattr;

/// 目录锁
pub mod lock;

/// CRC32 校验和计算
pub(crate) mod crc;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 存储
pub use store::{
    AttrChange, AttrValid, DirSlot, MemStore, ObjectFormat, ObjectId, ObjectKey, ObjectStat,
    ObjectStore,
};

// 文件系统
pub use fs::{MountFlags, MountOptions, SuperFlags, XattrConfig, XattrFlags, XattrFs};

// Handler
pub use handler::{
    validate_acl, AclKind, HandlerRegistry, NamespaceHandler, PosixAclHandler, UserHandler,
    XattrHandler,
};

// Xattr
pub use xattr::{DirCacheStats, RecordHeader, XattrDirCache, XattrDirScan};
