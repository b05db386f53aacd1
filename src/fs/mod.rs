//! 文件系统级扩展属性状态
//!
//! [`XattrFs`] 是每个文件系统一份的扩展属性上下文：持有底层存储、
//! handler 注册表、挂载选项、私有根目录缓存和两把读写锁。

mod types;
mod xattr_fs;
mod mount;

pub use types::{MountFlags, MountOptions, SuperFlags, XattrConfig, XattrFlags};
pub use xattr_fs::XattrFs;
