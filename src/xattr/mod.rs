//! 扩展属性存储
//!
//! 每个属性是私有目录树中的一个普通文件：
//!
//! ```text
//! <root>/.xastore_priv/xattrs/<HEX id>.<HEX gen>/<属性名>
//! ```
//!
//! ## 模块组织
//!
//! - `api` - 调用者入口：`getxattr` / `setxattr` / `removexattr` / `listxattr`
//! - `root` - 私有目录树的定位、创建和记录查找策略
//! - `record` - 记录头编解码
//! - `io` - 记录的按页读写与校验
//! - `delete` - 单个删除、对象删除时的批量删除
//! - `readdir` - 可重启的反向目录遍历
//! - `chown` - 所有权变化的传递
//! - `cache` - 属性目录查找缓存

mod api;
mod cache;
mod chown;
mod delete;
mod io;
mod readdir;
mod record;
mod root;

pub use cache::{DirCacheStats, XattrDirCache};
pub use readdir::XattrDirScan;
pub use record::RecordHeader;
