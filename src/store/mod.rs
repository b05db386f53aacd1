//! 底层对象存储抽象
//!
//! 扩展属性层不关心对象如何分配、如何在树中查找、页缓存如何工作，
//! 只通过本模块定义的目录/文件接口访问存储：
//!
//! - 按名查找、创建文件/目录、删除
//! - 按页读写、截断、修改属性
//! - 按逻辑偏移反向定位目录项
//!
//! [`MemStore`] 是一个完整的内存实现，供测试和嵌入使用。

mod types;
mod mem;

pub use mem::MemStore;
pub use types::{
    AttrChange, AttrValid, DirSlot, ObjectFormat, ObjectId, ObjectKey, ObjectStat,
};

use crate::error::Result;
use alloc::string::String;

/// 对象存储接口
///
/// 所有方法都是同步阻塞调用，实现需要自行保证单个调用的原子性。
///
/// # 私有标记
///
/// 在带私有标记的目录下创建的对象必须继承该标记；
/// [`mark_private`](ObjectStore::mark_private) 用于在挂载时标记私有根目录。
pub trait ObjectStore: Send + Sync + 'static {
    /// 文件系统根目录
    fn root(&self) -> ObjectId;

    /// 文件系统格式（旧格式没有代数）
    fn format(&self) -> ObjectFormat;

    /// 页大小（字节）
    fn page_size(&self) -> usize;

    /// 获取对象状态
    fn stat(&self, id: ObjectId) -> Result<ObjectStat>;

    /// 在目录中按名查找
    fn lookup(&self, dir: ObjectId, name: &str) -> Result<Option<ObjectId>>;

    /// 创建目录
    ///
    /// 同名目录项已存在时返回 `AlreadyExists`
    fn mkdir(&self, dir: ObjectId, name: &str, mode: u32) -> Result<ObjectId>;

    /// 创建普通文件
    ///
    /// 同名目录项已存在时返回 `AlreadyExists`
    fn create(&self, dir: ObjectId, name: &str, mode: u32) -> Result<ObjectId>;

    /// 删除文件目录项（链接数减一）
    fn unlink(&self, dir: ObjectId, name: &str) -> Result<()>;

    /// 删除空目录
    fn rmdir(&self, dir: ObjectId, name: &str) -> Result<()>;

    /// 修改对象属性（所有者、大小、ctime 等）
    fn set_attr(&self, id: ObjectId, change: &AttrChange) -> Result<()>;

    /// 读取一页
    ///
    /// `buf` 长度为页大小，超出文件末尾的部分填零
    fn read_page(&self, id: ObjectId, index: u64, buf: &mut [u8]) -> Result<()>;

    /// 写入一页中的一段
    ///
    /// 从 `index` 页内的 `offset` 处写入 `data`，
    /// 写入范围超过文件末尾时扩展文件大小
    fn write_page(&self, id: ObjectId, index: u64, offset: usize, data: &[u8]) -> Result<()>;

    /// 标记对象属于私有命名空间
    fn mark_private(&self, id: ObjectId) -> Result<()>;

    /// 定位逻辑偏移不大于 `pos` 的最后一个目录项
    ///
    /// 包括 "." 和 ".."（偏移分别为 1 和 2）；目录为空时返回 None
    fn locate_entry(&self, dir: ObjectId, pos: u64) -> Result<Option<DirSlot>>;

    /// 拷贝目录项名称
    ///
    /// 如果自 `locate_entry` 之后目录项已移动，返回 `Ok(None)`，
    /// 调用者应在同一偏移上重新定位。
    fn entry_name(&self, dir: ObjectId, slot: &DirSlot) -> Result<Option<String>>;
}
