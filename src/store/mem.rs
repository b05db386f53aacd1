//! 内存对象存储
//!
//! [`ObjectStore`] 的完整内存实现：
//!
//! - 目录项按单调递增的逻辑偏移保存，偏移在目录项生命周期内稳定
//! - 文件内容按字节保存，按页读写
//! - 支持硬链接（用于模拟共享存储）、隐藏目录项、目录项移动注入

use super::{
    AttrChange, AttrValid, DirSlot, ObjectFormat, ObjectId, ObjectStat, ObjectStore,
};
use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
};
use alloc::{collections::BTreeMap, string::String, vec::Vec};
use spin::Mutex;

/// 根目录对象 ID
const ROOT_ID: ObjectId = ObjectId(1);

struct MemDirent {
    name: String,
    id: ObjectId,
    visible: bool,
}

#[derive(Default)]
struct MemDir {
    entries: BTreeMap<u64, MemDirent>,
    next_offset: u64,
    version: u64,
}

impl MemDir {
    fn new(this: ObjectId, parent: ObjectId) -> Self {
        let mut dir = Self {
            entries: BTreeMap::new(),
            next_offset: FIRST_ENTRY_OFFSET,
            version: 0,
        };
        dir.entries.insert(
            DOT_OFFSET,
            MemDirent { name: String::from("."), id: this, visible: true },
        );
        dir.entries.insert(
            DOT_DOT_OFFSET,
            MemDirent { name: String::from(".."), id: parent, visible: true },
        );
        dir
    }

    fn find(&self, name: &str) -> Option<(u64, &MemDirent)> {
        self.entries
            .iter()
            .find(|(_, de)| de.name == name)
            .map(|(off, de)| (*off, de))
    }

    fn insert(&mut self, name: &str, id: ObjectId) {
        let offset = self.next_offset;
        self.next_offset += 1;
        self.entries.insert(
            offset,
            MemDirent { name: String::from(name), id, visible: true },
        );
        self.version += 1;
    }

    fn remove(&mut self, offset: u64) {
        self.entries.remove(&offset);
        self.version += 1;
    }

    /// 除 "." 和 ".." 外是否还有目录项
    fn is_empty(&self) -> bool {
        self.entries.range(FIRST_ENTRY_OFFSET..).next().is_none()
    }
}

struct MemObject {
    stat: ObjectStat,
    data: Vec<u8>,
    dir: Option<MemDir>,
}

struct MemInner {
    objects: BTreeMap<ObjectId, MemObject>,
    next_id: u64,
    next_generation: u32,
    pending_moves: u32,
    /// 再经过多少次 write_page 后失败一次
    write_fault_after: Option<u32>,
    rmdir_fault: bool,
}

impl MemInner {
    fn object(&self, id: ObjectId) -> Result<&MemObject> {
        self.objects
            .get(&id)
            .ok_or(Error::new(ErrorKind::NotFound, "object not found"))
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut MemObject> {
        self.objects
            .get_mut(&id)
            .ok_or(Error::new(ErrorKind::NotFound, "object not found"))
    }

    fn dir(&self, id: ObjectId) -> Result<&MemDir> {
        self.object(id)?
            .dir
            .as_ref()
            .ok_or(Error::new(ErrorKind::NotDirectory, "object is not a directory"))
    }

    fn dir_mut(&mut self, id: ObjectId) -> Result<&mut MemDir> {
        self.object_mut(id)?
            .dir
            .as_mut()
            .ok_or(Error::new(ErrorKind::NotDirectory, "object is not a directory"))
    }

    fn alloc_id(&mut self) -> (ObjectId, u32) {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        (id, generation)
    }

    /// 创建新对象并挂到父目录下
    fn new_child(
        &mut self,
        parent: ObjectId,
        name: &str,
        mode: u32,
        is_dir: bool,
        format: ObjectFormat,
    ) -> Result<ObjectId> {
        validate_name(name)?;
        let (parent_private, exists) = {
            let parent_obj = self.object(parent)?;
            let dir = parent_obj
                .dir
                .as_ref()
                .ok_or(Error::new(ErrorKind::NotDirectory, "parent is not a directory"))?;
            (parent_obj.stat.private, dir.find(name).is_some())
        };
        if exists {
            return Err(Error::new(ErrorKind::AlreadyExists, "entry already exists"));
        }

        let (id, generation) = self.alloc_id();
        let type_bits = if is_dir { S_IFDIR } else { S_IFREG };
        let stat = ObjectStat {
            id,
            generation,
            format,
            mode: type_bits | (mode & !S_IFMT),
            nlink: if is_dir { 2 } else { 1 },
            size: 0,
            uid: 0,
            gid: 0,
            ctime: 0,
            private: parent_private,
        };
        let dir = if is_dir { Some(MemDir::new(id, parent)) } else { None };
        self.objects.insert(id, MemObject { stat, data: Vec::new(), dir });

        self.dir_mut(parent)?.insert(name, id);
        if is_dir {
            self.object_mut(parent)?.stat.nlink += 1;
        }
        Ok(id)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.len() > NAME_MAX {
        return Err(Error::new(ErrorKind::InvalidInput, "invalid entry name"));
    }
    if name.bytes().any(|b| b == b'/' || b == 0) {
        return Err(Error::new(ErrorKind::InvalidInput, "invalid entry name"));
    }
    Ok(())
}

/// 内存对象存储
///
/// # 示例
///
/// ```rust,ignore
/// let store = MemStore::with_page_size(64);
/// let file = store.create(store.root(), "a", 0o644)?;
/// store.write_page(file, 0, 0, b"hello")?;
/// ```
pub struct MemStore {
    inner: Mutex<MemInner>,
    page_size: usize,
    format: ObjectFormat,
}

impl MemStore {
    /// 创建空存储（默认页大小，当前格式）
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// 创建指定页大小的空存储
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size > XATTR_HEADER_SIZE, "page size too small");
        let mut objects = BTreeMap::new();
        let root = MemObject {
            stat: ObjectStat {
                id: ROOT_ID,
                generation: 0,
                format: ObjectFormat::Current,
                mode: S_IFDIR | 0o755,
                nlink: 2,
                size: 0,
                uid: 0,
                gid: 0,
                ctime: 0,
                private: false,
            },
            data: Vec::new(),
            dir: Some(MemDir::new(ROOT_ID, ROOT_ID)),
        };
        objects.insert(ROOT_ID, root);

        Self {
            inner: Mutex::new(MemInner {
                objects,
                next_id: ROOT_ID.0 + 1,
                next_generation: 1,
                pending_moves: 0,
                write_fault_after: None,
                rmdir_fault: false,
            }),
            page_size,
            format: ObjectFormat::Current,
        }
    }

    /// 设置文件系统格式（新建对象沿用此格式）
    pub fn with_format(mut self, format: ObjectFormat) -> Self {
        self.format = format;
        self.inner.get_mut().objects.values_mut().for_each(|obj| obj.stat.format = format);
        self
    }

    /// 修改单个对象的元数据格式
    pub fn set_object_format(&self, id: ObjectId, format: ObjectFormat) -> Result<()> {
        self.inner.lock().object_mut(id)?.stat.format = format;
        Ok(())
    }

    /// 创建硬链接：在 `dir` 下以 `name` 链接到 `target`
    pub fn link(&self, target: ObjectId, dir: ObjectId, name: &str) -> Result<()> {
        validate_name(name)?;
        let mut inner = self.inner.lock();
        if inner.object(target)?.dir.is_some() {
            return Err(Error::new(ErrorKind::IsDirectory, "cannot link a directory"));
        }
        if inner.dir(dir)?.find(name).is_some() {
            return Err(Error::new(ErrorKind::AlreadyExists, "entry already exists"));
        }
        inner.dir_mut(dir)?.insert(name, target);
        inner.object_mut(target)?.stat.nlink += 1;
        Ok(())
    }

    /// 设置目录项可见性
    pub fn set_entry_visible(&self, dir: ObjectId, name: &str, visible: bool) -> Result<()> {
        let mut inner = self.inner.lock();
        let d = inner.dir_mut(dir)?;
        let offset = d
            .find(name)
            .map(|(off, _)| off)
            .ok_or(Error::new(ErrorKind::NotFound, "entry not found"))?;
        if let Some(de) = d.entries.get_mut(&offset) {
            de.visible = visible;
        }
        Ok(())
    }

    /// 让接下来 `count` 次 `entry_name` 报告目录项已移动
    pub fn inject_entry_moves(&self, count: u32) {
        self.inner.lock().pending_moves = count;
    }

    /// 让 `after` 次成功的 `write_page` 之后的下一次调用返回 `Io`
    pub fn inject_write_fault(&self, after: u32) {
        self.inner.lock().write_fault_after = Some(after);
    }

    /// 让下一次 `rmdir` 返回 `Io`
    pub fn inject_rmdir_fault(&self) {
        self.inner.lock().rmdir_fault = true;
    }

    /// 当前对象数量（含根目录）
    pub fn object_count(&self) -> usize {
        self.inner.lock().objects.len()
    }

    /// 读取整个文件内容
    pub fn read_all(&self, id: ObjectId) -> Result<Vec<u8>> {
        let inner = self.inner.lock();
        let obj = inner.object(id)?;
        if obj.dir.is_some() {
            return Err(Error::new(ErrorKind::IsDirectory, "object is a directory"));
        }
        Ok(obj.data.clone())
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemStore {
    fn root(&self) -> ObjectId {
        ROOT_ID
    }

    fn format(&self) -> ObjectFormat {
        self.format
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn stat(&self, id: ObjectId) -> Result<ObjectStat> {
        let inner = self.inner.lock();
        let obj = inner.object(id)?;
        let mut stat = obj.stat;
        if obj.dir.is_none() {
            stat.size = obj.data.len() as u64;
        }
        Ok(stat)
    }

    fn lookup(&self, dir: ObjectId, name: &str) -> Result<Option<ObjectId>> {
        let inner = self.inner.lock();
        Ok(inner.dir(dir)?.find(name).map(|(_, de)| de.id))
    }

    fn mkdir(&self, dir: ObjectId, name: &str, mode: u32) -> Result<ObjectId> {
        let format = self.format;
        self.inner.lock().new_child(dir, name, mode, true, format)
    }

    fn create(&self, dir: ObjectId, name: &str, mode: u32) -> Result<ObjectId> {
        let format = self.format;
        self.inner.lock().new_child(dir, name, mode, false, format)
    }

    fn unlink(&self, dir: ObjectId, name: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let (offset, id) = inner
            .dir(dir)?
            .find(name)
            .map(|(off, de)| (off, de.id))
            .ok_or(Error::new(ErrorKind::NotFound, "entry not found"))?;
        if inner.object(id)?.dir.is_some() {
            return Err(Error::new(ErrorKind::IsDirectory, "cannot unlink a directory"));
        }

        inner.dir_mut(dir)?.remove(offset);
        let obj = inner.object_mut(id)?;
        obj.stat.nlink -= 1;
        if obj.stat.nlink == 0 {
            inner.objects.remove(&id);
        }
        Ok(())
    }

    fn rmdir(&self, dir: ObjectId, name: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if core::mem::take(&mut inner.rmdir_fault) {
            return Err(Error::new(ErrorKind::Io, "injected rmdir fault"));
        }
        let (offset, id) = inner
            .dir(dir)?
            .find(name)
            .map(|(off, de)| (off, de.id))
            .ok_or(Error::new(ErrorKind::NotFound, "entry not found"))?;
        if !inner.dir(id)?.is_empty() {
            return Err(Error::new(ErrorKind::NotEmpty, "directory not empty"));
        }

        inner.dir_mut(dir)?.remove(offset);
        inner.object_mut(dir)?.stat.nlink -= 1;
        inner.objects.remove(&id);
        Ok(())
    }

    fn set_attr(&self, id: ObjectId, change: &AttrChange) -> Result<()> {
        let mut inner = self.inner.lock();
        let obj = inner.object_mut(id)?;
        if change.valid.contains(AttrValid::SIZE) {
            if obj.dir.is_some() {
                return Err(Error::new(ErrorKind::IsDirectory, "cannot resize a directory"));
            }
            obj.data.resize(change.size as usize, 0);
        }
        if change.valid.contains(AttrValid::UID) {
            obj.stat.uid = change.uid;
        }
        if change.valid.contains(AttrValid::GID) {
            obj.stat.gid = change.gid;
        }
        if change.valid.contains(AttrValid::CTIME) {
            obj.stat.ctime = change.ctime;
        }
        if change.valid.contains(AttrValid::MODE) {
            obj.stat.mode = (obj.stat.mode & S_IFMT) | (change.mode & !S_IFMT);
        }
        Ok(())
    }

    fn read_page(&self, id: ObjectId, index: u64, buf: &mut [u8]) -> Result<()> {
        let inner = self.inner.lock();
        let obj = inner.object(id)?;
        if obj.dir.is_some() {
            return Err(Error::new(ErrorKind::IsDirectory, "cannot read a directory"));
        }

        buf.fill(0);
        let start = index as usize * self.page_size;
        if start < obj.data.len() {
            let end = core::cmp::min(start + buf.len(), obj.data.len());
            buf[..end - start].copy_from_slice(&obj.data[start..end]);
        }
        Ok(())
    }

    fn write_page(&self, id: ObjectId, index: u64, offset: usize, data: &[u8]) -> Result<()> {
        if offset + data.len() > self.page_size {
            return Err(Error::new(ErrorKind::InvalidInput, "write crosses page boundary"));
        }
        let mut inner = self.inner.lock();
        match inner.write_fault_after {
            Some(0) => {
                inner.write_fault_after = None;
                return Err(Error::new(ErrorKind::Io, "injected write fault"));
            }
            Some(n) => inner.write_fault_after = Some(n - 1),
            None => {}
        }
        let obj = inner.object_mut(id)?;
        if obj.dir.is_some() {
            return Err(Error::new(ErrorKind::IsDirectory, "cannot write a directory"));
        }

        let start = index as usize * self.page_size + offset;
        let end = start + data.len();
        if end > obj.data.len() {
            obj.data.resize(end, 0);
        }
        obj.data[start..end].copy_from_slice(data);
        Ok(())
    }

    fn mark_private(&self, id: ObjectId) -> Result<()> {
        self.inner.lock().object_mut(id)?.stat.private = true;
        Ok(())
    }

    fn locate_entry(&self, dir: ObjectId, pos: u64) -> Result<Option<DirSlot>> {
        let inner = self.inner.lock();
        let d = inner.dir(dir)?;
        Ok(d.entries.range(..=pos).next_back().map(|(off, de)| DirSlot {
            offset: *off,
            object_id: de.id,
            visible: de.visible,
            stamp: d.version,
        }))
    }

    fn entry_name(&self, dir: ObjectId, slot: &DirSlot) -> Result<Option<String>> {
        let mut inner = self.inner.lock();
        if inner.pending_moves > 0 {
            inner.pending_moves -= 1;
            return Ok(None);
        }

        let d = inner.dir(dir)?;
        match d.entries.get(&slot.offset) {
            Some(de) if d.version == slot.stamp || de.id == slot.object_id => {
                Ok(Some(de.name.clone()))
            }
            _ => Ok(None),
        }
    }
}
