//! 属性记录读写
//!
//! 记录按页读写：第一页是记录头加 payload 的开头，之后每页都是 payload。
//! 写入前把记录大小调整为 `头部 + payload`，读取时流式计算校验和。

use super::{record::RecordHeader, root::RecordLookup};
use crate::{
    consts::XATTR_HEADER_SIZE,
    crc::{xattr_hash, XattrHasher},
    error::{Error, ErrorKind, Result},
    fs::{XattrFlags, XattrFs},
    store::{AttrChange, ObjectId, ObjectStore},
};
use alloc::vec;
use core::cmp::min;

impl<S: ObjectStore> XattrFs<S> {
    /// 写入属性记录
    ///
    /// # 参数
    ///
    /// * `obj` - 属性所属对象
    /// * `name` - 完整属性名（含命名空间前缀）
    /// * `value` - 属性值，可以为空
    /// * `flags` - `CREATE`：已存在则失败；`REPLACE`：不存在则失败
    ///
    /// # 实现说明
    ///
    /// 记录被多个目录项共享（`nlink > 1`）时先删除本目录的目录项，
    /// 去掉 `REPLACE` 后重新创建，共享的数据不被修改。
    /// 页写入失败时立即返回，已写入的页不回滚，下次读取时校验和不匹配。
    ///
    /// 只应在 [`XattrHandler`](crate::handler::XattrHandler) 的分派中调用，
    /// 此时 [`setxattr`](Self::setxattr) 已持有树写锁。
    pub fn xattr_set(
        &self,
        obj: ObjectId,
        name: &str,
        value: &[u8],
        flags: XattrFlags,
    ) -> Result<()> {
        let stat = self.store.stat(obj)?;
        if stat.is_legacy() {
            return Err(Error::new(ErrorKind::Unsupported, "legacy object has no xattrs"));
        }

        let page_size = self.store.page_size();
        if page_size <= XATTR_HEADER_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "page too small for xattr header"));
        }

        let hash = xattr_hash(value);
        let mut flags = flags;
        let record = loop {
            let record = match self.resolve_record(&stat, name, flags)? {
                RecordLookup::Found(id) => id,
                RecordLookup::Missing => {
                    return Err(Error::new(ErrorKind::NoAttribute, "xattr not found"));
                }
            };

            if self.store.stat(record)?.nlink > 1 {
                log::debug!("[XATTR] record {} of {} is shared, copy on write", name, obj);
                self.del_record(&stat, name)?;
                flags.remove(XattrFlags::REPLACE);
                continue;
            }
            break record;
        };

        let total = XATTR_HEADER_SIZE + value.len();
        self.store.set_attr(record, &AttrChange::resize(total as u64))?;

        let mut page_buf = vec![0u8; page_size];
        let mut page = 0u64;
        let mut value_pos = 0usize;
        loop {
            let written = if page == 0 {
                let chunk = min(value.len(), page_size - XATTR_HEADER_SIZE);
                RecordHeader::new(hash).encode(&mut page_buf);
                page_buf[XATTR_HEADER_SIZE..XATTR_HEADER_SIZE + chunk]
                    .copy_from_slice(&value[..chunk]);
                self.store.write_page(record, 0, 0, &page_buf[..XATTR_HEADER_SIZE + chunk])?;
                chunk
            } else {
                let chunk = min(value.len() - value_pos, page_size);
                self.store
                    .write_page(record, page, 0, &value[value_pos..value_pos + chunk])?;
                chunk
            };

            value_pos += written;
            page += 1;
            if value_pos >= value.len() {
                break;
            }
        }

        log::trace!("[XATTR] set {} on {} ({} bytes, {} pages)", name, obj, value.len(), page);
        Ok(())
    }

    /// 读取属性记录
    ///
    /// # 返回
    ///
    /// payload 长度。`buf` 为 None 时只返回长度，不校验数据。
    ///
    /// # 错误
    ///
    /// * `NoAttribute` - 属性不存在
    /// * `RangeTooSmall` - `buf` 放不下 payload
    /// * `Corrupted` - 记录过短、magic 或校验和不匹配
    ///
    /// 只应在 [`XattrHandler`](crate::handler::XattrHandler) 的分派中调用，
    /// 此时 [`getxattr`](Self::getxattr) 已持有树读锁。
    pub fn xattr_get(&self, obj: ObjectId, name: &str, buf: Option<&mut [u8]>) -> Result<usize> {
        let stat = self.store.stat(obj)?;
        if stat.is_legacy() {
            return Err(Error::new(ErrorKind::Unsupported, "legacy object has no xattrs"));
        }

        let record = match self.resolve_record(&stat, name, XattrFlags::READONLY)? {
            RecordLookup::Found(id) => id,
            RecordLookup::Missing => {
                return Err(Error::new(ErrorKind::NoAttribute, "xattr not found"));
            }
        };

        let size = self.store.stat(record)?.size as usize;
        if size < XATTR_HEADER_SIZE {
            return Err(Error::new(ErrorKind::Corrupted, "xattr record truncated"));
        }
        let needed = size - XATTR_HEADER_SIZE;

        let buf = match buf {
            Some(buf) => buf,
            None => return Ok(needed),
        };
        if buf.len() < needed {
            return Err(Error::new(ErrorKind::RangeTooSmall, "xattr buffer too small"));
        }

        let page_size = self.store.page_size();
        let mut page_buf = vec![0u8; page_size];
        self.store.read_page(record, 0, &mut page_buf)?;
        let header = RecordHeader::decode(&page_buf).map_err(|err| {
            log::warn!("Invalid magic for xattr ({}) associated with object {}", name, obj);
            err
        })?;

        let mut hasher = XattrHasher::new();
        let mut copied = 0usize;
        let mut page = 0u64;
        let mut offset = XATTR_HEADER_SIZE;
        loop {
            let chunk = min(needed - copied, page_size - offset);
            let data = &page_buf[offset..offset + chunk];
            buf[copied..copied + chunk].copy_from_slice(data);
            hasher.update(data);
            copied += chunk;
            if copied >= needed {
                break;
            }
            page += 1;
            offset = 0;
            self.store.read_page(record, page, &mut page_buf)?;
        }

        if hasher.finalize() != header.hash {
            log::warn!("Invalid hash for xattr ({}) associated with object {}", name, obj);
            return Err(Error::new(ErrorKind::Corrupted, "xattr hash mismatch"));
        }
        Ok(needed)
    }
}

#[cfg(test)]
mod tests {
    use crate::xattr::testing::{mounted_fs, new_file, record_of};
    use super::*;
    use crate::{
        fs::MountOptions,
        store::{MemStore, ObjectFormat},
    };
    use alloc::vec::Vec;

    fn read(fs: &XattrFs<MemStore>, obj: ObjectId, name: &str) -> Result<Vec<u8>> {
        let len = fs.xattr_get(obj, name, None)?;
        let mut buf = vec![0u8; len];
        let got = fs.xattr_get(obj, name, Some(&mut buf))?;
        assert_eq!(got, len);
        Ok(buf)
    }

    #[test]
    fn test_set_get_roundtrip() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");

        fs.xattr_set(obj, "user.comment", b"hello", XattrFlags::empty()).unwrap();
        assert_eq!(read(&fs, obj, "user.comment").unwrap(), b"hello");

        // 覆盖为更短的值，记录随之缩短
        fs.xattr_set(obj, "user.comment", b"hi", XattrFlags::empty()).unwrap();
        assert_eq!(read(&fs, obj, "user.comment").unwrap(), b"hi");
        let record = record_of(&fs, obj, "user.comment");
        assert_eq!(fs.store().stat(record).unwrap().size, (XATTR_HEADER_SIZE + 2) as u64);
    }

    #[test]
    fn test_empty_value() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");

        fs.xattr_set(obj, "user.empty", b"", XattrFlags::empty()).unwrap();
        assert_eq!(fs.xattr_get(obj, "user.empty", None).unwrap(), 0);
        let mut buf = [0u8; 0];
        assert_eq!(fs.xattr_get(obj, "user.empty", Some(&mut buf)).unwrap(), 0);

        let record = record_of(&fs, obj, "user.empty");
        let data = fs.store().read_all(record).unwrap();
        assert_eq!(data, RecordHeader::new(0).to_bytes());
    }

    #[test]
    fn test_multi_page_value() {
        let fs = mounted_fs(MemStore::with_page_size(16), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");
        let value: Vec<u8> = (0..100u8).collect();

        fs.xattr_set(obj, "user.big", &value, XattrFlags::empty()).unwrap();
        assert_eq!(read(&fs, obj, "user.big").unwrap(), value);

        let record = record_of(&fs, obj, "user.big");
        let data = fs.store().read_all(record).unwrap();
        assert_eq!(data.len(), XATTR_HEADER_SIZE + value.len());
        assert_eq!(&data[XATTR_HEADER_SIZE..], &value[..]);
        assert_eq!(RecordHeader::decode(&data).unwrap().hash, xattr_hash(&value));
    }

    #[test]
    fn test_value_filling_first_page_exactly() {
        let fs = mounted_fs(MemStore::with_page_size(16), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");
        let value = [7u8; 8];

        fs.xattr_set(obj, "user.exact", &value, XattrFlags::empty()).unwrap();
        assert_eq!(read(&fs, obj, "user.exact").unwrap(), value);
    }

    #[test]
    fn test_corrupted_payload_detected() {
        let fs = mounted_fs(MemStore::with_page_size(16), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");
        let value = [0x5au8; 40];
        fs.xattr_set(obj, "user.data", &value, XattrFlags::empty()).unwrap();

        // 改写第三页中的一个字节
        let record = record_of(&fs, obj, "user.data");
        fs.store().write_page(record, 2, 3, &[0xa5]).unwrap();

        let mut buf = [0u8; 40];
        let err = fs.xattr_get(obj, "user.data", Some(&mut buf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
        // 只查询大小时不校验
        assert_eq!(fs.xattr_get(obj, "user.data", None).unwrap(), 40);
    }

    #[test]
    fn test_bad_magic_and_truncated_record() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");
        fs.xattr_set(obj, "user.a", b"abc", XattrFlags::empty()).unwrap();
        let record = record_of(&fs, obj, "user.a");

        fs.store().write_page(record, 0, 0, &[0, 0, 0, 0]).unwrap();
        let mut buf = [0u8; 3];
        let err = fs.xattr_get(obj, "user.a", Some(&mut buf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);

        fs.store().set_attr(record, &AttrChange::resize(4)).unwrap();
        let err = fs.xattr_get(obj, "user.a", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_write_fault_leaves_record_corrupted() {
        let store = MemStore::with_page_size(16);
        let fs = mounted_fs(store, MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");
        fs.xattr_set(obj, "user.data", &[b'a'; 40], XattrFlags::empty()).unwrap();

        // 第一页写入成功，第二页失败
        fs.store().inject_write_fault(1);
        let err = fs
            .xattr_set(obj, "user.data", &[b'b'; 40], XattrFlags::empty())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);

        assert_eq!(fs.xattr_get(obj, "user.data", None).unwrap(), 40);
        let mut buf = [0u8; 40];
        let err = fs.xattr_get(obj, "user.data", Some(&mut buf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);

        // 重新写入后恢复
        fs.xattr_set(obj, "user.data", &[b'c'; 40], XattrFlags::empty()).unwrap();
        assert_eq!(read(&fs, obj, "user.data").unwrap(), [b'c'; 40]);
    }

    #[test]
    fn test_buffer_too_small() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");
        fs.xattr_set(obj, "user.a", b"abcdef", XattrFlags::empty()).unwrap();

        let mut buf = [0xffu8; 5];
        let err = fs.xattr_get(obj, "user.a", Some(&mut buf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RangeTooSmall);
        assert_eq!(buf, [0xff; 5]);

        let mut larger = [0u8; 32];
        assert_eq!(fs.xattr_get(obj, "user.a", Some(&mut larger)).unwrap(), 6);
        assert_eq!(&larger[..6], b"abcdef");
    }

    #[test]
    fn test_create_and_replace_flags() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");

        let err = fs.xattr_set(obj, "user.a", b"x", XattrFlags::REPLACE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoAttribute);

        fs.xattr_set(obj, "user.a", b"x", XattrFlags::CREATE).unwrap();
        let err = fs.xattr_set(obj, "user.a", b"y", XattrFlags::CREATE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(read(&fs, obj, "user.a").unwrap(), b"x");

        fs.xattr_set(obj, "user.a", b"y", XattrFlags::REPLACE).unwrap();
        assert_eq!(read(&fs, obj, "user.a").unwrap(), b"y");

        let err = fs.xattr_set(obj, "user.b", b"x", XattrFlags::REPLACE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoAttribute);
    }

    #[test]
    fn test_missing_attribute() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "f");

        let err = fs.xattr_get(obj, "user.none", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoAttribute);

        fs.xattr_set(obj, "user.a", b"x", XattrFlags::empty()).unwrap();
        let err = fs.xattr_get(obj, "user.none", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoAttribute);
    }

    #[test]
    fn test_legacy_object_unsupported() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let obj = new_file(&fs, "old");
        fs.store().set_object_format(obj, ObjectFormat::Legacy).unwrap();

        let err = fs.xattr_set(obj, "user.a", b"x", XattrFlags::empty()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        let err = fs.xattr_get(obj, "user.a", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_copy_on_write_shared_record() {
        let fs = mounted_fs(MemStore::new(), MountOptions::XATTRS_USER);
        let a = new_file(&fs, "a");
        let b = new_file(&fs, "b");

        fs.xattr_set(a, "user.shared", b"original", XattrFlags::empty()).unwrap();
        fs.xattr_set(b, "user.other", b"x", XattrFlags::empty()).unwrap();

        // 让 b 的属性目录与 a 共享同一条记录
        let shared = record_of(&fs, a, "user.shared");
        let b_stat = fs.store().stat(b).unwrap();
        let b_dir = fs.open_xattr_dir(&b_stat, XattrFlags::READONLY).unwrap();
        fs.store().link(shared, b_dir, "user.shared").unwrap();
        assert_eq!(fs.store().stat(shared).unwrap().nlink, 2);

        fs.xattr_set(b, "user.shared", b"changed", XattrFlags::REPLACE).unwrap();

        assert_eq!(read(&fs, a, "user.shared").unwrap(), b"original");
        assert_eq!(read(&fs, b, "user.shared").unwrap(), b"changed");
        assert_ne!(record_of(&fs, b, "user.shared"), shared);
        assert_eq!(fs.store().stat(shared).unwrap().nlink, 1);
    }
}
