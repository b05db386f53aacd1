//! xattr 公共 API
//!
//! 调用者面向的四个入口：按属性名找到命名空间 handler，
//! 检查扩展属性是否可用，取树锁后交给 handler 处理。

use crate::{
    error::{Error, ErrorKind, Result},
    fs::{XattrFlags, XattrFs},
    handler::XattrHandler,
    store::{ObjectId, ObjectStore},
};
use alloc::sync::Arc;

impl<S: ObjectStore> XattrFs<S> {
    /// 找到属性名对应的 handler，并检查对象能否使用扩展属性
    fn prepare(&self, obj: ObjectId, name: &str) -> Result<Arc<dyn XattrHandler<S>>> {
        let handler = self
            .registry
            .resolve(name)
            .ok_or(Error::new(ErrorKind::Unsupported, "no handler for xattr namespace"))?;
        self.check_object(obj)?;
        Ok(handler)
    }

    fn check_object(&self, obj: ObjectId) -> Result<()> {
        if !self.xattrs_enabled() {
            return Err(Error::new(ErrorKind::Unsupported, "xattrs not enabled"));
        }
        if self.store.stat(obj)?.is_legacy() {
            return Err(Error::new(ErrorKind::Unsupported, "legacy object has no xattrs"));
        }
        Ok(())
    }

    /// 读取扩展属性
    ///
    /// # 参数
    ///
    /// * `obj` - 对象
    /// * `name` - 完整属性名（如 "user.comment"）
    /// * `buf` - 输出缓冲区；None 时只查询大小
    ///
    /// # 返回
    ///
    /// 属性值长度
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let len = fs.getxattr(obj, "user.comment", None)?;
    /// let mut buf = vec![0u8; len];
    /// fs.getxattr(obj, "user.comment", Some(&mut buf))?;
    /// ```
    pub fn getxattr(&self, obj: ObjectId, name: &str, buf: Option<&mut [u8]>) -> Result<usize> {
        let handler = self.prepare(obj, name)?;
        let _tree = self.tree_lock.read();
        handler.get(self, obj, name, buf)
    }

    /// 设置扩展属性
    ///
    /// # 参数
    ///
    /// * `obj` - 对象
    /// * `name` - 完整属性名
    /// * `value` - 属性值
    /// * `flags` - `CREATE` 或 `REPLACE`，为空时创建或覆盖
    pub fn setxattr(&self, obj: ObjectId, name: &str, value: &[u8], flags: XattrFlags) -> Result<()> {
        let handler = self.prepare(obj, name)?;
        let _tree = self.tree_lock.write();
        handler.set(self, obj, name, Some(value), flags)
    }

    /// 删除扩展属性
    ///
    /// 先调用 handler 的删除前钩子，再删除记录。
    /// 最后一个属性被删除后，属性目录一并移除。
    pub fn removexattr(&self, obj: ObjectId, name: &str) -> Result<()> {
        let handler = self.prepare(obj, name)?;
        let _tree = self.tree_lock.write();
        handler.del(self, obj, name)?;

        let stat = self.store.stat(obj)?;
        self.del_record(&stat, name)?;

        // 属性已删除，回收目录失败不影响结果
        let pruned = self
            .open_xattr_dir(&stat, XattrFlags::READONLY)
            .and_then(|dir| self.remove_xattr_dir_if_empty(&stat, dir));
        if let Err(err) = pruned {
            log::warn!("Couldn't remove empty xattr dir of object {} ({})", obj, err);
        }
        Ok(())
    }

    /// 列出扩展属性
    ///
    /// # 参数
    ///
    /// * `obj` - 对象
    /// * `buf` - 输出缓冲区（名称以 \0 分隔）；None 时只查询大小
    ///
    /// # 返回
    ///
    /// 列表总长度（含每个名称后的 \0）
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let mut buffer = vec![0u8; 1024];
    /// let len = fs.listxattr(obj, Some(&mut buffer))?;
    /// // buffer 包含: "user.comment\0security.selinux\0"
    /// ```
    ///
    /// # 实现说明
    ///
    /// 没有 handler 的目录项、handler 不愿列出的属性（如未启用的 `user.`）不计入。
    /// 缓冲区放不下时已放下的名称照常写入，最终返回 `RangeTooSmall`。
    pub fn listxattr(&self, obj: ObjectId, mut buf: Option<&mut [u8]>) -> Result<usize> {
        self.check_object(obj)?;
        let stat = self.store.stat(obj)?;

        let _tree = self.tree_lock.read();
        let dir = match self.open_xattr_dir(&stat, XattrFlags::READONLY) {
            Ok(dir) => dir,
            Err(err) if err.is_no_attribute() => return Ok(0),
            Err(err) => return Err(err),
        };

        let size = buf.as_ref().map_or(0, |b| b.len());
        let mut pos = 0usize;
        self.xattr_readdir(dir, |name, _slot| {
            let handler = match self.registry.resolve(name) {
                Some(handler) => handler,
                None => return Ok(()),
            };
            let len = handler.list(self, obj, name, None);
            if len == 0 {
                return Ok(());
            }

            if let Some(out) = buf.as_deref_mut() {
                if pos + len + 1 <= size {
                    handler.list(self, obj, name, Some(&mut out[pos..pos + len]));
                    out[pos + len] = 0;
                }
            }
            pos += len + 1;
            Ok(())
        })?;

        if buf.is_some() && pos > size {
            return Err(Error::new(ErrorKind::RangeTooSmall, "xattr list buffer too small"));
        }
        Ok(pos)
    }
}
