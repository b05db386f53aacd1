//! 无额外语义的命名空间 handler（`trusted.`、`security.`）

use super::{check_suffix, list_full_name, XattrHandler};
use crate::{
    error::Result,
    fs::{XattrFlags, XattrFs},
    store::{ObjectId, ObjectStore},
};

/// 透传型命名空间 handler
///
/// 只检查属性名，值原样存取
pub struct NamespaceHandler {
    prefix: &'static str,
}

impl NamespaceHandler {
    /// 自定义前缀
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }

    /// `trusted.` 命名空间
    pub const fn trusted() -> Self {
        Self::new("trusted.")
    }

    /// `security.` 命名空间
    pub const fn security() -> Self {
        Self::new("security.")
    }
}

impl<S: ObjectStore> XattrHandler<S> for NamespaceHandler {
    fn prefix(&self) -> &str {
        self.prefix
    }

    fn get(&self, fs: &XattrFs<S>, obj: ObjectId, name: &str, buf: Option<&mut [u8]>) -> Result<usize> {
        check_suffix(self.prefix, name)?;
        fs.xattr_get(obj, name, buf)
    }

    fn set(
        &self,
        fs: &XattrFs<S>,
        obj: ObjectId,
        name: &str,
        value: Option<&[u8]>,
        flags: XattrFlags,
    ) -> Result<()> {
        check_suffix(self.prefix, name)?;
        match value {
            Some(value) => fs.xattr_set(obj, name, value, flags),
            None => fs.xattr_del(obj, name),
        }
    }

    fn list(&self, _fs: &XattrFs<S>, _obj: ObjectId, name: &str, out: Option<&mut [u8]>) -> usize {
        list_full_name(name, out)
    }
}
