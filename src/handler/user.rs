//! `user.` 命名空间 handler
//!
//! 只有挂载时启用了 `XATTRS_USER` 才可读写；未启用时列表中也不出现。

use super::{check_suffix, list_full_name, XattrHandler};
use crate::{
    error::{Error, ErrorKind, Result},
    fs::{XattrFlags, XattrFs},
    store::{ObjectId, ObjectStore},
};

const USER_PREFIX: &str = "user.";

/// 用户属性 handler
pub struct UserHandler;

impl UserHandler {
    fn check<S: ObjectStore>(fs: &XattrFs<S>, name: &str) -> Result<()> {
        check_suffix(USER_PREFIX, name)?;
        if !fs.user_xattrs_enabled() {
            return Err(Error::new(ErrorKind::Unsupported, "user xattrs not enabled"));
        }
        Ok(())
    }
}

impl<S: ObjectStore> XattrHandler<S> for UserHandler {
    fn prefix(&self) -> &str {
        USER_PREFIX
    }

    fn get(&self, fs: &XattrFs<S>, obj: ObjectId, name: &str, buf: Option<&mut [u8]>) -> Result<usize> {
        Self::check(fs, name)?;
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
        Self::check(fs, name)?;
        match value {
            Some(value) => fs.xattr_set(obj, name, value, flags),
            None => fs.xattr_del(obj, name),
        }
    }

    fn list(&self, fs: &XattrFs<S>, _obj: ObjectId, name: &str, out: Option<&mut [u8]>) -> usize {
        if !fs.user_xattrs_enabled() {
            return 0;
        }
        list_full_name(name, out)
    }

    fn del(&self, fs: &XattrFs<S>, _obj: ObjectId, name: &str) -> Result<()> {
        Self::check(fs, name)
    }
}
