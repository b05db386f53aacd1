//! 扩展属性命名空间处理器
//!
//! 每个命名空间（如 `user.`、`system.posix_acl_access`）由一个
//! [`XattrHandler`] 负责。调用者传入的属性名先经 [`HandlerRegistry`]
//! 按前缀分派，再由 handler 调用 [`XattrFs`] 的通用记录操作。
//!
//! # 内置 handler
//!
//! | 前缀 | handler | 启用条件 |
//! |------|---------|----------|
//! | `user.` | [`UserHandler`] | `XATTRS_USER` |
//! | `trusted.` | [`NamespaceHandler`] | 总是 |
//! | `security.` | [`NamespaceHandler`] | 总是 |
//! | `system.posix_acl_access` | [`PosixAclHandler`] | `POSIXACL` |
//! | `system.posix_acl_default` | [`PosixAclHandler`] | `POSIXACL` |

mod registry;
mod user;
mod namespace;
mod acl;

pub use acl::{validate_acl, AclKind, PosixAclHandler};
pub use namespace::NamespaceHandler;
pub use registry::HandlerRegistry;
pub use user::UserHandler;

#[cfg(test)]
pub(crate) use acl::tests::{acl_bytes, minimal_acl};

use crate::{
    error::{Error, ErrorKind, Result},
    fs::{XattrFlags, XattrFs},
    store::{ObjectId, ObjectStore},
};

/// 命名空间处理器
///
/// `get`/`set`/`list` 必须实现，`del` 是可选的删除前钩子。
pub trait XattrHandler<S: ObjectStore>: Send + Sync {
    /// 命名空间前缀
    fn prefix(&self) -> &str;

    /// 读取属性
    ///
    /// `buf` 为 None 时只返回所需大小
    fn get(&self, fs: &XattrFs<S>, obj: ObjectId, name: &str, buf: Option<&mut [u8]>)
        -> Result<usize>;

    /// 设置属性，`value` 为 None 表示删除
    fn set(
        &self,
        fs: &XattrFs<S>,
        obj: ObjectId,
        name: &str,
        value: Option<&[u8]>,
        flags: XattrFlags,
    ) -> Result<()>;

    /// 列出属性名
    ///
    /// 返回该属性在列表中占用的字节数（不含结尾的 NUL），
    /// 返回 0 表示不列出。`out` 为 None 时只计算长度。
    fn list(&self, fs: &XattrFs<S>, obj: ObjectId, name: &str, out: Option<&mut [u8]>) -> usize;

    /// 删除前钩子
    fn del(&self, _fs: &XattrFs<S>, _obj: ObjectId, _name: &str) -> Result<()> {
        Ok(())
    }
}

/// 把完整属性名写入列表缓冲区，返回名称长度
pub fn list_full_name(name: &str, out: Option<&mut [u8]>) -> usize {
    if let Some(out) = out {
        let len = core::cmp::min(out.len(), name.len());
        out[..len].copy_from_slice(&name.as_bytes()[..len]);
    }
    name.len()
}

/// 检查属性名在前缀之后还有内容
pub(crate) fn check_suffix(prefix: &str, name: &str) -> Result<()> {
    if name.len() <= prefix.len() {
        return Err(Error::new(ErrorKind::InvalidInput, "xattr name has no suffix"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_full_name() {
        let mut buf = [0u8; 16];
        assert_eq!(list_full_name("user.a", None), 6);
        assert_eq!(list_full_name("user.a", Some(&mut buf[..6])), 6);
        assert_eq!(&buf[..6], b"user.a");
    }

    #[test]
    fn test_check_suffix() {
        assert!(check_suffix("user.", "user.x").is_ok());
        let err = check_suffix("user.", "user.").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
