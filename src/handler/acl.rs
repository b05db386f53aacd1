//! POSIX ACL handler
//!
//! ACL 以 POSIX ACL 扩展属性格式保存：
//!
//! ```text
//! +---------------------+
//! | a_version: u32 (=2) |
//! +---------------------+-------------------+-------------+
//! | e_tag: u16          | e_perm: u16       | e_id: u32   |  × N
//! +---------------------+-------------------+-------------+
//! ```
//!
//! 所有字段小端。写入前校验格式和条目组合，读取时原样返回。

use super::{list_full_name, XattrHandler};
use crate::{
    error::{Error, ErrorKind, Result},
    fs::{XattrFlags, XattrFs},
    store::{ObjectId, ObjectStore},
};
use byteorder::{ByteOrder, LittleEndian};

/// ACL 扩展属性格式版本
pub const POSIX_ACL_XATTR_VERSION: u32 = 0x0002;

const ACL_HEADER_SIZE: usize = 4;
const ACL_ENTRY_SIZE: usize = 8;

const ACL_USER_OBJ: u16 = 0x01;
const ACL_USER: u16 = 0x02;
const ACL_GROUP_OBJ: u16 = 0x04;
const ACL_GROUP: u16 = 0x08;
const ACL_MASK: u16 = 0x10;
const ACL_OTHER: u16 = 0x20;

/// ACL 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclKind {
    /// 访问 ACL
    Access,
    /// 默认 ACL（仅目录）
    Default,
}

impl AclKind {
    /// 对应的属性名
    pub const fn xattr_name(self) -> &'static str {
        match self {
            AclKind::Access => "system.posix_acl_access",
            AclKind::Default => "system.posix_acl_default",
        }
    }
}

/// 校验 POSIX ACL 扩展属性值
///
/// 返回条目数。要求：
/// - 版本为 2，长度为 4 + 8 × N
/// - 权限位不超过 rwx
/// - USER_OBJ / GROUP_OBJ / OTHER 各恰好一个
/// - 有命名 USER/GROUP 条目时必须有 MASK，MASK 最多一个
pub fn validate_acl(value: &[u8]) -> Result<usize> {
    if value.len() < ACL_HEADER_SIZE || (value.len() - ACL_HEADER_SIZE) % ACL_ENTRY_SIZE != 0 {
        return Err(Error::new(ErrorKind::InvalidInput, "bad ACL length"));
    }
    if LittleEndian::read_u32(&value[..ACL_HEADER_SIZE]) != POSIX_ACL_XATTR_VERSION {
        return Err(Error::new(ErrorKind::InvalidInput, "bad ACL version"));
    }

    let (mut user_obj, mut group_obj, mut other, mut mask, mut named) = (0, 0, 0, 0, 0);
    let entries = value[ACL_HEADER_SIZE..].chunks_exact(ACL_ENTRY_SIZE);
    let count = entries.len();
    for entry in entries {
        let tag = LittleEndian::read_u16(&entry[0..2]);
        let perm = LittleEndian::read_u16(&entry[2..4]);
        if perm & !0o7 != 0 {
            return Err(Error::new(ErrorKind::InvalidInput, "bad ACL permission"));
        }
        match tag {
            ACL_USER_OBJ => user_obj += 1,
            ACL_GROUP_OBJ => group_obj += 1,
            ACL_OTHER => other += 1,
            ACL_MASK => mask += 1,
            ACL_USER | ACL_GROUP => named += 1,
            _ => return Err(Error::new(ErrorKind::InvalidInput, "bad ACL tag")),
        }
    }

    if user_obj != 1 || group_obj != 1 || other != 1 || mask > 1 || (named > 0 && mask == 0) {
        return Err(Error::new(ErrorKind::InvalidInput, "malformed ACL"));
    }
    Ok(count)
}

/// POSIX ACL handler
pub struct PosixAclHandler {
    kind: AclKind,
}

impl PosixAclHandler {
    /// 创建指定类型的 ACL handler
    pub const fn new(kind: AclKind) -> Self {
        Self { kind }
    }

    /// ACL 类型
    pub fn kind(&self) -> AclKind {
        self.kind
    }

    fn check<S: ObjectStore>(&self, fs: &XattrFs<S>, name: &str) -> Result<()> {
        if name != self.kind.xattr_name() {
            return Err(Error::new(ErrorKind::InvalidInput, "bad ACL xattr name"));
        }
        if !fs.posixacl_enabled() {
            return Err(Error::new(ErrorKind::Unsupported, "POSIX ACLs not enabled"));
        }
        Ok(())
    }
}

impl<S: ObjectStore> XattrHandler<S> for PosixAclHandler {
    fn prefix(&self) -> &str {
        self.kind.xattr_name()
    }

    fn get(&self, fs: &XattrFs<S>, obj: ObjectId, name: &str, buf: Option<&mut [u8]>) -> Result<usize> {
        self.check(fs, name)?;
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
        self.check(fs, name)?;

        // 空值即删除 ACL，不存在也不算错误
        let value = match value {
            Some(value) if !value.is_empty() => value,
            _ => {
                return match fs.xattr_del(obj, name) {
                    Err(err) if err.is_no_attribute() => Ok(()),
                    other => other,
                };
            }
        };

        if self.kind == AclKind::Default && !fs.store().stat(obj)?.is_dir() {
            return Err(Error::new(ErrorKind::InvalidInput, "default ACL on non-directory"));
        }
        validate_acl(value)?;
        fs.xattr_set(obj, name, value, flags)
    }

    fn del(&self, fs: &XattrFs<S>, _obj: ObjectId, name: &str) -> Result<()> {
        self.check(fs, name)
    }

    fn list(&self, fs: &XattrFs<S>, _obj: ObjectId, name: &str, out: Option<&mut [u8]>) -> usize {
        if !fs.posixacl_enabled() {
            return 0;
        }
        list_full_name(name, out)
    }
}
