//! 属性记录头
//!
//! ```text
//! +--------------+--------------+-------------------+
//! | magic: u32   | hash: u32    | payload ...       |
//! +--------------+--------------+-------------------+
//! ```
//!
//! 两个字段均为小端。hash 是 payload 的校验和，空 payload 为 0。

use crate::{
    consts::{XATTR_HEADER_SIZE, XATTR_MAGIC},
    error::{Error, ErrorKind, Result},
};
use byteorder::{ByteOrder, LittleEndian};

/// 属性记录头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// magic
    pub magic: u32,
    /// payload 校验和
    pub hash: u32,
}

impl RecordHeader {
    /// 以给定校验和创建记录头
    pub const fn new(hash: u32) -> Self {
        Self {
            magic: XATTR_MAGIC,
            hash,
        }
    }

    /// 编码到 `buf` 开头
    pub fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], self.magic);
        LittleEndian::write_u32(&mut buf[4..8], self.hash);
    }

    /// 编码为字节数组
    pub fn to_bytes(&self) -> [u8; XATTR_HEADER_SIZE] {
        let mut buf = [0u8; XATTR_HEADER_SIZE];
        self.encode(&mut buf);
        buf
    }

    /// 从 `buf` 开头解码并校验 magic
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < XATTR_HEADER_SIZE {
            return Err(Error::new(ErrorKind::Corrupted, "xattr header truncated"));
        }
        let header = Self {
            magic: LittleEndian::read_u32(&buf[0..4]),
            hash: LittleEndian::read_u32(&buf[4..8]),
        };
        if header.magic != XATTR_MAGIC {
            return Err(Error::new(ErrorKind::Corrupted, "xattr magic mismatch"));
        }
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let bytes = RecordHeader::new(0x1122_3344).to_bytes();
        assert_eq!(bytes, [0x41, 0x58, 0x46, 0x52, 0x44, 0x33, 0x22, 0x11]);
        assert_eq!(RecordHeader::decode(&bytes).unwrap().hash, 0x1122_3344);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = RecordHeader::new(0).to_bytes();
        bytes[0] ^= 0xff;
        let err = RecordHeader::decode(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_truncated_header() {
        let err = RecordHeader::decode(&[0x41, 0x58]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }
}
