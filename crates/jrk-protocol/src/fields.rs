//! 字段类型系统
//!
//! schema 中的每个字段由 `(name, kind)` 描述，配合一对读写函数组成
//! [`FieldSpec`]。记录类型通过 [`jrk_record!`] 宏一次性生成：
//! 字段结构体、有序字段表、按名查找和通用 encode/decode，
//! 任何字段都不需要手写专属访问代码。

use crate::ProtocolError;

/// 字段的原语类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    U16,
    I16,
    U32,
    Bool,
}

impl FieldKind {
    /// 编码后的字节宽度
    pub const fn size(self) -> usize {
        match self {
            FieldKind::U8 | FieldKind::Bool => 1,
            FieldKind::U16 | FieldKind::I16 => 2,
            FieldKind::U32 => 4,
        }
    }
}

/// 字段值（与 [`FieldKind`] 一一对应的 tagged union）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    I16(i16),
    U32(u32),
    Bool(bool),
}

impl FieldValue {
    /// 值对应的原语类型
    pub fn kind(self) -> FieldKind {
        match self {
            FieldValue::U8(_) => FieldKind::U8,
            FieldValue::U16(_) => FieldKind::U16,
            FieldValue::I16(_) => FieldKind::I16,
            FieldValue::U32(_) => FieldKind::U32,
            FieldValue::Bool(_) => FieldKind::Bool,
        }
    }

    /// 宽化为 i64（所有字段类型都能无损表示）
    pub fn as_i64(self) -> i64 {
        match self {
            FieldValue::U8(v) => v as i64,
            FieldValue::U16(v) => v as i64,
            FieldValue::I16(v) => v as i64,
            FieldValue::U32(v) => v as i64,
            FieldValue::Bool(v) => v as i64,
        }
    }

    /// 按目标类型做范围检查的窄化转换
    ///
    /// 配置加载和命令参数都以 i64 进入，越界一律拒绝而不是截断。
    pub fn from_i64(kind: FieldKind, value: i64) -> Result<Self, ProtocolError> {
        let out_of_range = ProtocolError::OutOfRange { kind, value };
        match kind {
            FieldKind::U8 => u8::try_from(value).map(FieldValue::U8).map_err(|_| out_of_range),
            FieldKind::U16 => u16::try_from(value).map(FieldValue::U16).map_err(|_| out_of_range),
            FieldKind::I16 => i16::try_from(value).map(FieldValue::I16).map_err(|_| out_of_range),
            FieldKind::U32 => u32::try_from(value).map(FieldValue::U32).map_err(|_| out_of_range),
            FieldKind::Bool => match value {
                0 => Ok(FieldValue::Bool(false)),
                1 => Ok(FieldValue::Bool(true)),
                _ => Err(out_of_range),
            },
        }
    }

    /// 从 little-endian 字节解码
    ///
    /// 调用方（记录的 `decode`）保证 `bytes` 至少有 `kind.size()` 字节。
    pub(crate) fn decode(kind: FieldKind, bytes: &[u8]) -> FieldValue {
        match kind {
            FieldKind::U8 => FieldValue::U8(bytes[0]),
            FieldKind::Bool => FieldValue::Bool(bytes[0] != 0),
            FieldKind::U16 => FieldValue::U16(u16::from_le_bytes([bytes[0], bytes[1]])),
            FieldKind::I16 => FieldValue::I16(i16::from_le_bytes([bytes[0], bytes[1]])),
            FieldKind::U32 => {
                FieldValue::U32(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            },
        }
    }

    /// 追加 little-endian 编码
    pub(crate) fn encode_into(self, buf: &mut Vec<u8>) {
        match self {
            FieldValue::U8(v) => buf.push(v),
            FieldValue::Bool(v) => buf.push(v as u8),
            FieldValue::U16(v) => buf.extend_from_slice(&v.to_le_bytes()),
            FieldValue::I16(v) => buf.extend_from_slice(&v.to_le_bytes()),
            FieldValue::U32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::U8(v) => write!(f, "{v}"),
            FieldValue::U16(v) => write!(f, "{v}"),
            FieldValue::I16(v) => write!(f, "{v}"),
            FieldValue::U32(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// 严格按变体提取具体类型（类型不符即 `KindMismatch`）
pub trait FromFieldValue: Sized {
    fn from_field_value(value: FieldValue) -> Result<Self, ProtocolError>;
}

macro_rules! impl_from_field_value {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(impl FromFieldValue for $ty {
            fn from_field_value(value: FieldValue) -> Result<Self, ProtocolError> {
                match value {
                    FieldValue::$kind(v) => Ok(v),
                    other => Err(ProtocolError::KindMismatch {
                        expected: FieldKind::$kind,
                        actual: other.kind(),
                    }),
                }
            }
        })+
    };
}

impl_from_field_value! {
    u8 => U8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    bool => Bool,
}

/// 单个字段的静态描述：名称、类型和一对读写函数
///
/// 记录类型的 `FIELDS` 表是按 schema 顺序排列的 `FieldSpec` 序列，
/// 字段级 get/set 通过表查找分发。
pub struct FieldSpec<R> {
    /// 字段名（schema 中唯一）
    pub name: &'static str,
    /// 原语类型
    pub kind: FieldKind,
    pub(crate) get: fn(&R) -> FieldValue,
    pub(crate) set: fn(&mut R, FieldValue) -> Result<(), ProtocolError>,
}

impl<R> FieldSpec<R> {
    /// 读取该字段的当前值
    pub fn read(&self, record: &R) -> FieldValue {
        (self.get)(record)
    }

    /// 写入该字段（类型不符即 `KindMismatch`）
    pub fn write(&self, record: &mut R, value: FieldValue) -> Result<(), ProtocolError> {
        (self.set)(record, value)
    }
}

/// `FieldKind` 变体到 Rust 原语类型的映射（仅供 `jrk_record!` 展开使用）
#[doc(hidden)]
#[macro_export]
macro_rules! kind_ty {
    (U8) => { u8 };
    (U16) => { u16 };
    (I16) => { i16 };
    (U32) => { u32 };
    (Bool) => { bool };
}

/// 从字段列表生成记录类型
///
/// 一次展开生成：
/// - 带 `pub` 字段的普通结构体（`Default` 即全零记录）
/// - 有序静态字段表 `FIELDS` 与按名查找 `field()` / `get()`
/// - 按 schema 顺序的紧凑 little-endian `encode()` / `decode()`
#[macro_export]
macro_rules! jrk_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $record:ident {
            $( $(#[$fmeta:meta])* $fname:ident : $kind:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        $vis struct $record {
            $( $(#[$fmeta])* pub $fname: $crate::kind_ty!($kind) ),+
        }

        impl $record {
            /// 按 schema 顺序排列的字段表
            pub const FIELDS: &'static [$crate::fields::FieldSpec<$record>] = &[
                $(
                    $crate::fields::FieldSpec {
                        name: stringify!($fname),
                        kind: $crate::fields::FieldKind::$kind,
                        get: |r: &$record| $crate::fields::FieldValue::$kind(r.$fname),
                        set: |r: &mut $record, v: $crate::fields::FieldValue| {
                            r.$fname = $crate::fields::FromFieldValue::from_field_value(v)?;
                            Ok(())
                        },
                    },
                )+
            ];

            /// 编码后的总字节数
            pub const ENCODED_LEN: usize =
                0 $( + $crate::fields::FieldKind::$kind.size() )+;

            /// 按名称查找字段描述
            pub fn field(name: &str) -> Option<&'static $crate::fields::FieldSpec<$record>> {
                Self::FIELDS.iter().find(|f| f.name == name)
            }

            /// 按名称读取字段值（未知名称返回 `None`）
            pub fn get(&self, name: &str) -> Option<$crate::fields::FieldValue> {
                Self::field(name).map(|f| f.read(self))
            }

            /// 从紧凑布局解码一条完整记录
            pub fn decode(buf: &[u8]) -> Result<Self, $crate::ProtocolError> {
                if buf.len() < Self::ENCODED_LEN {
                    return Err($crate::ProtocolError::InvalidLength {
                        expected: Self::ENCODED_LEN,
                        actual: buf.len(),
                    });
                }
                let mut record = Self::default();
                let mut offset = 0;
                for spec in Self::FIELDS {
                    let width = spec.kind.size();
                    let value =
                        $crate::fields::FieldValue::decode(spec.kind, &buf[offset..offset + width]);
                    spec.write(&mut record, value)?;
                    offset += width;
                }
                Ok(record)
            }

            /// 编码为紧凑布局
            pub fn encode(&self) -> Vec<u8> {
                let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
                for spec in Self::FIELDS {
                    spec.read(self).encode_into(&mut buf);
                }
                buf
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_sizes() {
        assert_eq!(FieldKind::U8.size(), 1);
        assert_eq!(FieldKind::Bool.size(), 1);
        assert_eq!(FieldKind::U16.size(), 2);
        assert_eq!(FieldKind::I16.size(), 2);
        assert_eq!(FieldKind::U32.size(), 4);
    }

    #[test]
    fn test_from_i64_range_checks() {
        assert_eq!(
            FieldValue::from_i64(FieldKind::U8, 255).unwrap(),
            FieldValue::U8(255)
        );
        assert!(FieldValue::from_i64(FieldKind::U8, 256).is_err());
        assert!(FieldValue::from_i64(FieldKind::U16, -1).is_err());
        assert_eq!(
            FieldValue::from_i64(FieldKind::I16, -32768).unwrap(),
            FieldValue::I16(-32768)
        );
        assert!(FieldValue::from_i64(FieldKind::I16, 32768).is_err());
    }

    #[test]
    fn test_from_i64_bool() {
        assert_eq!(
            FieldValue::from_i64(FieldKind::Bool, 0).unwrap(),
            FieldValue::Bool(false)
        );
        assert_eq!(
            FieldValue::from_i64(FieldKind::Bool, 1).unwrap(),
            FieldValue::Bool(true)
        );
        // Bool 只接受 0/1，不做 C 式真值转换
        assert!(FieldValue::from_i64(FieldKind::Bool, 2).is_err());
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let r: Result<u16, _> = FromFieldValue::from_field_value(FieldValue::U8(1));
        assert!(matches!(
            r,
            Err(ProtocolError::KindMismatch {
                expected: FieldKind::U16,
                actual: FieldKind::U8
            })
        ));
    }

    #[test]
    fn test_value_decode_little_endian() {
        assert_eq!(
            FieldValue::decode(FieldKind::U16, &[0x34, 0x12]),
            FieldValue::U16(0x1234)
        );
        assert_eq!(
            FieldValue::decode(FieldKind::I16, &[0xFF, 0xFF]),
            FieldValue::I16(-1)
        );
        assert_eq!(
            FieldValue::decode(FieldKind::U32, &[0x78, 0x56, 0x34, 0x12]),
            FieldValue::U32(0x12345678)
        );
    }

    #[test]
    fn test_value_encode_into() {
        let mut buf = Vec::new();
        FieldValue::U16(0x1234).encode_into(&mut buf);
        FieldValue::Bool(true).encode_into(&mut buf);
        assert_eq!(buf, vec![0x34, 0x12, 0x01]);
    }
}
