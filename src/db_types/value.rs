use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::type_id::TypeId;

/// A single column value. Serialization is little-endian throughout:
/// integers are 4-byte two's-complement, floats IEEE-754 single precision,
/// booleans one byte, varchars a 4-byte length prefix followed by UTF-8
/// bytes with no terminator.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    Float(f32),
    Varchar(String),
    Boolean(bool),
}

impl Value {
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Integer(_) => TypeId::Integer,
            Value::Float(_) => TypeId::Float,
            Value::Varchar(_) => TypeId::Varchar,
            Value::Boolean(_) => TypeId::Boolean,
        }
    }

    /// Serialized width. For a varchar this is the payload length, prefix
    /// included; tuple offsets only stay consistent under that definition.
    pub fn size(&self) -> u32 {
        match self {
            Value::Integer(_) => 4,
            Value::Float(_) => 4,
            Value::Boolean(_) => 1,
            Value::Varchar(s) => 4 + s.len() as u32,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.size() as usize);
        match self {
            Value::Integer(v) => {
                buffer
                    .write_i32::<LittleEndian>(*v)
                    .expect("write to Vec cannot fail");
            }
            Value::Float(v) => {
                buffer
                    .write_f32::<LittleEndian>(*v)
                    .expect("write to Vec cannot fail");
            }
            Value::Boolean(v) => {
                buffer.write_u8(*v as u8).expect("write to Vec cannot fail");
            }
            Value::Varchar(s) => {
                buffer
                    .write_u32::<LittleEndian>(s.len() as u32)
                    .expect("write to Vec cannot fail");
                buffer.extend_from_slice(s.as_bytes());
            }
        }
        buffer
    }

    /// Decodes a value of `type_id` from the head of `data`. The slice may
    /// extend past the value; trailing bytes are ignored.
    pub fn deserialize(data: &[u8], type_id: TypeId) -> Value {
        let mut cursor = Cursor::new(data);
        match type_id {
            TypeId::Integer => Value::Integer(
                cursor
                    .read_i32::<LittleEndian>()
                    .expect("integer value truncated"),
            ),
            TypeId::Float => Value::Float(
                cursor
                    .read_f32::<LittleEndian>()
                    .expect("float value truncated"),
            ),
            TypeId::Boolean => Value::Boolean(cursor.read_u8().expect("boolean value truncated") != 0),
            TypeId::Varchar => {
                let len = cursor
                    .read_u32::<LittleEndian>()
                    .expect("varchar length truncated") as usize;
                let start = cursor.position() as usize;
                let raw = &data[start..start + len];
                Value::Varchar(String::from_utf8(raw.to_vec()).expect("varchar is not UTF-8"))
            }
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_varchar(&self) -> Option<&str> {
        match self {
            Value::Varchar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}
