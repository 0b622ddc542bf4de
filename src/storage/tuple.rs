use bytes::{Buf, Bytes};

use crate::{
    catalog::schema::Schema,
    db_types::{TypeId, Value},
    storage::rid::Rid,
};

/// A serialized row. The fixed portion holds each column's slot at the
/// offset the schema assigned; unlined columns store a 4-byte pointer there
/// and their payload lives in the tail, appended in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    rid: Option<Rid>,
    data: Bytes,
}

impl Tuple {
    /// Builds a tuple from one value per schema column, in declaration
    /// order. Values must match the column types.
    pub fn from_values(values: &[Value], schema: &Schema) -> Tuple {
        debug_assert_eq!(values.len() as u32, schema.column_count());

        let mut tuple_size = schema.length();
        for &col_idx in schema.get_unlined_columns() {
            tuple_size += values[col_idx as usize].size();
        }

        let mut data = vec![0u8; tuple_size as usize];

        let mut tuple_end_offset = schema.length();
        for idx in 0..schema.column_count() {
            let column = schema.get_column(idx);
            let value = &values[idx as usize];
            let slot = column.offset() as usize;

            if column.is_inlined() {
                let raw = value.serialize();
                data[slot..slot + raw.len()].copy_from_slice(&raw);
            } else {
                data[slot..slot + 4].copy_from_slice(&tuple_end_offset.to_le_bytes());

                let raw = value.serialize();
                let tail = tuple_end_offset as usize;
                data[tail..tail + raw.len()].copy_from_slice(&raw);
                tuple_end_offset += value.size();
            }
        }

        Tuple {
            rid: None,
            data: Bytes::from(data),
        }
    }

    /// Wraps raw tuple bytes read out of a page slot.
    pub fn from_bytes(rid: Rid, data: &[u8]) -> Tuple {
        Tuple {
            rid: Some(rid),
            data: Bytes::copy_from_slice(data),
        }
    }

    /// Decodes the value of column `col_idx` against `schema`. Unlined
    /// columns indirect through the pointer in their fixed slot.
    pub fn get_value(&self, schema: &Schema, col_idx: u32) -> Value {
        let column = schema.get_column(col_idx);
        let mut offset = column.offset() as usize;

        if !column.is_inlined() {
            let mut slot = &self.data[offset..offset + column.fixed_length() as usize];
            offset = slot.get_u32_le() as usize;
        }

        Value::deserialize(&self.data[offset..], column.get_type())
    }

    pub fn size(&self) -> u32 {
        self.data.len() as u32
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn rid(&self) -> Option<Rid> {
        self.rid
    }

    pub fn set_rid(&mut self, rid: Rid) {
        self.rid = Some(rid);
    }
}
