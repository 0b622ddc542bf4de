use crate::db_types::TypeId;

/// One column of a schema. `offset` is where the column's fixed slot lives
/// inside a tuple; for an unlined (variable-length) column that slot holds a
/// 4-byte pointer into the tuple tail, so `fixed_length` is 4 there.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    column_type: TypeId,
    is_inlined: bool,
    fixed_length: u32,
    offset: u32,
}

impl Column {
    // Pointer slot width for unlined columns.
    const UNLINED_SLOT: u32 = 4;

    pub fn new(name: impl Into<String>, column_type: TypeId) -> Self {
        let fixed_length = match column_type.fixed_size() {
            Some(size) => size,
            None => Self::UNLINED_SLOT,
        };

        Self {
            name: name.into(),
            column_type,
            is_inlined: column_type.is_inlined(),
            fixed_length,
            offset: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_type(&self) -> TypeId {
        self.column_type
    }

    pub fn is_inlined(&self) -> bool {
        self.is_inlined
    }

    pub fn fixed_length(&self) -> u32 {
        self.fixed_length
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// Ordered column layout for a tuple. Offsets are assigned at construction
/// in declaration order; `length` is the width of the fixed portion only.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
    length: u32,
    unlined_columns: Vec<u32>,
}

impl Schema {
    pub fn new(mut columns: Vec<Column>) -> Self {
        let mut offset = 0u32;
        let mut unlined_columns = Vec::new();

        for (idx, column) in columns.iter_mut().enumerate() {
            column.offset = offset;
            offset += column.fixed_length;

            if !column.is_inlined {
                unlined_columns.push(idx as u32);
            }
        }

        Self {
            columns,
            length: offset,
            unlined_columns,
        }
    }

    /// Width of the fixed portion of a tuple under this schema.
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn column_count(&self) -> u32 {
        self.columns.len() as u32
    }

    pub fn get_column(&self, idx: u32) -> &Column {
        &self.columns[idx as usize]
    }

    pub fn get_unlined_columns(&self) -> &[u32] {
        &self.unlined_columns
    }

    pub fn get_col_idx(&self, name: &str) -> Option<u32> {
        self.columns
            .iter()
            .position(|col| col.name == name)
            .map(|idx| idx as u32)
    }
}
