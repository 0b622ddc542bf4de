use std::fmt;

/// Column type tags understood by the tuple layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeId {
    Integer,
    Float,
    Varchar,
    Boolean,
}

impl TypeId {
    /// Inline width of a fixed-size type in serialized form. Varchar has no
    /// inline width; its fixed slot in a tuple is a 4-byte payload pointer.
    pub fn fixed_size(&self) -> Option<u32> {
        match self {
            TypeId::Integer => Some(4),
            TypeId::Float => Some(4),
            TypeId::Boolean => Some(1),
            TypeId::Varchar => None,
        }
    }

    pub fn is_inlined(&self) -> bool {
        !matches!(self, TypeId::Varchar)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeId::Integer => "INTEGER",
            TypeId::Float => "FLOAT",
            TypeId::Varchar => "VARCHAR",
            TypeId::Boolean => "BOOLEAN",
        };
        write!(f, "{}", name)
    }
}
