use crate::identifier;

identifier! {
    /// A fully resolved, monomorphic type or feature.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    struct Clazz
}

/// What a clazz is, as far as the analysis cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClazzKind {
    /// A feature with a body (constructors included).
    Routine,
    /// A field read or written through an access.
    Field,
    /// Built-in whose abstract semantics come from the intrinsic registry.
    Intrinsic,
    /// Has no implementation of its own; only reachable through dispatch.
    Abstract,
    /// A sum type. Values of it are tagged.
    Choice,
}

/// Clazzes with built-in meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecialClazz {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Unit,
}

impl SpecialClazz {
    pub const NUMERIC: [SpecialClazz; 10] = [
        SpecialClazz::I8,
        SpecialClazz::I16,
        SpecialClazz::I32,
        SpecialClazz::I64,
        SpecialClazz::U8,
        SpecialClazz::U16,
        SpecialClazz::U32,
        SpecialClazz::U64,
        SpecialClazz::F32,
        SpecialClazz::F64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpecialClazz::I8 => "i8",
            SpecialClazz::I16 => "i16",
            SpecialClazz::I32 => "i32",
            SpecialClazz::I64 => "i64",
            SpecialClazz::U8 => "u8",
            SpecialClazz::U16 => "u16",
            SpecialClazz::U32 => "u32",
            SpecialClazz::U64 => "u64",
            SpecialClazz::F32 => "f32",
            SpecialClazz::F64 => "f64",
            SpecialClazz::Bool => "bool",
            SpecialClazz::Unit => "unit",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, SpecialClazz::Bool | SpecialClazz::Unit)
    }

    pub fn is_float(self) -> bool {
        matches!(self, SpecialClazz::F32 | SpecialClazz::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            SpecialClazz::I8 | SpecialClazz::I16 | SpecialClazz::I32 | SpecialClazz::I64
        )
    }

    /// Width in bits of a numeric clazz, `0` otherwise.
    pub fn bits(self) -> u32 {
        match self {
            SpecialClazz::I8 | SpecialClazz::U8 => 8,
            SpecialClazz::I16 | SpecialClazz::U16 => 16,
            SpecialClazz::I32 | SpecialClazz::U32 | SpecialClazz::F32 => 32,
            SpecialClazz::I64 | SpecialClazz::U64 | SpecialClazz::F64 => 64,
            SpecialClazz::Bool | SpecialClazz::Unit => 0,
        }
    }
}

impl std::fmt::Display for SpecialClazz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
