use smallvec::SmallVec;

use crate::Clazz;
use crate::identifier;

identifier! {
    /// A straight-line block of statements owned by one clazz.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    struct CodeBlock
}

/// A statement position: the `index`-th statement of `block`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Site {
    pub block: CodeBlock,
    pub index: usize,
}

impl Site {
    pub fn new(block: CodeBlock, index: usize) -> Self {
        Self { block, index }
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.block.raw(), self.index)
    }
}

/// One statically possible (target clazz, callee) pair of an access.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Access {
    pub target: Clazz,
    pub callee: Clazz,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstData {
    /// Bit pattern of a numeric constant.
    Numeric(i64),
    Bool(bool),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchCase {
    pub tags: SmallVec<[u32; 2]>,
    /// Field of the current instance receiving the untagged value.
    pub field: Option<Clazz>,
    pub code: CodeBlock,
}

/// Statement kinds of a code block.
///
/// Code is evaluated on an operand stack. `Call` pops its arguments (last
/// argument on top) and then its target; `Assign` pops the target and then
/// the value to store.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    Assign {
        target: Clazz,
        accesses: Vec<Access>,
    },
    Call {
        target: Clazz,
        args: usize,
        accesses: Vec<Access>,
    },
    Box {
        value: Clazz,
        reference: Clazz,
    },
    Unbox {
        reference: Clazz,
        value: Clazz,
    },
    Tag {
        value: Clazz,
        choice: Clazz,
        tag: u32,
    },
    Match {
        subject: Clazz,
        cases: Vec<MatchCase>,
    },
    /// Push the currently installed value of an effect type.
    Env {
        effect: Clazz,
    },
    Const {
        clazz: Clazz,
        data: ConstData,
    },
    Unit,
    Current,
    Outer,
    Arg(usize),
    Pop,
    Dup,
    Comment(String),
}

impl Expr {
    pub fn name(&self) -> &'static str {
        match self {
            Expr::Assign { .. } => "assign",
            Expr::Call { .. } => "call",
            Expr::Box { .. } => "box",
            Expr::Unbox { .. } => "unbox",
            Expr::Tag { .. } => "tag",
            Expr::Match { .. } => "match",
            Expr::Env { .. } => "env",
            Expr::Const { .. } => "const",
            Expr::Unit => "unit",
            Expr::Current => "current",
            Expr::Outer => "outer",
            Expr::Arg(_) => "arg",
            Expr::Pop => "pop",
            Expr::Dup => "dup",
            Expr::Comment(_) => "comment",
        }
    }

    pub fn accesses(&self) -> &[Access] {
        match self {
            Expr::Assign { accesses, .. } | Expr::Call { accesses, .. } => accesses,
            _ => &[],
        }
    }
}
