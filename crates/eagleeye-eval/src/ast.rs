//! Closed expression tree.
//!
//! Every construct the grammar admits has exactly one variant here; the
//! interpreter matches exhaustively, so there is no "unknown node" path at
//! evaluation time. Function names are resolved to [`Builtin`] while
//! parsing.

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    /// A name bound by an enclosing comprehension.
    Name(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `a < b <= c`: each link must hold, operands evaluated once.
    Compare {
        first: Box<Expr>,
        rest: Vec<(CmpOp, Expr)>,
    },
    /// `needle in haystack` or `needle not in haystack`.
    Membership {
        needle: Box<Expr>,
        haystack: Box<Expr>,
        negated: bool,
    },
    /// Short-circuiting `and` / `or` over two or more operands.
    BoolOp {
        op: BoolOp,
        operands: Vec<Expr>,
    },
    Call {
        func: Builtin,
        args: Vec<Expr>,
    },
    /// `body if test else orelse`
    Conditional {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    /// `element for var in iter [if filter]`, only as a call argument.
    Comprehension {
        element: Box<Expr>,
        var: String,
        iter: Box<Expr>,
        filter: Option<Box<Expr>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    NotEq,
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// The whitelisted callables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Abs,
    Max,
    Min,
    Sum,
    Len,
    /// Truthy-element count for sequences, 1/0 for scalars.
    Count,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "abs" => Some(Self::Abs),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            "sum" => Some(Self::Sum),
            "len" => Some(Self::Len),
            "COUNT" => Some(Self::Count),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Max => "max",
            Self::Min => "min",
            Self::Sum => "sum",
            Self::Len => "len",
            Self::Count => "COUNT",
        }
    }
}
