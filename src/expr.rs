//! Symbolic values and single-level symbolic expressions.
//!
//! An [`Expr`] records *how* a symbolic value was computed: the operator and
//! the identities of its operands. Operands are never nested expressions;
//! deeper structure is obtained by looking up the operands' own expressions
//! in an [`ExprDomain`][crate::expr_domain::ExprDomain].

use std::fmt;
use std::sync::Arc;

/// Identity of a value at some point of the analyzed program.
///
/// Symbolic values are created by the front-end and carry no arithmetic;
/// they are only compared, ordered and hashed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SymbolicValue(u32);

impl SymbolicValue {
    pub const fn new(id: u32) -> Self {
        SymbolicValue(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

impl From<u32> for SymbolicValue {
    fn from(id: u32) -> Self {
        SymbolicValue(id)
    }
}

impl fmt::Display for SymbolicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Opaque type name supplied by the front-end.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TypeRef(Arc<str>);

impl TypeRef {
    pub fn new(name: &str) -> Self {
        TypeRef(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Literal payload of a constant.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(Arc<str>),
}

impl Literal {
    /// Numeric view of the literal; booleans are `0`/`1`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Int(n) => Some(*n),
            Literal::Bool(b) => Some(i64::from(*b)),
            Literal::Str(_) => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Str(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BinaryOperator {
    Add,
    AddOvf,
    AddOvfUn,
    And,
    Ceq,
    Cobjeq,
    CneUn,
    Cge,
    CgeUn,
    Cgt,
    CgtUn,
    Cle,
    CleUn,
    Clt,
    CltUn,
    Div,
    DivUn,
    LogicalAnd,
    LogicalOr,
    Mul,
    MulOvf,
    MulOvfUn,
    Or,
    Rem,
    RemUn,
    Shl,
    Shr,
    ShrUn,
    Sub,
    SubOvf,
    SubOvfUn,
    Xor,
}

impl BinaryOperator {
    /// `==` on values or on object references.
    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOperator::Ceq | BinaryOperator::Cobjeq)
    }

    pub fn is_comparison(self) -> bool {
        use BinaryOperator::*;
        matches!(
            self,
            Ceq | Cobjeq | CneUn | Cge | CgeUn | Cgt | CgtUn | Cle | CleUn | Clt | CltUn
        )
    }

    pub fn is_commutative(self) -> bool {
        use BinaryOperator::*;
        matches!(
            self,
            Add | AddOvf | AddOvfUn | And | Ceq | Cobjeq | CneUn | LogicalAnd | LogicalOr | Mul | MulOvf | MulOvfUn | Or | Xor
        )
    }

    /// Operator of the negated comparison: `!(a < b)` is `a >= b`.
    pub fn negate(self) -> Option<BinaryOperator> {
        use BinaryOperator::*;
        let negated = match self {
            Ceq | Cobjeq => CneUn,
            CneUn => Ceq,
            Cge => Clt,
            CgeUn => CltUn,
            Cgt => Cle,
            CgtUn => CleUn,
            Cle => Cgt,
            CleUn => CgtUn,
            Clt => Cge,
            CltUn => CgeUn,
            _ => return None,
        };
        Some(negated)
    }

    /// Operator with mirrored operands: `a < b` is `b > a`.
    pub fn swap(self) -> Option<BinaryOperator> {
        use BinaryOperator::*;
        let swapped = match self {
            Cge => Cle,
            CgeUn => CleUn,
            Cgt => Clt,
            CgtUn => CltUn,
            Cle => Cge,
            CleUn => CgeUn,
            Clt => Cgt,
            CltUn => CgtUn,
            op if op.is_commutative() => op,
            _ => return None,
        };
        Some(swapped)
    }

    pub fn symbol(self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Add => "+",
            AddOvf => "+.ovf",
            AddOvfUn => "+.ovf.un",
            And => "&",
            Ceq => "==",
            Cobjeq => "===",
            CneUn => "!=",
            Cge => ">=",
            CgeUn => ">=.un",
            Cgt => ">",
            CgtUn => ">.un",
            Cle => "<=",
            CleUn => "<=.un",
            Clt => "<",
            CltUn => "<.un",
            Div => "/",
            DivUn => "/.un",
            LogicalAnd => "&&",
            LogicalOr => "||",
            Mul => "*",
            MulOvf => "*.ovf",
            MulOvfUn => "*.ovf.un",
            Or => "|",
            Rem => "%",
            RemUn => "%.un",
            Shl => "<<",
            Shr => ">>",
            ShrUn => ">>.un",
            Sub => "-",
            SubOvf => "-.ovf",
            SubOvfUn => "-.ovf.un",
            Xor => "^",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum UnaryOperator {
    ConvI,
    ConvI1,
    ConvI2,
    ConvI4,
    ConvI8,
    ConvU,
    ConvU1,
    ConvU2,
    ConvU4,
    ConvU8,
    ConvR4,
    ConvR8,
    Neg,
    Not,
}

impl UnaryOperator {
    pub fn is_conversion(self) -> bool {
        !matches!(self, UnaryOperator::Neg | UnaryOperator::Not)
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use UnaryOperator::*;
        let s = match self {
            ConvI => "conv.i",
            ConvI1 => "conv.i1",
            ConvI2 => "conv.i2",
            ConvI4 => "conv.i4",
            ConvI8 => "conv.i8",
            ConvU => "conv.u",
            ConvU1 => "conv.u1",
            ConvU2 => "conv.u2",
            ConvU4 => "conv.u4",
            ConvU8 => "conv.u8",
            ConvR4 => "conv.r4",
            ConvR8 => "conv.r8",
            Neg => "-",
            Not => "!",
        };
        f.write_str(s)
    }
}

/// How a symbolic value was computed.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Expr<V = SymbolicValue> {
    Binary { op: BinaryOperator, left: V, right: V },
    Unary { op: UnaryOperator, unsigned: bool, operand: V },
    Const { ty: TypeRef, literal: Literal },
    IsInst { ty: TypeRef, operand: V },
    SizeOf { ty: TypeRef },
    Null,
}

impl<V> Expr<V> {
    pub fn binary(op: BinaryOperator, left: V, right: V) -> Self {
        Expr::Binary { op, left, right }
    }

    pub fn unary(op: UnaryOperator, unsigned: bool, operand: V) -> Self {
        Expr::Unary { op, unsigned, operand }
    }

    pub fn constant(ty: TypeRef, literal: Literal) -> Self {
        Expr::Const { ty, literal }
    }

    /// Integer constant of type `int64`.
    pub fn int(value: i64) -> Self {
        Expr::Const {
            ty: TypeRef::new("int64"),
            literal: Literal::Int(value),
        }
    }

    /// The symbolic values this expression reads.
    pub fn operands(&self) -> Vec<&V> {
        match self {
            Expr::Binary { left, right, .. } => vec![left, right],
            Expr::Unary { operand, .. } | Expr::IsInst { operand, .. } => vec![operand],
            Expr::Const { .. } | Expr::SizeOf { .. } | Expr::Null => vec![],
        }
    }

    /// Numeric value of a constant expression.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Expr::Const { literal, .. } => literal.as_i64(),
            _ => None,
        }
    }

    /// Replaces every operand through `f`.
    ///
    /// Returns `None` as soon as `f` cannot rename one of the operands.
    pub fn substitute<W, F>(&self, mut f: F) -> Option<Expr<W>>
    where
        F: FnMut(&V) -> Option<W>,
    {
        let expr = match self {
            Expr::Binary { op, left, right } => Expr::Binary {
                op: *op,
                left: f(left)?,
                right: f(right)?,
            },
            Expr::Unary { op, unsigned, operand } => Expr::Unary {
                op: *op,
                unsigned: *unsigned,
                operand: f(operand)?,
            },
            Expr::Const { ty, literal } => Expr::Const {
                ty: ty.clone(),
                literal: literal.clone(),
            },
            Expr::IsInst { ty, operand } => Expr::IsInst {
                ty: ty.clone(),
                operand: f(operand)?,
            },
            Expr::SizeOf { ty } => Expr::SizeOf { ty: ty.clone() },
            Expr::Null => Expr::Null,
        };
        Some(expr)
    }
}

impl<V: PartialEq> Expr<V> {
    /// Whether `v` is one of the direct operands.
    pub fn reads(&self, v: &V) -> bool {
        self.operands().into_iter().any(|o| o == v)
    }
}

impl<V: fmt::Display> fmt::Display for Expr<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Unary { op, unsigned, operand } => {
                write!(f, "{}{}({})", op, if *unsigned { ".un" } else { "" }, operand)
            }
            Expr::Const { ty, literal } => write!(f, "{}:{}", literal, ty),
            Expr::IsInst { ty, operand } => write!(f, "isinst {} {}", ty, operand),
            Expr::SizeOf { ty } => write!(f, "sizeof({})", ty),
            Expr::Null => write!(f, "null"),
        }
    }
}
