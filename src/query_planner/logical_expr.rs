//! Minimal filter expressions attached to path steps.
//!
//! The join tree never evaluates these; it only needs a stable serialized
//! form so that the same association traversed with different filters yields
//! distinct child keys. The `Display` output is that canonical form.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalExpr {
    /// A literal, such as a number, string, boolean, or null.
    Literal(Literal),

    /// Column reference relative to the filtered association target.
    Column(String),

    /// A parameter, such as `$param`.
    Parameter(String),

    /// Binary operator application (e.g. a = b, x AND y).
    Operator(OperatorApplication),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorApplication {
    pub operator: Operator,
    pub operands: Vec<LogicalExpr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Like,
    In,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl LogicalExpr {
    /// Shorthand for the common `column <op> literal` filter shape.
    pub fn binary(operator: Operator, left: LogicalExpr, right: LogicalExpr) -> Self {
        LogicalExpr::Operator(OperatorApplication {
            operator,
            operands: vec![left, right],
        })
    }
}

impl Operator {
    fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Like => "LIKE",
            Operator::In => "IN",
        }
    }
}

impl fmt::Display for LogicalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalExpr::Literal(lit) => write!(f, "{lit}"),
            LogicalExpr::Column(name) => write!(f, "{name}"),
            LogicalExpr::Parameter(name) => write!(f, "${name}"),
            LogicalExpr::Operator(app) => {
                write!(f, "(")?;
                for (i, operand) in app.operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", app.operator.symbol())?;
                    }
                    write!(f, "{operand}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{s}'"),
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Null => write!(f, "NULL"),
        }
    }
}
