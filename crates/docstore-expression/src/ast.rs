//! AST types for update, condition, and projection expressions.
//!
//! Trees come out of the parser with `#name` path segments and `:value`
//! references still symbolic; the resolver rewrites both in place before
//! anything is evaluated. All enums here are closed sum types, so adding a
//! function or operator forces every consumer to handle it.

use std::fmt;

use docstore_model::AttributeValue;

/// An attribute path: a top-level attribute followed by map/list descent
/// steps. The root and any [`PathOperator::Attribute`] segment may hold an
/// unresolved `#name` placeholder until resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// The top-level attribute name (or `#placeholder`).
    pub root: String,
    /// Descent steps applied to the root, in order.
    pub operators: Vec<PathOperator>,
}

/// A single descent step within a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOperator {
    /// Map descent by attribute name (or `#placeholder`).
    Attribute(String),
    /// List descent by non-negative index.
    Index(usize),
}

impl Path {
    /// A path consisting of just a top-level attribute.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            operators: Vec::new(),
        }
    }

    /// The top-level attribute name this path starts at.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// True when `self` names the same location as `other`, or an ancestor
    /// of it. Used by the update-clause overlap check.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        self.root == other.root
            && self.operators.len() <= other.operators.len()
            && self.operators.iter().zip(&other.operators).all(|(a, b)| a == b)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for op in &self.operators {
            match op {
                PathOperator::Attribute(name) => write!(f, ".{name}")?,
                PathOperator::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// Built-in value functions usable inside expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFunction {
    /// `if_not_exists(path, default)` — update expressions only.
    IfNotExists,
    /// `list_append(list, list)` — update expressions only.
    ListAppend,
    /// `size(operand)` — condition expressions only.
    Size,
}

impl fmt::Display for ValueFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IfNotExists => write!(f, "if_not_exists"),
            Self::ListAppend => write!(f, "list_append"),
            Self::Size => write!(f, "size"),
        }
    }
}

/// Arithmetic operators inside SET value expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// Exact decimal addition.
    Plus,
    /// Exact decimal subtraction.
    Minus,
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
        }
    }
}

/// A value expression: the right-hand side of a SET/ADD/DELETE clause, or an
/// operand inside a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A concrete value, present after resolution.
    Literal(AttributeValue),
    /// An unresolved `:value` reference (token stored with its prefix);
    /// parse-time only.
    ValueRef(String),
    /// A reference to an attribute of the previous item.
    PathRef(Path),
    /// A call to a built-in value function.
    FunctionCall {
        /// The function being called.
        name: ValueFunction,
        /// Ordered arguments.
        args: Vec<Value>,
    },
    /// Addition or subtraction of two value expressions.
    Arithmetic {
        /// The operator.
        op: ArithmeticOp,
        /// Left operand.
        left: Box<Value>,
        /// Right operand.
        right: Box<Value>,
    },
}

/// A single SET clause: `path = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    /// Target path.
    pub path: Path,
    /// Value expression assigned to it.
    pub value: Value,
}

/// A single ADD clause: `path value`.
#[derive(Debug, Clone, PartialEq)]
pub struct AddClause {
    /// Target path.
    pub path: Path,
    /// The number or set to add.
    pub rhs: Value,
}

/// A single DELETE clause: `path value`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteClause {
    /// Target path.
    pub path: Path,
    /// The set of elements to remove.
    pub rhs: Value,
}

/// A parsed update expression: four ordered clause lists.
///
/// Invariant, checked at resolution time: no two clauses across the four
/// lists may act on the same path, nor may one clause's path be a strict
/// ancestor of another's.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpression {
    /// SET clauses.
    pub set: Vec<SetClause>,
    /// REMOVE paths.
    pub remove: Vec<Path>,
    /// ADD clauses.
    pub add: Vec<AddClause>,
    /// DELETE clauses.
    pub delete: Vec<DeleteClause>,
}

impl UpdateExpression {
    /// True when no clause of any kind is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
            && self.remove.is_empty()
            && self.add.is_empty()
            && self.delete.is_empty()
    }

    /// Every clause's target path, across all four lists.
    pub fn clause_paths(&self) -> impl Iterator<Item = &Path> {
        self.set
            .iter()
            .map(|c| &c.path)
            .chain(self.remove.iter())
            .chain(self.add.iter().map(|c| &c.path))
            .chain(self.delete.iter().map(|c| &c.path))
    }
}

/// Comparison operators usable in condition expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "<>"),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
        }
    }
}

/// Built-in boolean predicates usable in condition expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// `attribute_exists(path)`
    AttributeExists,
    /// `attribute_not_exists(path)`
    AttributeNotExists,
    /// `attribute_type(path, type)`
    AttributeType,
    /// `begins_with(operand, prefix)`
    BeginsWith,
    /// `contains(haystack, needle)`
    Contains,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeExists => write!(f, "attribute_exists"),
            Self::AttributeNotExists => write!(f, "attribute_not_exists"),
            Self::AttributeType => write!(f, "attribute_type"),
            Self::BeginsWith => write!(f, "begins_with"),
            Self::Contains => write!(f, "contains"),
        }
    }
}

/// A parsed condition expression. Immutable after resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionExpression {
    /// `left op right`
    Comparison {
        /// The comparison operator.
        op: Comparator,
        /// Left operand.
        left: Value,
        /// Right operand.
        right: Value,
    },
    /// `value BETWEEN low AND high` (bounds inclusive).
    Between {
        /// Value under test.
        value: Value,
        /// Lower bound.
        low: Value,
        /// Upper bound.
        high: Value,
    },
    /// `value IN (a, b, ...)`
    In {
        /// Value under test.
        value: Value,
        /// Candidate values.
        list: Vec<Value>,
    },
    /// A boolean predicate call.
    FunctionPredicate {
        /// The predicate being called.
        name: Predicate,
        /// Ordered arguments.
        args: Vec<Value>,
    },
    /// `left AND right`
    And(Box<ConditionExpression>, Box<ConditionExpression>),
    /// `left OR right`
    Or(Box<ConditionExpression>, Box<ConditionExpression>),
    /// `NOT inner`
    Not(Box<ConditionExpression>),
    /// `( inner )`
    Parenthesized(Box<ConditionExpression>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(root: &str, ops: &[PathOperator]) -> Path {
        Path {
            root: root.to_owned(),
            operators: ops.to_vec(),
        }
    }

    #[test]
    fn test_should_display_paths_with_descent_steps() {
        let p = path(
            "y",
            &[
                PathOperator::Attribute("z".to_owned()),
                PathOperator::Index(1),
            ],
        );
        assert_eq!(p.to_string(), "y.z[1]");
    }

    #[test]
    fn test_should_detect_prefix_relations() {
        let ancestor = path("a", &[]);
        let descendant = path("a", &[PathOperator::Attribute("b".to_owned())]);
        assert!(ancestor.is_prefix_of(&descendant));
        assert!(!descendant.is_prefix_of(&ancestor));
        assert!(ancestor.is_prefix_of(&ancestor));
        assert!(!path("x", &[]).is_prefix_of(&descendant));
    }

    #[test]
    fn test_should_not_treat_sibling_indices_as_prefix() {
        let first = path("l", &[PathOperator::Index(0)]);
        let second = path("l", &[PathOperator::Index(1)]);
        assert!(!first.is_prefix_of(&second));
        assert!(!second.is_prefix_of(&first));
    }

    #[test]
    fn test_should_enumerate_clause_paths() {
        let update = UpdateExpression {
            set: vec![SetClause {
                path: Path::new("a"),
                value: Value::ValueRef(":v".to_owned()),
            }],
            remove: vec![Path::new("b")],
            add: vec![AddClause {
                path: Path::new("c"),
                rhs: Value::ValueRef(":v".to_owned()),
            }],
            delete: vec![DeleteClause {
                path: Path::new("d"),
                rhs: Value::ValueRef(":v".to_owned()),
            }],
        };
        let roots: Vec<&str> = update.clause_paths().map(Path::root).collect();
        assert_eq!(roots, ["a", "b", "c", "d"]);
    }
}
