//! Abstract syntax tree for tree-path expressions.

/// A parsed expression, ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(String),
    Number(f64),
    Path(LocationPath),
    Variable(String),
    FunctionCall { name: String, args: Vec<Expression> },
}

/// A location path such as `/doc/section`, `.//para` or `@id`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub is_absolute: bool,
    pub steps: Vec<Step>,
}

/// One step of a location path, with optional predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    /// `//` — any descendant (descendant-or-self for matching purposes).
    Descendant,
    Attribute,
    SelfAxis,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// A name test, e.g. `para`.
    Name(String),
    /// `*`
    Wildcard,
    /// `text()`
    Text,
    /// `comment()`
    Comment,
    /// `processing-instruction()`
    ProcessingInstruction,
    /// `node()`
    AnyNode,
}

/// The predicate subset the evaluator supports.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `[3]` — one-based position within the step's result.
    Position(usize),
    /// `[@name='value']`
    AttributeEquals(String, String),
    /// `[name]` — a named child exists.
    HasChild(String),
}
