//! Abstract syntax tree for the JSON path dialect.
use serde_json::Value;
use std::fmt;

/// The top-level representation of a parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal value: string, number, boolean, or null.
    Literal(Value),
    /// A path selecting data from the context.
    Selection(Selection),
    /// A call to a registered function.
    FunctionCall { name: String, args: Vec<Expression> },
}

/// A data selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The current context node (`.`).
    CurrentContext,
    /// A value from the variable scope (`$name`).
    Variable(String),
    /// A segment path. `rooted` paths start at `$`; bare paths are relative
    /// to the context node, which amounts to the same thing here since
    /// evaluation is always anchored at the context node.
    Path {
        rooted: bool,
        segments: Vec<PathSegment>,
    },
}

/// One navigation step of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// `.name`
    Key(String),
    /// `[3]`
    Index(usize),
    /// `.*` or `[*]`
    Wildcard,
    /// `..name` — every property with this key, at any depth.
    Descendant(String),
}

/// A concrete location of a value within a document: the identity the
/// template-matching engine uses to test pattern membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location(pub Vec<LocationStep>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocationStep {
    Key(String),
    Index(usize),
}

impl Location {
    pub fn child_key(&self, key: &str) -> Location {
        let mut steps = self.0.clone();
        steps.push(LocationStep::Key(key.to_string()));
        Location(steps)
    }

    pub fn child_index(&self, index: usize) -> Location {
        let mut steps = self.0.clone();
        steps.push(LocationStep::Index(index));
        Location(steps)
    }

    /// Appends a relative location to this one.
    pub fn join(&self, relative: &Location) -> Location {
        let mut steps = self.0.clone();
        steps.extend(relative.0.iter().cloned());
        Location(steps)
    }

    /// The enclosing location, with the final step returned separately.
    pub fn split_parent(&self) -> Option<(Location, &LocationStep)> {
        let (last, rest) = self.0.split_last()?;
        Some((Location(rest.to_vec()), last))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for step in &self.0 {
            match step {
                LocationStep::Key(k) => write!(f, ".{}", k)?,
                LocationStep::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}
