use crate::wildcard::Pattern;

/// Root of a parsed query: a boolean tree of predicates over one workflow
/// record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The empty query. Matches every record.
    MatchAll,
    /// `name="pattern"`
    Name(Pattern),
    /// `project_name="pattern"`
    ProjectName(Pattern),
    /// `generic_information("key", "value")`
    GenericInformation { key: Pattern, value: Pattern },
    /// `variable("key", "value")`
    Variable { key: Pattern, value: Pattern },
    /// Logical conjunction (AND)
    And(Box<Predicate>, Box<Predicate>),
    /// Logical disjunction (OR)
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn and(left: Predicate, right: Predicate) -> Self {
        Predicate::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Predicate, right: Predicate) -> Self {
        Predicate::Or(Box::new(left), Box::new(right))
    }

    pub fn name(pattern: &str) -> Self {
        Predicate::Name(Pattern::new(pattern))
    }

    pub fn project_name(pattern: &str) -> Self {
        Predicate::ProjectName(Pattern::new(pattern))
    }

    pub fn generic_information(key: &str, value: &str) -> Self {
        Predicate::GenericInformation {
            key: Pattern::new(key),
            value: Pattern::new(value),
        }
    }

    pub fn variable(key: &str, value: &str) -> Self {
        Predicate::Variable {
            key: Pattern::new(key),
            value: Pattern::new(value),
        }
    }

    /// Number of leaf predicates in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Predicate::MatchAll => 0,
            Predicate::And(left, right) | Predicate::Or(left, right) => {
                left.leaf_count() + right.leaf_count()
            }
            _ => 1,
        }
    }
}
