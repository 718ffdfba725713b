//! Evaluates a predicate tree against one record.
//!
//! Evaluation is total: a key that is absent from a map makes its predicate
//! false, it is never an error.

use std::collections::HashMap;

use crate::ast::Predicate;
use crate::record::Metadata;
use crate::wildcard::Pattern;

pub fn evaluate<M: Metadata + ?Sized>(predicate: &Predicate, record: &M) -> bool {
    match predicate {
        Predicate::MatchAll => true,
        Predicate::Name(pattern) => pattern.matches(record.name()),
        Predicate::ProjectName(pattern) => pattern.matches(record.project_name()),
        Predicate::GenericInformation { key, value } => {
            entry_matches(record.generic_information(), key, value)
        }
        Predicate::Variable { key, value } => entry_matches(record.variable(), key, value),
        Predicate::And(left, right) => evaluate(left, record) && evaluate(right, record),
        Predicate::Or(left, right) => evaluate(left, record) || evaluate(right, record),
    }
}

/// True when some entry has a key matched by `key` and a value matched by
/// `value`. A key without wildcard is a plain lookup.
fn entry_matches(entries: &HashMap<String, String>, key: &Pattern, value: &Pattern) -> bool {
    match key.as_literal() {
        Some(exact) => entries
            .get(exact)
            .map_or(false, |candidate| value.matches(candidate)),
        None => entries
            .iter()
            .any(|(k, v)| key.matches(k) && value.matches(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::WorkflowMetadata;

    fn workflow_a() -> WorkflowMetadata {
        WorkflowMetadata::new("A")
            .with_generic_information("I", "E")
            .with_generic_information("type", "public")
            .with_variable("CPU", "4")
    }

    #[test]
    fn test_match_all() {
        assert!(evaluate(&Predicate::MatchAll, &workflow_a()));
        assert!(evaluate(&Predicate::MatchAll, &WorkflowMetadata::default()));
    }

    #[test]
    fn test_field_predicates() {
        let record = workflow_a();
        assert!(evaluate(&Predicate::name("A"), &record));
        assert!(!evaluate(&Predicate::name("B"), &record));
        assert!(evaluate(&Predicate::project_name(""), &record));
        assert!(!evaluate(&Predicate::project_name("Fab%"), &record));
    }

    #[test]
    fn test_map_predicates() {
        let record = workflow_a();
        assert!(evaluate(&Predicate::generic_information("I", "E"), &record));
        assert!(!evaluate(&Predicate::generic_information("I", "O"), &record));
        assert!(evaluate(&Predicate::variable("CPU", "%"), &record));
        assert!(!evaluate(&Predicate::variable("I", "E"), &record));
    }

    #[test]
    fn test_missing_key_is_false() {
        let record = workflow_a();
        assert!(!evaluate(&Predicate::generic_information("missingKey", "%"), &record));
        assert!(!evaluate(&Predicate::variable("missingKey", "%"), &WorkflowMetadata::default()));
    }

    #[test]
    fn test_wildcard_key() {
        let record = workflow_a();
        assert!(evaluate(&Predicate::variable("%", "%"), &record));
        assert!(evaluate(&Predicate::generic_information("ty%", "pub%"), &record));
        assert!(!evaluate(&Predicate::generic_information("%", "private"), &record));
        assert!(!evaluate(&Predicate::variable("%", "%"), &WorkflowMetadata::new("C")));
    }

    #[test]
    fn test_escaped_key_is_a_lookup() {
        let record = WorkflowMetadata::new("X").with_variable("load%", "high");
        assert!(evaluate(&Predicate::variable("load\\%", "high"), &record));
        assert!(!evaluate(&Predicate::variable("load\\%", "low"), &record));
    }

    #[test]
    fn test_combinators() {
        let record = workflow_a();
        let yes = Predicate::name("A");
        let no = Predicate::name("B");

        assert!(evaluate(&Predicate::and(yes.clone(), yes.clone()), &record));
        assert!(!evaluate(&Predicate::and(yes.clone(), no.clone()), &record));
        assert!(evaluate(&Predicate::or(no.clone(), yes.clone()), &record));
        assert!(!evaluate(&Predicate::or(no.clone(), no), &record));
    }

    #[test]
    fn test_evaluates_through_references() {
        let record = workflow_a();
        let by_ref: &WorkflowMetadata = &record;
        assert!(evaluate(&Predicate::name("A"), &by_ref));
    }
}
