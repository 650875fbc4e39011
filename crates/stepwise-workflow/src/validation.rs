//! Name rules shared by workflows, steps and transitions.

use stepwise_core::ErrorCollection;

/// Characters that break the serialized workflow descriptor.
pub const INVALID_CHARACTERS: [char; 3] = ['<', '&', '"'];

/// Whether `name` can be used as a workflow name: not blank, plain ASCII,
/// and no leading or trailing whitespace.
pub fn is_acceptable_name(name: &str) -> bool {
    !name.trim().is_empty() && name.is_ascii() && name.trim() == name
}

/// Record a field error when `value` contains a reserved character.
/// Returns whether the value passed.
pub fn check_invalid_characters(value: &str, field: &str, errors: &mut ErrorCollection) -> bool {
    if value.contains(&INVALID_CHARACTERS[..]) {
        errors.add_error(field, "Must not contain the characters <, & or \".");
        return false;
    }
    true
}

/// Record a field error when `value` is blank or carries reserved characters.
pub fn check_descriptor_name(value: &str, field: &str, errors: &mut ErrorCollection) -> bool {
    if value.trim().is_empty() {
        errors.add_error(field, "Please specify a name.");
        return false;
    }
    check_invalid_characters(value, field, errors)
}

/// Record a field error when `name` is not an acceptable workflow name.
pub fn check_workflow_name(name: &str, field: &str, errors: &mut ErrorCollection) -> bool {
    if name.trim().is_empty() {
        errors.add_error(field, "Please specify a workflow name.");
        return false;
    }
    if !is_acceptable_name(name) {
        errors.add_error(
            field,
            "Workflow name must only contain ASCII characters and no leading or trailing spaces.",
        );
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acceptable_names() {
        assert!(is_acceptable_name("Software Development"));
        assert!(!is_acceptable_name(""));
        assert!(!is_acceptable_name("   "));
        assert!(!is_acceptable_name(" leading"));
        assert!(!is_acceptable_name("trailing\t"));
        assert!(!is_acceptable_name("Entwicklungsablauf für Teams"));
    }

    #[test]
    fn reserved_characters() {
        let mut errors = ErrorCollection::new();
        assert!(check_invalid_characters("Resolve Issue", "transitionName", &mut errors));
        assert!(errors.is_empty());

        assert!(!check_invalid_characters("Fix & Close", "transitionName", &mut errors));
        assert!(errors.errors.contains_key("transitionName"));
    }

    #[test]
    fn descriptor_name_required() {
        let mut errors = ErrorCollection::new();
        assert!(!check_descriptor_name("  ", "stepName", &mut errors));
        assert_eq!(errors.errors["stepName"], "Please specify a name.");
    }

    #[test]
    fn workflow_name_messages() {
        let mut errors = ErrorCollection::new();
        assert!(check_workflow_name("classic", "newWorkflowName", &mut errors));
        assert!(!check_workflow_name("classic ", "newWorkflowName", &mut errors));
        assert_eq!(errors.errors.len(), 1);
    }
}
