//! # Fixed Vocabulary Tables
//!
//! Well-known ids the platform uses for standard response options and
//! smartfield condition types. These are stable API constants, modeled as
//! static match tables rather than runtime state.

/// Label of a standard response option (the built-in Yes/No/N/A and
/// Safe/At Risk sets), if `id` is one.
pub fn standard_response_label(id: &str) -> Option<&'static str> {
    match id {
        "8bcfbf00-e11b-11e1-9b23-0800200c9a66" => Some("Yes"),
        "8bcfbf01-e11b-11e1-9b23-0800200c9a66" => Some("No"),
        "8bcfbf02-e11b-11e1-9b23-0800200c9a66" => Some("N/A"),
        "b5c92350-e11b-11e1-9b23-0800200c9a66" => Some("Safe"),
        "b5c92351-e11b-11e1-9b23-0800200c9a66" => Some("At Risk"),
        "b5c92352-e11b-11e1-9b23-0800200c9a66" => Some("N/A"),
        _ => None,
    }
}

/// Human phrase for a smartfield condition id, if recognized.
pub fn smartfield_condition_phrase(id: &str) -> Option<&'static str> {
    match id {
        "3f206180-e4f6-11e1-aff1-0800200c9a66" => Some("if response selected"),
        "3f206181-e4f6-11e1-aff1-0800200c9a66" => Some("if response not selected"),
        "3f206182-e4f6-11e1-aff1-0800200c9a66" => Some("if response is"),
        "3f206183-e4f6-11e1-aff1-0800200c9a66" => Some("if response is not"),
        "3f206184-e4f6-11e1-aff1-0800200c9a66" => Some("if response is one of"),
        "3f206185-e4f6-11e1-aff1-0800200c9a66" => Some("if response is not one of"),
        _ => None,
    }
}
