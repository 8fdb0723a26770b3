//! # Smartfield Label Synthesis
//!
//! A smartfield's displayed label is not its stored label: it is the
//! condition phrase followed by the pipe-delimited rendering of each
//! referenced value, e.g. `if response is one of|Yes|42|`.

use std::collections::HashMap;

use core_audit::ItemOptions;

use crate::vocab;

/// Synthesize the display label for a smartfield item.
///
/// Each referenced value resolves through the standard response table first,
/// then the document's custom response-set label map, then falls back to the
/// literal stored value. Unknown condition ids fall back to the raw id.
pub fn synthesize_label(
    options: &ItemOptions,
    response_set_labels: &HashMap<&str, &str>,
) -> String {
    let condition = options.condition.as_deref().unwrap_or("");
    let phrase = vocab::smartfield_condition_phrase(condition).unwrap_or(condition);

    let mut label = String::with_capacity(phrase.len() + options.values.len() * 8 + 1);
    label.push_str(phrase);
    label.push('|');

    for value in &options.values {
        let resolved = vocab::standard_response_label(value)
            .or_else(|| response_set_labels.get(value.as_str()).copied())
            .unwrap_or(value);
        label.push_str(resolved);
        label.push('|');
    }

    label
}
