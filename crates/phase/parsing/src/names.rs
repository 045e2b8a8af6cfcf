use std::collections::HashMap;

/// Appended to every generated element and component name.
pub const FIGMA_SUFFIX: &str = "_figma";

/// Per-run unique-name assignment. Owned by the parse context so repeated
/// runs over the same document produce identical names.
#[derive(Debug, Default)]
pub struct NameRegistry {
    counters: HashMap<String, u32>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The display/file name for an item: sanitized, suffixed, and counted
    /// when the base name was already taken.
    pub fn unique_name(&mut self, item_name: &str) -> String {
        if item_name.is_empty() {
            return String::new();
        }
        let mut name = item_name.to_owned();
        match self.counters.get_mut(item_name) {
            None => {
                self.counters.insert(item_name.to_owned(), 0);
            }
            Some(count) => {
                *count += 1;
                name.push_str(&count.to_string());
            }
        }
        name.push_str(FIGMA_SUFFIX);
        make_file_name(&name)
    }
}

/// Clamps a name into a valid QML type/file identifier: every character
/// outside `[a-zA-Z0-9_]` becomes `_`, the first character is forced to an
/// uppercase letter (with a `C` prefix when there is none to uppercase).
pub fn make_file_name(item_name: &str) -> String {
    let mut name: String = item_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !name.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        name.insert(0, 'C');
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => name,
    }
}
