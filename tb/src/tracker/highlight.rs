//! Active-phase highlight and the saved original styles

use super::collab::StyleStore;

/// Properties overridden while a tracker is Active
pub const HIGHLIGHT_PROPERTIES: [&str; 3] = ["border-color", "background-color", "box-shadow"];

/// Highlight values for a tracker whose identifier is also its color
pub fn highlight_overrides(color: &str) -> [(&'static str, String); 3] {
    [
        (HIGHLIGHT_PROPERTIES[0], color.to_string()),
        (HIGHLIGHT_PROPERTIES[1], format!("color-mix(in srgb, {color} 20%, transparent)")),
        (HIGHLIGHT_PROPERTIES[2], format!("1px 3px 5px color-mix(in srgb, {color} 30%, transparent)")),
    ]
}

/// Original property values, captured the first time each is overridden
#[derive(Debug, Default, Clone)]
pub struct SavedStyles {
    saved: Vec<(String, String)>,
}

impl SavedStyles {
    /// Set `name` to `value`, remembering the prior value on first override
    pub fn override_property(&mut self, style: &dyn StyleStore, name: &str, value: &str) {
        if !self.saved.iter().any(|(saved, _)| saved == name) {
            self.saved.push((name.to_string(), style.get_property(name)));
        }
        style.set_property(name, value);
    }

    /// Put every captured property back to its original value
    pub fn restore(&self, style: &dyn StyleStore) {
        for (name, value) in &self.saved {
            style.set_property(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.saved.iter().find(|(saved, _)| saved == name).map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }
}
