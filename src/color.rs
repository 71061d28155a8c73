//! Color keys and the ordered, label-editable color registry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a color. Marks reference colors by key, never by label.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorKey(String);

impl ColorKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ColorKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorDefinition {
    key: ColorKey,
    pub label: String,
    /// Swatch used when painting marks of this color.
    pub rgb: [u8; 3],
}

impl ColorDefinition {
    pub fn new(key: impl Into<ColorKey>, label: &str, rgb: [u8; 3]) -> Self {
        Self {
            key: key.into(),
            label: label.to_string(),
            rgb,
        }
    }

    pub fn key(&self) -> &ColorKey {
        &self.key
    }

    pub fn to_egui(&self) -> egui::Color32 {
        egui::Color32::from_rgb(self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

/// Colors available when no options file overrides them.
pub fn default_colors() -> Vec<ColorDefinition> {
    vec![
        ColorDefinition::new("red", "Red", [220, 40, 40]),
        ColorDefinition::new("yellow", "Yellow", [235, 200, 30]),
        ColorDefinition::new("green", "Green", [40, 170, 70]),
        ColorDefinition::new("blue", "Blue", [40, 110, 220]),
    ]
}

/// Ordered set of color definitions. The order is the report row order.
///
/// The set of keys is fixed once built; only labels change afterwards. A
/// registry always holds at least one color.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorRegistry {
    colors: Vec<ColorDefinition>,
}

impl ColorRegistry {
    /// Build a registry, dropping any definition whose key was already seen.
    /// An empty list yields the built-in colors.
    pub fn new(definitions: Vec<ColorDefinition>) -> Self {
        if definitions.is_empty() {
            log::warn!("No colors configured, using built-in colors");
            return Self::new(default_colors());
        }
        let mut colors: Vec<ColorDefinition> = Vec::with_capacity(definitions.len());
        for def in definitions {
            if colors.iter().any(|c| c.key == def.key) {
                log::warn!("Duplicate color key '{}' ignored", def.key);
                continue;
            }
            colors.push(def);
        }
        Self { colors }
    }

    pub fn get(&self, key: &ColorKey) -> Option<&ColorDefinition> {
        self.colors.iter().find(|c| &c.key == key)
    }

    pub fn contains(&self, key: &ColorKey) -> bool {
        self.get(key).is_some()
    }

    pub fn label(&self, key: &ColorKey) -> Option<&str> {
        self.get(key).map(|c| c.label.as_str())
    }

    /// Rename a color. Returns `false` if the key is not registered.
    pub fn set_label(&mut self, key: &ColorKey, label: impl Into<String>) -> bool {
        match self.label_mut(key) {
            Some(current) => {
                *current = label.into();
                true
            }
            None => false,
        }
    }

    pub fn label_mut(&mut self, key: &ColorKey) -> Option<&mut String> {
        self.colors
            .iter_mut()
            .find(|c| &c.key == key)
            .map(|c| &mut c.label)
    }

    pub fn first(&self) -> &ColorDefinition {
        &self.colors[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorDefinition> {
        self.colors.iter()
    }

    pub fn keys(&self) -> Vec<ColorKey> {
        self.colors.iter().map(|c| c.key.clone()).collect()
    }

}

impl Default for ColorRegistry {
    fn default() -> Self {
        Self::new(default_colors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_keeps_insertion_order() {
        let registry = ColorRegistry::default();
        let keys: Vec<&str> = registry.iter().map(|c| c.key().as_str()).collect();
        assert_eq!(keys, vec!["red", "yellow", "green", "blue"]);
    }

    #[test]
    fn test_duplicate_keys_are_dropped() {
        let registry = ColorRegistry::new(vec![
            ColorDefinition::new("red", "Red", [255, 0, 0]),
            ColorDefinition::new("red", "Crimson", [200, 0, 0]),
        ]);
        assert_eq!(registry.iter().count(), 1);
        assert_eq!(registry.label(&"red".into()), Some("Red"));
    }

    #[test]
    fn test_empty_list_yields_builtin_colors() {
        let registry = ColorRegistry::new(Vec::new());
        assert_eq!(registry, ColorRegistry::default());
        assert_eq!(registry.first().key().as_str(), "red");
    }

    #[test]
    fn test_relabel_keeps_key() {
        let mut registry = ColorRegistry::default();
        assert!(registry.set_label(&"green".into(), "Rebar"));
        assert_eq!(registry.label(&"green".into()), Some("Rebar"));
        assert!(registry.contains(&"green".into()));
        assert!(!registry.set_label(&"purple".into(), "Purple"));
    }
}
