//! The document root marker.
//!
//! Styling that does not subscribe to the store still reacts to theme changes
//! through the root: its `light`/`dark` class and the CSS custom properties of
//! the active palette. [`DocumentRoot`] models that element. It is a shared
//! handle, so the theme store and the site settings can both write to it while
//! the host reads the result.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::config::Palette;
use crate::preference::ColorMode;

const ROOT_CSS_TEMPLATE: &str = "root.css";
const ROOT_CSS_SOURCE: &str =
    "{{ selector }} {\n{% for var in vars %}  {{ var.name }}: {{ var.value }};\n{% endfor %}}";

static CSS_ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template(ROOT_CSS_TEMPLATE, ROOT_CSS_SOURCE)
        .expect("root stylesheet template is valid");
    env
});

#[derive(Serialize)]
struct CssVar<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Debug, Default)]
struct RootState {
    classes: BTreeSet<String>,
    vars: BTreeMap<String, String>,
}

/// Shared handle to the document root's classes and custom properties.
///
/// # Example
///
/// ```rust
/// use themeswitch::{ColorMode, DocumentRoot, Palette};
///
/// let root = DocumentRoot::new();
/// root.apply_mode(ColorMode::Dark, &Palette::dark());
/// assert!(root.has_class("dark"));
/// assert_eq!(root.var("--color-background").as_deref(), Some("#0f172a"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentRoot {
    state: Rc<RefCell<RootState>>,
}

impl DocumentRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the root with `mode` and writes the palette variables.
    ///
    /// Any previous mode class is removed first, so exactly one of `light`
    /// and `dark` is present afterwards.
    pub fn apply_mode(&self, mode: ColorMode, palette: &Palette) {
        let mut state = self.state.borrow_mut();
        state.classes.remove(ColorMode::Light.as_str());
        state.classes.remove(ColorMode::Dark.as_str());
        state.classes.insert(mode.as_str().to_string());
        for (name, value) in palette.css_vars() {
            state.vars.insert(name.to_string(), value.to_string());
        }
    }

    /// The mode class currently on the root, if any.
    pub fn mode(&self) -> Option<ColorMode> {
        let state = self.state.borrow();
        if state.classes.contains(ColorMode::Dark.as_str()) {
            Some(ColorMode::Dark)
        } else if state.classes.contains(ColorMode::Light.as_str()) {
            Some(ColorMode::Light)
        } else {
            None
        }
    }

    pub fn add_class(&self, class: &str) {
        self.state.borrow_mut().classes.insert(class.to_string());
    }

    pub fn remove_class(&self, class: &str) -> bool {
        self.state.borrow_mut().classes.remove(class)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.state.borrow().classes.contains(class)
    }

    /// Classes in sorted order.
    pub fn classes(&self) -> Vec<String> {
        self.state.borrow().classes.iter().cloned().collect()
    }

    pub fn set_var(&self, name: &str, value: &str) {
        self.state
            .borrow_mut()
            .vars
            .insert(name.to_string(), value.to_string());
    }

    pub fn var(&self, name: &str) -> Option<String> {
        self.state.borrow().vars.get(name).cloned()
    }

    /// Custom properties in sorted order.
    pub fn vars(&self) -> BTreeMap<String, String> {
        self.state.borrow().vars.clone()
    }

    /// Renders the custom properties as a `:root` rule.
    pub fn to_css(&self) -> Result<String, minijinja::Error> {
        let state = self.state.borrow();
        let vars: Vec<CssVar<'_>> = state
            .vars
            .iter()
            .map(|(name, value)| CssVar {
                name: name.as_str(),
                value: value.as_str(),
            })
            .collect();

        let template = CSS_ENV.get_template(ROOT_CSS_TEMPLATE)?;
        template.render(minijinja::context! { selector => ":root", vars => vars })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_mode_replaces_previous_class() {
        let root = DocumentRoot::new();
        root.add_class("antialiased");

        root.apply_mode(ColorMode::Light, &Palette::light());
        assert_eq!(root.mode(), Some(ColorMode::Light));

        root.apply_mode(ColorMode::Dark, &Palette::dark());
        assert_eq!(root.classes(), vec!["antialiased", "dark"]);
        assert_eq!(root.mode(), Some(ColorMode::Dark));
        assert_eq!(root.var("--color-text").as_deref(), Some("#f8fafc"));
    }

    #[test]
    fn test_clones_share_state() {
        let root = DocumentRoot::new();
        let other = root.clone();
        other.set_var("--navbar-bg", "#123456");
        assert_eq!(root.var("--navbar-bg").as_deref(), Some("#123456"));
        assert!(!other.remove_class("missing"));
    }

    #[test]
    fn test_empty_root_has_no_mode() {
        let root = DocumentRoot::new();
        assert_eq!(root.mode(), None);
        assert!(root.vars().is_empty());
    }

    #[test]
    fn test_to_css_renders_sorted_vars() {
        let root = DocumentRoot::new();
        root.set_var("--color-text", "#1f2937");
        root.set_var("--color-background", "#ffffff");

        let css = root.to_css().unwrap();
        assert_eq!(
            css,
            ":root {\n  --color-background: #ffffff;\n  --color-text: #1f2937;\n}"
        );
    }

    #[test]
    fn test_to_css_empty() {
        let css = DocumentRoot::new().to_css().unwrap();
        assert_eq!(css, ":root {\n}");
    }
}
