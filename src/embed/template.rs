//! Typed placeholder substitution for embedded resources.

use std::marker::PhantomData;

/// A set of values that fills a template's placeholders.
pub trait TemplateVars {
    fn apply(&self, content: &str) -> String;
}

/// Embedded text resource bound to the variables it expects.
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _marker: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _marker: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        vars.apply(self.content)
    }
}
