//! Named-macro access on a template.

use cinder_common::Variables;

use crate::error::RenderError;
use crate::template::Template;

/// The macros of a [`Template`], rendered by name.
///
/// Each macro is cached under its own key, separate from whole-template
/// renders of the same body.
#[derive(Debug, Clone, Copy)]
pub struct Macros<'t> {
    template: &'t Template,
}

impl<'t> Macros<'t> {
    pub(crate) fn new(template: &'t Template) -> Self {
        Self { template }
    }

    /// Renders the macro `name` with `variables`.
    pub fn render(&self, name: &str, variables: &Variables) -> Result<String, RenderError> {
        self.template.render(Some(name), variables)
    }
}
