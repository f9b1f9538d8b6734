//! Embedded file templates written out by the scaffold pipeline.

pub const ABSTRACT_MODEL: &str = include_str!("../stubs/abstract_model.stub");
pub const USER_MODEL: &str = include_str!("../stubs/user.stub");
pub const PROVIDER_ALL: &str = include_str!("../stubs/app_provider.stub");
pub const PROVIDER_DEBUGBAR: &str = include_str!("../stubs/app_provider_debugbar.stub");
pub const PROVIDER_IDE_HELPER: &str = include_str!("../stubs/app_provider_ide_helper.stub");

/// Substitute every `(placeholder, value)` pair in the template, in order.
#[must_use]
pub fn render(template: &str, replacements: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (from, to) in replacements {
        rendered = rendered.replace(from, to);
    }
    rendered
}
