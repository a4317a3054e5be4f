pub mod computed;
pub mod css_matcher;
pub mod declaration;
pub mod media;
pub mod owned_css;
pub mod rule;
pub mod structural;
pub mod synthesized;
pub mod text_compiler;

pub use structural::StructuralCompiler;
pub use text_compiler::TextCompiler;

/// Converts `--breakpoint` declarations into pseudo-element `content` rules.
///
/// Implementations return only the synthesized rules followed by the
/// suppression rule, or an empty string when the input declares no breakpoint.
pub trait BreakpointCompiler {
    fn compile(&self, css: &str) -> String;
}
