//! Options that change how a document is parsed.

/// How a transition finds its next step when the document does not say.
///
/// A transition normally gets its next step from the step declared right
/// after it, from a branch, or from an explicit `>> @name` jump. A
/// transition that gets none of these can either be an error or be
/// linked to the nearest step declared after it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JumpFallback {
    /// Only explicit links count. An unlinked transition fails validation.
    Strict,
    /// Link an unlinked transition to the nearest following step.
    #[default]
    LineProximity,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub jump_fallback: JumpFallback,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            jump_fallback: JumpFallback::Strict,
        }
    }
}
