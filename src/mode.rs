//! Per-mode conflict and no-match policy.

/// What to do when no template matches a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnNoMatch {
    /// Raise an error.
    Fail,
    /// Emit the node itself without descending into children.
    ShallowCopy,
    /// Serialize the whole subtree verbatim.
    DeepCopy,
    /// Emit only text and primitive leaves, recursing past structural nodes.
    #[default]
    TextOnlyCopy,
    /// Recurse into children with template dispatch, emitting nothing for
    /// the node itself.
    ApplyTemplates,
    /// Recurse into children, suppressing the node's own representation.
    ShallowSkip,
    /// Skip the node and its entire subtree.
    DeepSkip,
}

/// What to do when several templates match with equal priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnMultipleMatch {
    /// Resolve the tie without raising. Despite the name, ties resolve in
    /// favor of the first-declared template; see the dispatch tests.
    #[default]
    UseLast,
    Fail,
}

#[derive(Debug, Clone, Default)]
pub struct ModeConfig {
    pub on_no_match: OnNoMatch,
    pub on_multiple_match: OnMultipleMatch,
    /// Log a warning whenever the default-rule path is taken.
    pub warning_on_no_match: bool,
    /// Log a warning whenever more than one template matches, even when the
    /// tie still resolves.
    pub warning_on_multiple_match: bool,
}
