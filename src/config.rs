/// Which reachable set the remote-LFA engine grows on the repair side of the
/// protected link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
pub enum PSpaceMode {
    /// P-space rooted at the protected source itself.
    #[strum(to_string = "p-space")]
    Plain,
    /// Extended P-space: the union of the P-spaces of the source's
    /// neighbours (RFC 7490 section 6.1). Reaches strictly more repair
    /// candidates than [`PSpaceMode::Plain`].
    #[default]
    #[strum(to_string = "extended-p-space")]
    Extended,
}

/// Whether a repair tunnel may revisit a node of its own first segment while
/// descending from the tunnel endpoint to the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
pub enum TrombonePolicy {
    #[default]
    #[strum(to_string = "forbid")]
    Forbid,
    #[strum(to_string = "allow")]
    Allow,
}

/// Remote-LFA options.
///
/// Constructed by the caller and handed to [`crate::FrrPaths::new`]; the
/// engines read no process-wide state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RlfaConfig {
    pub p_space: PSpaceMode,
    pub trombone: TrombonePolicy,
}
