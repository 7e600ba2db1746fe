/// Pipeline stage definitions for tracking harvest progress
///
/// A run moves through these stages in order. `Failed` can be entered from
/// any stage that is not already terminal.
use std::fmt;

/// Represents the current stage of a harvest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    // ===== Active Stages =====
    /// Nothing fetched yet
    #[default]
    Init,

    /// Landing page fetched and validated
    LandingFetched,

    /// Location, result count and page URLs known
    Analyzed,

    /// Every remaining page fetched or given up
    PagesFetched,

    /// Records extracted from every fetched page
    Extracted,

    // ===== Terminal Stages =====
    /// Records handed to the sink
    Delivered,

    /// Run aborted
    Failed,
}

impl PipelineStage {
    /// Returns true if no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }

    /// The stage that follows this one on the success path
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::LandingFetched),
            Self::LandingFetched => Some(Self::Analyzed),
            Self::Analyzed => Some(Self::PagesFetched),
            Self::PagesFetched => Some(Self::Extracted),
            Self::Extracted => Some(Self::Delivered),
            Self::Delivered | Self::Failed => None,
        }
    }

    /// Returns true if moving from this stage to `to` is allowed
    pub fn can_transition_to(&self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Failed || self.next() == Some(to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::LandingFetched => "landing_fetched",
            Self::Analyzed => "analyzed",
            Self::PagesFetched => "pages_fetched",
            Self::Extracted => "extracted",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }

    /// Returns all stages in pipeline order
    pub fn all_stages() -> Vec<Self> {
        vec![
            Self::Init,
            Self::LandingFetched,
            Self::Analyzed,
            Self::PagesFetched,
            Self::Extracted,
            Self::Delivered,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
