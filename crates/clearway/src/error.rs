//! Error taxonomy for verification crawls and role synchronization.
//!
//! Every variant renders a message that can be posted to the user as-is.

/// Which membership-store call failed during synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Add,
    Remove,
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncAction::Add => f.write_str("adding"),
            SyncAction::Remove => f.write_str("removing"),
        }
    }
}

/// All errors surfaced by the Clearway core.
#[derive(thiserror::Error, Debug)]
pub enum ClearwayError {
    /// Zero directory matches. Usually a recent rename or transfer.
    #[error(
        "No character found on the Lodestone for `{name} ({world})`! If you recently renamed yourself or server transferred it can take up to a day for this to be reflected on the Lodestone; please try again later."
    )]
    NotFound { name: String, world: String },

    /// More than one directory entry carries the exact name.
    #[error(
        "Too many characters found for name {name} ({world})! Ensure it is exactly your character name.\nAlternatively, import your character to FFlogs at https://www.fflogs.com/lodestone/import to circumvent a Lodestone search."
    )]
    Ambiguous {
        name: String,
        world: String,
        count: usize,
    },

    /// Aggregated network and parse failures from one crawl session.
    #[error("Encountered search errors:\n{}", .0.join("\n"))]
    Crawl(Vec<String>),

    /// A membership-store call failed mid-apply. Earlier calls stay applied.
    #[error("Error {action} Discord role `{rule}`: {reason}")]
    Sync {
        rule: String,
        action: SyncAction,
        reason: String,
    },

    /// `next()` was called on a drained frontier.
    #[error("Crawl frontier is empty")]
    EmptyFrontier,

    /// The identity has no Lodestone id yet.
    #[error("Character `{0}` has not been found on the Lodestone yet")]
    Unresolved(String),

    /// A required identity part was blank.
    #[error("Make sure you input your world, first name, and last name.")]
    InvalidIdentity,

    /// The rankings provider failed; its message is kept unchanged.
    #[error("Error retrieving encounter rankings: {0}")]
    Provider(String),

    /// Reading current labels from the membership store failed.
    #[error("Could not retrieve roles for user: {0}")]
    Membership(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClearwayError {
    /// Whether re-running the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClearwayError::NotFound { .. }
                | ClearwayError::Crawl(_)
                | ClearwayError::Sync { .. }
                | ClearwayError::Provider(_)
                | ClearwayError::Membership(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClearwayError>;
