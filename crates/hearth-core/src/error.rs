use std::fmt;

/// Machine-readable error codes shared by the core and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    UserNotFound,
    EventNotFound,
    RewardNotFound,
    InvalidPoints,
    InvalidTitle,
    InvalidThreshold,
    RewardLocked,
    InsufficientBalance,
    InvalidSyncUrl,
    InvalidPin,
    PinRejected,
    ImportParseFailed,
    ImportShapeInvalid,
    StoreWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::UserNotFound => "E2001",
            Self::EventNotFound => "E2002",
            Self::RewardNotFound => "E2003",
            Self::InvalidPoints => "E2004",
            Self::InvalidTitle => "E2005",
            Self::InvalidThreshold => "E2006",
            Self::RewardLocked => "E2101",
            Self::InsufficientBalance => "E2102",
            Self::InvalidSyncUrl => "E2201",
            Self::InvalidPin => "E3001",
            Self::PinRejected => "E3002",
            Self::ImportParseFailed => "E4001",
            Self::ImportShapeInvalid => "E4002",
            Self::StoreWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Household not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::UserNotFound => "User not found",
            Self::EventNotFound => "Event not found",
            Self::RewardNotFound => "Reward not found",
            Self::InvalidPoints => "Invalid point value",
            Self::InvalidTitle => "Title is required",
            Self::InvalidThreshold => "Invalid unlock threshold",
            Self::RewardLocked => "Reward is still locked",
            Self::InsufficientBalance => "Not enough balance points",
            Self::InvalidSyncUrl => "Invalid sync URL",
            Self::InvalidPin => "PIN must be exactly 4 digits",
            Self::PinRejected => "Parent PIN did not match",
            Self::ImportParseFailed => "Import file is not valid JSON",
            Self::ImportShapeInvalid => "Import file has an unrecognized layout",
            Self::StoreWriteFailed => "State file write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `hth init` to create the household state."),
            Self::ConfigParseError => Some("Fix syntax in .hearth/config.toml and retry."),
            Self::UserNotFound => Some("Run `hth users` to list known user ids."),
            Self::EventNotFound => Some("Run `hth events list` to see event ids."),
            Self::RewardNotFound => Some("Run `hth rewards list` to see enabled reward ids."),
            Self::InvalidPoints => Some("Use a whole number greater than zero."),
            Self::InvalidTitle | Self::InvalidThreshold => None,
            Self::RewardLocked => Some("Earn more points to unlock this reward."),
            Self::InsufficientBalance => None,
            Self::InvalidSyncUrl => {
                Some("Use an http:// or https:// URL, or an empty one to clear.")
            }
            Self::InvalidPin => Some("Use four digits such as 0420, or an empty PIN to clear."),
            Self::PinRejected => Some("Pass the parent PIN with --pin."),
            Self::ImportParseFailed => Some("Check that the file is a hearth export."),
            Self::ImportShapeInvalid => {
                Some("The file needs users, events_by_user, rewards, ledger and settings.")
            }
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `hth` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
