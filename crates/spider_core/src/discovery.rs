use std::fmt;

/// Verdict the crawler's fetch filters reached for a discovered URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    Valid,
    Seed,
    OutOfScope,
    OutOfContext,
    IllegalProtocol,
    UserRules,
}

impl FetchStatus {
    pub fn name(self) -> &'static str {
        match self {
            FetchStatus::Valid => "VALID",
            FetchStatus::Seed => "SEED",
            FetchStatus::OutOfScope => "OUT_OF_SCOPE",
            FetchStatus::OutOfContext => "OUT_OF_CONTEXT",
            FetchStatus::IllegalProtocol => "ILLEGAL_PROTOCOL",
            FetchStatus::UserRules => "USER_RULES",
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the scan results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    pub uri: String,
    pub method: String,
    pub status_tag: Option<String>,
    pub is_error: bool,
}

impl DiscoveryRecord {
    pub fn new(
        uri: impl Into<String>,
        method: impl Into<String>,
        status_tag: Option<String>,
        is_error: bool,
    ) -> Self {
        Self {
            uri: uri.into(),
            method: method.into(),
            status_tag,
            is_error,
        }
    }

    /// Valid URIs carry no tag, seeds are tagged `SEED`, anything else is an error
    /// tagged with the status name.
    pub fn classify(uri: impl Into<String>, method: impl Into<String>, status: FetchStatus) -> Self {
        match status {
            FetchStatus::Valid => Self::new(uri, method, None, false),
            FetchStatus::Seed => Self::new(uri, method, Some(status.name().to_string()), false),
            other => Self::new(uri, method, Some(other.name().to_string()), true),
        }
    }
}
