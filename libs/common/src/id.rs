//! Prefixed ULIDs for every record the traffic service mints.

use ulid::Ulid;

/// What an id names. The prefix makes ids self-describing in logs and URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Session,
    Reading,
    Incident,
    Alert,
}

impl IdKind {
    pub const fn prefix(self) -> &'static str {
        match self {
            IdKind::Session => "ws",
            IdKind::Reading => "rdg",
            IdKind::Incident => "inc",
            IdKind::Alert => "alt",
        }
    }

    /// A fresh id such as `inc_01HV...`.
    ///
    /// ```
    /// use traffic_common::IdKind;
    /// assert!(IdKind::Reading.generate().starts_with("rdg_"));
    /// ```
    pub fn generate(self) -> String {
        format!("{}_{}", self.prefix(), Ulid::new())
    }
}
