use thiserror::Error;

/// Errors surfaced by the shared value types and the repository contract.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A `Partner` record failed one of its construction invariants.
    #[error("invalid partner record for {id:?}: {reason}")]
    InvalidPartner { id: String, reason: String },

    /// A `BroadcastRequest` carried an empty uid.
    #[error("uid must not be empty")]
    EmptyUid,

    /// The repository has no record for the requested id.
    #[error("no partner found for id {0:?}")]
    PartnerNotFound(String),

    /// The repository collaborator failed; carries its own message since
    /// the concrete persistence error type lives outside this crate's scope.
    #[error("repository error: {0}")]
    Repository(String),
}
