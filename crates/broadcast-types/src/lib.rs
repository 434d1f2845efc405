//! Shared value types and the partner repository contract for the
//! broadcast gateway. No runtime or transport concerns live here.

mod broadcast;
mod error;
mod partner;
mod repository;

pub use broadcast::{status, BroadcastReport, BroadcastRequest, PartnerResponse};
pub use error::GatewayError;
pub use partner::{AuthenticationType, Partner, RequestFormat};
pub use repository::{InMemoryPartnerRepository, PartnerRepository};
