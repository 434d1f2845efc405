use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Status sentinels synthesized by the client/orchestrator rather than
/// extracted from a partner's response body.
pub mod status {
    pub const ERROR: &str = "ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const CIRCUIT_BREAKER_OPEN: &str = "CIRCUIT_BREAKER_OPEN";
    pub const NOT_APPLICABLE: &str = "N/A";
    pub const EXTRACTION_ERROR: &str = "EXTRACTION_ERROR";
}

/// `{uid: non-empty string}` — the inbound request the orchestrator consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    uid: String,
}

impl BroadcastRequest {
    pub fn new(uid: impl Into<String>) -> Result<Self, GatewayError> {
        let uid = uid.into();
        if uid.trim().is_empty() {
            return Err(GatewayError::EmptyUid);
        }
        Ok(Self { uid })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }
}

/// Produced per partner per attempt; never mutated after emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerResponse {
    pub partner_id: String,
    pub success: bool,
    pub status: String,
    pub message: String,
    pub response_time_ms: u64,
    pub timeout: bool,
    pub circuit_breaker_open: bool,
}

impl PartnerResponse {
    pub fn circuit_breaker_open(partner_id: impl Into<String>) -> Self {
        Self {
            partner_id: partner_id.into(),
            success: false,
            status: status::CIRCUIT_BREAKER_OPEN.to_string(),
            message: "Service temporarily unavailable — circuit breaker open".to_string(),
            response_time_ms: 0,
            timeout: false,
            circuit_breaker_open: true,
        }
    }
}

/// `{success, message, responding_partner?, partner_responses[], total_time_ms}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub success: bool,
    pub message: String,
    pub responding_partner: Option<String>,
    pub partner_responses: Vec<PartnerResponse>,
    pub total_time_ms: u64,
}

impl BroadcastReport {
    pub fn no_active_partners(total_time_ms: u64) -> Self {
        Self {
            success: false,
            message: "No active partners available".to_string(),
            responding_partner: None,
            partner_responses: Vec::new(),
            total_time_ms,
        }
    }

    pub fn success(
        responding_partner: String,
        partner_responses: Vec<PartnerResponse>,
        total_time_ms: u64,
    ) -> Self {
        Self {
            success: true,
            message: format!("Charging started successfully with partner {responding_partner}"),
            responding_partner: Some(responding_partner),
            partner_responses,
            total_time_ms,
        }
    }

    pub fn no_success(partner_responses: Vec<PartnerResponse>, total_time_ms: u64) -> Self {
        let n = partner_responses.len();
        let successes = partner_responses.iter().filter(|r| r.success).count();
        let timeouts = partner_responses.iter().filter(|r| r.timeout).count();
        let errors = partner_responses
            .iter()
            .filter(|r| !r.success && !r.timeout)
            .count();
        Self {
            success: false,
            message: format!(
                "No partner accepted the charging request. {n} partners responded \
                 ({successes} success, {timeouts} timeouts, {errors} errors)"
            ),
            responding_partner: None,
            partner_responses,
            total_time_ms,
        }
    }
}
