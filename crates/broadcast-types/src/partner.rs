use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// How the partner expects the hub to authenticate outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthenticationType {
    None,
    ApiKey,
    Bearer,
    Basic,
}

impl fmt::Display for AuthenticationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthenticationType::None => "NONE",
            AuthenticationType::ApiKey => "API_KEY",
            AuthenticationType::Bearer => "BEARER",
            AuthenticationType::Basic => "BASIC",
        };
        f.write_str(s)
    }
}

impl FromStr for AuthenticationType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(AuthenticationType::None),
            "API_KEY" => Ok(AuthenticationType::ApiKey),
            "BEARER" => Ok(AuthenticationType::Bearer),
            "BASIC" => Ok(AuthenticationType::Basic),
            other => Err(GatewayError::InvalidPartner {
                id: String::new(),
                reason: format!("unknown authentication_type {other:?}"),
            }),
        }
    }
}

/// The outbound body shape used for the start-charging request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestFormat {
    Json,
    Xml,
    FormData,
}

impl FromStr for RequestFormat {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Unknown values fall back to JSON, per spec.
        match s.to_ascii_uppercase().as_str() {
            "XML" => Ok(RequestFormat::Xml),
            "FORM_DATA" => Ok(RequestFormat::FormData),
            _ => Ok(RequestFormat::Json),
        }
    }
}

/// A charge-point operator reachable over HTTP with a partner-specific
/// request/response contract expressed entirely as configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub start_charging_endpoint: String,
    pub authentication_type: AuthenticationType,
    /// Raw key (API_KEY), token (BEARER), or `user:password` (BASIC).
    pub api_key: Option<String>,
    pub request_format: RequestFormat,
    pub uid_field_name: String,
    pub success_status_pattern: String,
    pub response_status_path: String,
    pub response_message_path: String,
    pub timeout_ms: u64,
    pub custom_headers: HashMap<String, String>,
}

impl Partner {
    /// Validates the partner record's invariants and clamps `timeout_ms`.
    ///
    /// `clamp_timeout_ms` is the global broadcast deadline; a partner's
    /// per-request timeout must never exceed it.
    pub fn validated(mut self, clamp_timeout_ms: u64) -> Result<Self, GatewayError> {
        if self.base_url.trim().is_empty() {
            return Err(GatewayError::InvalidPartner {
                id: self.id,
                reason: "base_url must not be empty".into(),
            });
        }
        if self.start_charging_endpoint.trim().is_empty() {
            return Err(GatewayError::InvalidPartner {
                id: self.id,
                reason: "start_charging_endpoint must not be empty".into(),
            });
        }
        if self.timeout_ms == 0 {
            self.timeout_ms = 5000;
        }
        if self.timeout_ms > clamp_timeout_ms {
            tracing::warn!(
                partner_id = %self.id,
                timeout_ms = self.timeout_ms,
                clamp_timeout_ms,
                "partner timeout_ms exceeds global broadcast deadline; clamping"
            );
            self.timeout_ms = clamp_timeout_ms;
        }

        match self.authentication_type {
            AuthenticationType::None => {}
            AuthenticationType::Basic => {
                let key = self.api_key.as_deref().unwrap_or_default();
                if key.matches(':').count() != 1 {
                    tracing::warn!(
                        partner_id = %self.id,
                        "BASIC api_key is malformed (expected exactly one ':'); \
                         requests will be sent without an Authorization header"
                    );
                }
            }
            AuthenticationType::ApiKey | AuthenticationType::Bearer => {
                if self.api_key.as_deref().unwrap_or_default().trim().is_empty() {
                    return Err(GatewayError::InvalidPartner {
                        id: self.id,
                        reason: format!(
                            "authentication_type {} requires a non-empty api_key",
                            self.authentication_type
                        ),
                    });
                }
            }
        }

        Ok(self)
    }
}
