use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::Value;

use broadcast_breaker::BreakerRegistry;
use broadcast_types::{status, Partner, PartnerResponse};

use crate::body::{build_body, build_headers, build_url};
use crate::extract::{extract_path, matches_success_pattern};

/// Transforms a `(partner, uid)` pair into a single HTTP exchange
/// protected by the partner's circuit breaker.
pub struct PartnerHttpClient {
    http: Client,
    breakers: Arc<BreakerRegistry>,
}

impl PartnerHttpClient {
    pub fn new(breakers: Arc<BreakerRegistry>) -> Self {
        Self {
            http: Client::new(),
            breakers,
        }
    }

    pub async fn send(&self, partner: &Partner, uid: &str) -> PartnerResponse {
        if !self.breakers.acquire(&partner.id) {
            return PartnerResponse::circuit_breaker_open(partner.id.clone());
        }

        let url = build_url(partner);
        let (body, content_type) = build_body(partner, uid);
        let headers = build_headers(partner, content_type);
        let timeout = Duration::from_millis(partner.timeout_ms);

        let started = Instant::now();
        let outcome = tokio::time::timeout(
            timeout,
            self.http.post(&url).headers(headers).body(body).send(),
        )
        .await;
        let elapsed = started.elapsed();

        let response = match outcome {
            Err(_) => {
                self.breakers.record_failure(&partner.id, elapsed);
                return PartnerResponse {
                    partner_id: partner.id.clone(),
                    success: false,
                    status: status::ERROR.to_string(),
                    message: format!("Request timed out after {}ms", timeout.as_millis()),
                    response_time_ms: elapsed.as_millis() as u64,
                    timeout: true,
                    circuit_breaker_open: false,
                };
            }
            Ok(Err(err)) => {
                self.breakers.record_failure(&partner.id, elapsed);
                let message = err.to_string();
                let timeout = message.to_ascii_lowercase().contains("timeout");
                return PartnerResponse {
                    partner_id: partner.id.clone(),
                    success: false,
                    status: status::ERROR.to_string(),
                    message,
                    response_time_ms: elapsed.as_millis() as u64,
                    timeout,
                    circuit_breaker_open: false,
                };
            }
            Ok(Ok(response)) => response,
        };

        if !response.status().is_success() {
            let status_code = response.status();
            self.breakers.record_failure(&partner.id, elapsed);
            return PartnerResponse {
                partner_id: partner.id.clone(),
                success: false,
                status: status::ERROR.to_string(),
                message: format!("partner responded with HTTP {status_code}"),
                response_time_ms: elapsed.as_millis() as u64,
                timeout: false,
                circuit_breaker_open: false,
            };
        }

        let body_text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                self.breakers.record_failure(&partner.id, elapsed);
                return PartnerResponse {
                    partner_id: partner.id.clone(),
                    success: false,
                    status: status::ERROR.to_string(),
                    message: format!("failed to read response body: {err}"),
                    response_time_ms: elapsed.as_millis() as u64,
                    timeout: false,
                    circuit_breaker_open: false,
                };
            }
        };

        let parsed: Result<Value, _> = serde_json::from_str(&body_text);
        let Ok(Value::Object(_)) = parsed else {
            self.breakers.record_failure(&partner.id, elapsed);
            return PartnerResponse {
                partner_id: partner.id.clone(),
                success: false,
                status: status::ERROR.to_string(),
                message: "response body was not a JSON object".to_string(),
                response_time_ms: elapsed.as_millis() as u64,
                timeout: false,
                circuit_breaker_open: false,
            };
        };
        let body_json = parsed.unwrap();

        let extracted_status = extract_path(&body_json, &partner.response_status_path);
        let message = extract_path(&body_json, &partner.response_message_path);
        let success = matches_success_pattern(&partner.success_status_pattern, &extracted_status);

        self.breakers.record_success(&partner.id, elapsed);

        PartnerResponse {
            partner_id: partner.id.clone(),
            success,
            status: extracted_status,
            message,
            response_time_ms: elapsed.as_millis() as u64,
            timeout: false,
            circuit_breaker_open: false,
        }
    }
}
