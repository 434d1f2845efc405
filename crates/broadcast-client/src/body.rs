use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use broadcast_types::{AuthenticationType, Partner, RequestFormat};

/// `base_url + start_charging_endpoint`, string concatenation with no
/// path normalization.
pub(crate) fn build_url(partner: &Partner) -> String {
    format!("{}{}", partner.base_url, partner.start_charging_endpoint)
}

/// The outbound body and its content-type, shaped per `request_format`.
pub(crate) fn build_body(partner: &Partner, uid: &str) -> (Vec<u8>, &'static str) {
    let timestamp = Utc::now().to_rfc3339();
    let request_id = uuid::Uuid::new_v4().to_string();

    match partner.request_format {
        RequestFormat::Json => {
            let body = serde_json::json!({
                partner.uid_field_name.clone(): uid,
                "timestamp": timestamp,
                "requestId": request_id,
            });
            (
                serde_json::to_vec(&body).expect("json serialization of a simple object cannot fail"),
                "application/json",
            )
        }
        RequestFormat::Xml => {
            let field = quick_xml::escape::escape(&partner.uid_field_name);
            let uid_escaped = quick_xml::escape::escape(uid);
            let body = format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <StartChargingRequest>\
                 <{field}>{uid_escaped}</{field}>\
                 <timestamp>{timestamp}</timestamp>\
                 <requestId>{request_id}</requestId>\
                 </StartChargingRequest>"
            );
            (body.into_bytes(), "application/xml")
        }
        RequestFormat::FormData => {
            let pairs = [
                (partner.uid_field_name.as_str(), uid),
                ("timestamp", timestamp.as_str()),
                ("requestId", request_id.as_str()),
            ];
            let body = serde_urlencoded::to_string(pairs)
                .expect("urlencoding a flat string map cannot fail");
            (body.into_bytes(), "application/x-www-form-urlencoded")
        }
    }
}

/// Content-type, authentication, then `custom_headers` merged last
/// (overwriting any prior header with the same name, case-insensitive).
pub(crate) fn build_headers(partner: &Partner, content_type: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("application/json"),
    );

    match partner.authentication_type {
        AuthenticationType::None => {}
        AuthenticationType::ApiKey => {
            if let Some(key) = partner.api_key.as_deref() {
                if let Ok(value) = HeaderValue::from_str(key) {
                    headers.insert(HeaderName::from_static("x-api-key"), value);
                }
            }
        }
        AuthenticationType::Bearer => {
            if let Some(key) = partner.api_key.as_deref() {
                if let Ok(value) = HeaderValue::from_str(&format!("Bearer {key}")) {
                    headers.insert(AUTHORIZATION, value);
                }
            }
        }
        AuthenticationType::Basic => {
            let key = partner.api_key.as_deref().unwrap_or_default();
            // A missing ':' separator is preserved as a no-auth send,
            // matching the upstream partner integration, rather than
            // failing the call outright.
            if let Some((user, password)) = key.split_once(':') {
                let encoded = BASE64.encode(format!("{user}:{password}"));
                if let Ok(value) = HeaderValue::from_str(&format!("Basic {encoded}")) {
                    headers.insert(AUTHORIZATION, value);
                }
            } else {
                tracing::warn!(
                    partner_id = %partner.id,
                    "BASIC api_key has no ':' separator; sending without Authorization header"
                );
            }
        }
    }

    for (name, value) in &partner.custom_headers {
        let Ok(header_name) = HeaderName::try_from(name.as_str()) else {
            continue;
        };
        let Ok(header_value) = HeaderValue::from_str(value) else {
            continue;
        };
        if headers.contains_key(&header_name) {
            tracing::warn!(
                partner_id = %partner.id,
                header = %name,
                "custom_headers overrides a reserved header"
            );
        }
        headers.insert(header_name, header_value);
    }

    headers
}
