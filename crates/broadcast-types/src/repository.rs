use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::partner::Partner;

/// The persistence collaborator the cache sits in front of. Column-level
/// encryption of `api_key` and the concrete database driver are both out of
/// scope here; implementors receive and return already-decrypted `Partner`
/// values.
#[async_trait]
pub trait PartnerRepository: Send + Sync {
    async fn find_active(&self) -> Result<Vec<Partner>, GatewayError>;
    async fn find_by_id_and_enabled(&self, id: &str) -> Result<Option<Partner>, GatewayError>;
    async fn save(&self, partner: Partner) -> Result<Partner, GatewayError>;
    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), GatewayError>;
}

#[derive(Debug, Clone)]
struct Record {
    partner: Partner,
    enabled: bool,
}

/// An in-memory `PartnerRepository` used by the cache's own tests and by
/// the binary's default wiring, since no concrete database driver is part
/// of this system's scope.
#[derive(Default)]
pub struct InMemoryPartnerRepository {
    records: Mutex<HashMap<String, Record>>,
}

impl InMemoryPartnerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(partners: impl IntoIterator<Item = Partner>) -> Self {
        let repo = Self::new();
        {
            let mut records = repo.records.lock().unwrap();
            for partner in partners {
                records.insert(
                    partner.id.clone(),
                    Record {
                        partner,
                        enabled: true,
                    },
                );
            }
        }
        repo
    }
}

#[async_trait]
impl PartnerRepository for InMemoryPartnerRepository {
    async fn find_active(&self) -> Result<Vec<Partner>, GatewayError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|r| r.enabled)
            .map(|r| r.partner.clone())
            .collect())
    }

    async fn find_by_id_and_enabled(&self, id: &str) -> Result<Option<Partner>, GatewayError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .get(id)
            .filter(|r| r.enabled)
            .map(|r| r.partner.clone()))
    }

    async fn save(&self, partner: Partner) -> Result<Partner, GatewayError> {
        let mut records = self.records.lock().unwrap();
        let entry = records.entry(partner.id.clone()).or_insert(Record {
            partner: partner.clone(),
            enabled: true,
        });
        entry.partner = partner.clone();
        Ok(partner)
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), GatewayError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(id)
            .ok_or_else(|| GatewayError::PartnerNotFound(id.to_string()))?;
        record.enabled = enabled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partner::{AuthenticationType, RequestFormat};
    use std::collections::HashMap as StdHashMap;

    fn partner(id: &str) -> Partner {
        Partner {
            id: id.to_string(),
            name: id.to_string(),
            base_url: "https://example.test".into(),
            start_charging_endpoint: "/start".into(),
            authentication_type: AuthenticationType::None,
            api_key: None,
            request_format: RequestFormat::Json,
            uid_field_name: "uid".into(),
            success_status_pattern: "success".into(),
            response_status_path: "status".into(),
            response_message_path: "message".into(),
            timeout_ms: 5000,
            custom_headers: StdHashMap::new(),
        }
    }

    #[tokio::test]
    async fn disable_removes_from_active_set() {
        let repo = InMemoryPartnerRepository::seeded([partner("a"), partner("b")]);
        assert_eq!(repo.find_active().await.unwrap().len(), 2);

        repo.set_enabled("a", false).await.unwrap();
        let active = repo.find_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "b");
        assert!(repo.find_by_id_and_enabled("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_enabled_on_missing_id_errors() {
        let repo = InMemoryPartnerRepository::new();
        assert!(repo.set_enabled("missing", true).await.is_err());
    }
}
