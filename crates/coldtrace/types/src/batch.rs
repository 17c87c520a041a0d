use crate::{Address, Certificate, ContentHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer temperature reading or threshold, in whole degrees.
pub type Temperature = i32;

/// Unguessable batch handle, assigned once at creation and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchId(pub uuid::Uuid);

impl BatchId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque locator into the off-chain content store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageRef(pub String);

impl StorageRef {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificationState {
    Uncertified,
    CertificateStored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceState {
    Compliant,
    NonCompliant,
}

/// The ledger's record of one physical batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub content_hash: ContentHash,
    pub storage_ref: StorageRef,
    pub owner: Address,
    pub producer: Address,
    pub required_temperature: Temperature,
    pub compliant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
    /// Authority the owner expects to certify this batch, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designated_issuer: Option<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// A freshly created batch: compliant, uncertified, owned by its producer.
    pub fn new(
        id: BatchId,
        content_hash: ContentHash,
        required_temperature: Temperature,
        storage_ref: StorageRef,
        producer: Address,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content_hash,
            storage_ref,
            owner: producer,
            producer,
            required_temperature,
            compliant: true,
            certificate: None,
            designated_issuer: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn certification(&self) -> CertificationState {
        if self.certificate.is_some() {
            CertificationState::CertificateStored
        } else {
            CertificationState::Uncertified
        }
    }

    pub fn compliance(&self) -> ComplianceState {
        if self.compliant {
            ComplianceState::Compliant
        } else {
            ComplianceState::NonCompliant
        }
    }

    pub fn is_owned_by(&self, principal: &Address) -> bool {
        self.owner == *principal
    }
}
