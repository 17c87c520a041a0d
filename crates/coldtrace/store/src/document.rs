use serde::{Deserialize, Serialize};

/// Producer-supplied description of a batch, kept off-chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceDocument {
    pub barcode: String,
    pub quantity: u64,
    pub product_name: String,
    pub produce_date: String,
    pub expiry_date: String,
    pub producer: String,
    pub location: String,
    pub phone: String,
    pub email: String,
    pub description: String,
    pub sale_contract: String,
}

impl ProvenanceDocument {
    /// Canonical bytes: compact JSON in field declaration order.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
