//! Off-chain provenance documents checked against the ledger by a buyer.

use coldtrace_authority::AuthorityRegistry;
use coldtrace_certificate::CertificateVerifier;
use coldtrace_crypto::AuthorityKeypair;
use coldtrace_ledger::*;
use coldtrace_store::{matches_hash, publish, ContentStore, InMemoryContentStore, ProvenanceDocument};
use std::sync::Arc;

fn bananas(quantity: u64) -> ProvenanceDocument {
    ProvenanceDocument {
        barcode: "7391413312094".into(),
        quantity,
        product_name: "Madagascar Bananas".into(),
        produce_date: "24/11/2023".into(),
        expiry_date: "30/12/2023".into(),
        producer: "Fruits Orchard".into(),
        location: "Newcastle, NSW".into(),
        phone: "04222333990".into(),
        email: "hello@fruitsorchard.com.au".into(),
        description: "Organic bananas grown without pesticides".into(),
        sale_contract: "#38850138".into(),
    }
}

#[tokio::test]
async fn retailer_checks_document_after_transfer() {
    let admin = Address::from_label("owner");
    let doa = Address::from_label("doa");
    let producer = Address::from_label("producer");
    let retailer = Address::from_label("retailer");
    let authority = AuthorityKeypair::generate();

    let registry = Arc::new(AuthorityRegistry::new(doa));
    registry.add_key(authority.address(), &doa).unwrap();
    let ledger = BatchLedger::new(
        LedgerConfig::new(admin, Address::from_label("oracle")),
        registry,
    );
    ledger.add_producer(producer, &admin).unwrap();
    let store = InMemoryContentStore::new();

    let (hash, locator) = publish(&store, &bananas(3200)).await.unwrap();
    let id = ledger.create_batch(hash, 5, locator, &producer).unwrap();
    ledger
        .add_certificate(&id, CertificateVerifier::issue(&id, &authority), &producer)
        .unwrap();

    // Producer revises the document as part of the sale.
    let (revised_hash, revised_locator) = publish(&store, &bananas(3000)).await.unwrap();
    ledger
        .update_content(&id, revised_hash, Some(revised_locator), &producer)
        .unwrap();
    ledger.update_owner(&id, revised_hash, retailer, &producer).unwrap();

    // Retailer fetches what the ledger points at and checks it.
    let batch = ledger.batch(&id).unwrap();
    assert_eq!(batch.owner, retailer);
    assert!(matches_hash(&store, &batch.storage_ref, &batch.content_hash)
        .await
        .unwrap());

    let bytes = store.get(&batch.storage_ref).await.unwrap();
    assert_eq!(ProvenanceDocument::from_bytes(&bytes).unwrap().quantity, 3000);
    assert!(ledger.verify_product_hash(&id, &ContentHash::hash(&bytes)));
    assert!(!ledger.verify_product_hash(&id, &hash));
}

#[tokio::test]
async fn tampered_document_is_detected() {
    let store = InMemoryContentStore::new();
    let (hash, _) = publish(&store, &bananas(3200)).await.unwrap();

    let forged = serde_json::to_vec(&bananas(9999)).unwrap();
    let forged_locator = store.put(forged).await.unwrap();
    assert!(!matches_hash(&store, &forged_locator, &hash).await.unwrap());
}
