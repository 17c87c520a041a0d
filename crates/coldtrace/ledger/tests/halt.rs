//! The halt switch freezes every batch and oracle operation while leaving
//! queries and administration available.

use coldtrace_authority::AuthorityRegistry;
use coldtrace_certificate::CertificateVerifier;
use coldtrace_crypto::AuthorityKeypair;
use coldtrace_ledger::*;
use std::sync::Arc;

struct World {
    admin: Address,
    oracle: Address,
    producer: Address,
    authority: AuthorityKeypair,
    ledger: BatchLedger,
    batch: BatchId,
}

fn world() -> World {
    let admin = Address::from_label("owner");
    let doa = Address::from_label("doa");
    let oracle = Address::from_label("oracle");
    let producer = Address::from_label("producer");
    let authority = AuthorityKeypair::generate();

    let registry = Arc::new(AuthorityRegistry::new(doa));
    registry.add_key(authority.address(), &doa).unwrap();
    let ledger = BatchLedger::new(LedgerConfig::new(admin, oracle), registry);
    ledger.add_producer(producer, &admin).unwrap();
    let batch = ledger
        .create_batch(ContentHash::hash(b"p"), 5, StorageRef::new("cid-1"), &producer)
        .unwrap();

    World {
        admin,
        oracle,
        producer,
        authority,
        ledger,
        batch,
    }
}

#[test]
fn every_mutation_fails_while_halted() {
    let w = world();
    let id = w.batch;
    w.ledger.request_temperature_check(&id, &w.producer).unwrap();
    let before = w.ledger.batch(&id).unwrap();

    w.ledger.halt(&w.admin).unwrap();
    assert!(w.ledger.is_halted());

    assert_eq!(
        w.ledger
            .create_batch(ContentHash::hash(b"q"), 5, StorageRef::new("cid-2"), &w.producer),
        Err(LedgerError::Halted)
    );
    assert_eq!(
        w.ledger.add_certificate(
            &id,
            CertificateVerifier::issue(&id, &w.authority),
            &w.producer
        ),
        Err(LedgerError::Halted)
    );
    assert_eq!(
        w.ledger
            .update_owner(&id, ContentHash::hash(b"p"), w.admin, &w.producer),
        Err(LedgerError::Halted)
    );
    assert_eq!(
        w.ledger
            .update_content(&id, ContentHash::hash(b"q"), None, &w.producer),
        Err(LedgerError::Halted)
    );
    assert_eq!(
        w.ledger.update_status(&id, false, &w.producer),
        Err(LedgerError::Halted)
    );
    assert_eq!(
        w.ledger.designate_issuer(&id, w.admin, &w.producer),
        Err(LedgerError::Halted)
    );
    assert_eq!(
        w.ledger.request_temperature_check(&id, &w.producer),
        Err(LedgerError::Halted)
    );
    assert_eq!(
        w.ledger.oracle_respond(&id, 9, &w.oracle),
        Err(LedgerError::Halted)
    );

    assert_eq!(w.ledger.batch(&id).unwrap(), before);
    assert_eq!(w.ledger.len(), 1);
    assert!(w.ledger.pending_request(&id).is_some());
}

#[test]
fn halt_gate_is_checked_before_authorization() {
    let w = world();
    w.ledger.halt(&w.admin).unwrap();
    let stranger = Address::from_label("bad-actor");
    assert_eq!(
        w.ledger.update_status(&w.batch, false, &stranger),
        Err(LedgerError::Halted)
    );
    assert_eq!(
        w.ledger.update_status(&BatchId::generate(), false, &w.producer),
        Err(LedgerError::Halted)
    );
}

#[test]
fn queries_remain_available_while_halted() {
    let w = world();
    w.ledger
        .add_certificate(
            &w.batch,
            CertificateVerifier::issue(&w.batch, &w.authority),
            &w.producer,
        )
        .unwrap();
    w.ledger.halt(&w.admin).unwrap();

    assert!(w.ledger.verify_certificate(&w.batch));
    assert!(w.ledger.verify_product_hash(&w.batch, &ContentHash::hash(b"p")));
    assert!(w.ledger.is_compliant(&w.batch).unwrap());
    assert_eq!(
        w.ledger.storage_reference(&w.batch).unwrap(),
        StorageRef::new("cid-1")
    );
    assert!(w.ledger.certificate(&w.batch).unwrap().is_some());
    assert!(w.ledger.is_producer(&w.producer));
}

#[test]
fn resume_restores_operations() {
    let w = world();
    w.ledger.halt(&w.admin).unwrap();
    assert_eq!(
        w.ledger.update_status(&w.batch, false, &w.producer),
        Err(LedgerError::Halted)
    );

    w.ledger.resume(&w.admin).unwrap();
    w.ledger.update_status(&w.batch, false, &w.producer).unwrap();
    assert!(!w.ledger.is_compliant(&w.batch).unwrap());
}

#[test]
fn halt_transitions_are_strict_and_admin_only() {
    let w = world();
    assert_eq!(w.ledger.resume(&w.admin), Err(LedgerError::NotHalted));
    assert!(matches!(
        w.ledger.halt(&w.producer),
        Err(LedgerError::Unauthorized { .. })
    ));
    w.ledger.halt(&w.admin).unwrap();
    assert_eq!(w.ledger.halt(&w.admin), Err(LedgerError::AlreadyHalted));
    assert!(matches!(
        w.ledger.resume(&w.producer),
        Err(LedgerError::Unauthorized { .. })
    ));
    assert!(w.ledger.is_halted());
}
