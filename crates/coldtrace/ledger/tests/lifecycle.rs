//! End-to-end batch lifecycle: creation, certification, oracle-driven
//! compliance, manual override and certified transfer.

use coldtrace_authority::AuthorityRegistry;
use coldtrace_certificate::CertificateVerifier;
use coldtrace_crypto::AuthorityKeypair;
use coldtrace_ledger::*;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct World {
    admin: Address,
    doa: Address,
    oracle: Address,
    producer: Address,
    authority: AuthorityKeypair,
    registry: Arc<AuthorityRegistry>,
    ledger: BatchLedger,
}

fn world() -> World {
    let admin = Address::from_label("owner");
    let doa = Address::from_label("department-of-agriculture");
    let oracle = Address::from_label("oracle");
    let producer = Address::from_label("producer");
    let authority = AuthorityKeypair::generate();

    let registry = Arc::new(AuthorityRegistry::new(doa));
    registry.add_key(authority.address(), &doa).unwrap();

    let ledger = BatchLedger::new(LedgerConfig::new(admin, oracle), registry.clone());
    ledger.add_producer(producer, &admin).unwrap();

    World {
        admin,
        doa,
        oracle,
        producer,
        authority,
        registry,
        ledger,
    }
}

fn create(w: &World, hash: ContentHash) -> BatchId {
    w.ledger
        .create_batch(hash, 5, StorageRef::new("cid-1"), &w.producer)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn full_scenario() {
    let w = world();
    let h1 = ContentHash::hash(b"Madagascar Bananas, 3200 units");
    let b1 = create(&w, h1);

    let batch = w.ledger.batch(&b1).unwrap();
    assert!(batch.compliant);
    assert_eq!(batch.certification(), CertificationState::Uncertified);

    // Certify with a registered authority.
    let certificate = CertificateVerifier::issue(&b1, &w.authority);
    w.ledger.add_certificate(&b1, certificate, &w.producer).unwrap();
    assert!(w.ledger.verify_certificate(&b1));
    assert_eq!(
        w.ledger.inspect_certificate(&b1).unwrap(),
        Some(VerificationOutcome::Valid)
    );

    // Oracle reports a breach.
    w.ledger.request_temperature_check(&b1, &w.producer).unwrap();
    assert_eq!(w.ledger.oracle_respond(&b1, 8, &w.oracle), Ok(false));
    assert_eq!(
        w.ledger.batch(&b1).unwrap().compliance(),
        ComplianceState::NonCompliant
    );

    // Manual inspection resets the flag.
    w.ledger.update_status(&b1, true, &w.producer).unwrap();
    assert!(w.ledger.is_compliant(&b1).unwrap());

    // Certified transfer.
    let distributor = Address::from_label("distributor");
    w.ledger.update_owner(&b1, h1, distributor, &w.producer).unwrap();
    assert_eq!(w.ledger.batch(&b1).unwrap().owner, distributor);
    assert_eq!(w.ledger.batch(&b1).unwrap().producer, w.producer);

    let again = CertificateVerifier::issue(&b1, &w.authority);
    assert!(matches!(
        w.ledger.add_certificate(&b1, again, &w.producer),
        Err(LedgerError::Unauthorized { .. })
    ));
}

#[test]
fn transfer_invalidates_old_hash() {
    let w = world();
    let h1 = ContentHash::hash(b"v1");
    let h2 = ContentHash::hash(b"v2");
    let b1 = create(&w, h1);
    w.ledger
        .add_certificate(&b1, CertificateVerifier::issue(&b1, &w.authority), &w.producer)
        .unwrap();

    assert!(w.ledger.verify_product_hash(&b1, &h1));
    let retailer = Address::from_label("retailer");
    w.ledger.update_owner(&b1, h2, retailer, &w.producer).unwrap();

    assert!(!w.ledger.verify_product_hash(&b1, &h1));
    assert!(w.ledger.verify_product_hash(&b1, &h2));
}

#[test]
fn previous_owner_loses_every_mutation_right() {
    let w = world();
    let b1 = create(&w, ContentHash::hash(b"p"));
    w.ledger
        .add_certificate(&b1, CertificateVerifier::issue(&b1, &w.authority), &w.producer)
        .unwrap();
    let distributor = Address::from_label("distributor");
    w.ledger
        .update_owner(&b1, ContentHash::hash(b"p"), distributor, &w.producer)
        .unwrap();

    let unauthorized = |r: Result<_, LedgerError>| matches!(r, Err(LedgerError::Unauthorized { .. }));
    assert!(unauthorized(w.ledger.update_status(&b1, false, &w.producer)));
    assert!(unauthorized(w.ledger.update_content(
        &b1,
        ContentHash::hash(b"x"),
        None,
        &w.producer
    )));
    assert!(unauthorized(w.ledger.request_temperature_check(&b1, &w.producer).map(|_| ())));
    assert!(unauthorized(w.ledger.designate_issuer(&b1, w.doa, &w.producer)));
    assert!(unauthorized(w.ledger.update_owner(
        &b1,
        ContentHash::hash(b"x"),
        w.producer,
        &w.producer
    )));

    // The new owner can act.
    w.ledger.update_status(&b1, false, &distributor).unwrap();
    assert!(!w.ledger.is_compliant(&b1).unwrap());
}

#[test]
fn unregistered_authority_certificate_is_stored_but_invalid() {
    let w = world();
    let b1 = create(&w, ContentHash::hash(b"p"));
    let rogue = AuthorityKeypair::generate();

    w.ledger
        .add_certificate(&b1, CertificateVerifier::issue(&b1, &rogue), &w.producer)
        .unwrap();

    assert_eq!(
        w.ledger.batch(&b1).unwrap().certification(),
        CertificationState::CertificateStored
    );
    assert!(!w.ledger.verify_certificate(&b1));
    assert_eq!(
        w.ledger.inspect_certificate(&b1).unwrap(),
        Some(VerificationOutcome::UntrustedAuthority(rogue.address()))
    );
    assert_eq!(
        w.ledger
            .update_owner(&b1, ContentHash::hash(b"p"), w.admin, &w.producer),
        Err(LedgerError::CertificateInvalid(b1))
    );
}

#[test]
fn certificate_for_another_batch_does_not_verify() {
    let w = world();
    let b1 = create(&w, ContentHash::hash(b"a"));
    let b2 = create(&w, ContentHash::hash(b"b"));

    let replayed = CertificateVerifier::issue(&b1, &w.authority);
    w.ledger.add_certificate(&b2, replayed, &w.producer).unwrap();
    assert!(!w.ledger.verify_certificate(&b2));
}

#[test]
fn revoking_authority_blocks_later_transfer() {
    let w = world();
    let b1 = create(&w, ContentHash::hash(b"p"));
    w.ledger
        .add_certificate(&b1, CertificateVerifier::issue(&b1, &w.authority), &w.producer)
        .unwrap();
    assert!(w.ledger.verify_certificate(&b1));

    w.registry.remove_key(&w.authority.address(), &w.doa).unwrap();
    assert!(!w.ledger.verify_certificate(&b1));
    assert_eq!(
        w.ledger.update_owner(
            &b1,
            ContentHash::hash(b"p"),
            Address::from_label("retailer"),
            &w.producer
        ),
        Err(LedgerError::CertificateInvalid(b1))
    );
    assert_eq!(w.ledger.batch(&b1).unwrap().owner, w.producer);
}

#[test]
fn designated_issuer_must_match_certificate() {
    let w = world();
    let b1 = create(&w, ContentHash::hash(b"p"));
    w.ledger
        .add_certificate(&b1, CertificateVerifier::issue(&b1, &w.authority), &w.producer)
        .unwrap();

    w.ledger
        .designate_issuer(&b1, Address::from_label("another-ca"), &w.producer)
        .unwrap();
    assert!(!w.ledger.verify_issuer(&b1));

    w.ledger
        .designate_issuer(&b1, w.authority.address(), &w.producer)
        .unwrap();
    assert!(w.ledger.verify_issuer(&b1));
}

#[test]
fn removed_producer_cannot_create_but_keeps_batches() {
    let w = world();
    let b1 = create(&w, ContentHash::hash(b"p"));
    w.ledger.remove_producer(&w.producer, &w.admin).unwrap();

    assert!(matches!(
        w.ledger
            .create_batch(ContentHash::hash(b"q"), 5, StorageRef::new("cid-2"), &w.producer),
        Err(LedgerError::Unauthorized { .. })
    ));
    w.ledger.update_status(&b1, false, &w.producer).unwrap();
    assert_eq!(w.ledger.batch_ids(), vec![b1]);
}
