//! The end-to-end batch scenario: a producer ships certified bananas to a
//! distributor while the oracle watches the cold chain.

use anyhow::{bail, Context};
use clap::Args;
use coldtrace_authority::AuthorityRegistry;
use coldtrace_certificate::CertificateVerifier;
use coldtrace_crypto::AuthorityKeypair;
use coldtrace_ledger::{Address, BatchId, BatchLedger, LedgerConfig, LedgerError, Temperature};
use coldtrace_oracle::{FixedFeed, OracleWorker, SimulatedFeed, TemperatureFeed};
use coldtrace_store::{matches_hash, publish, InMemoryContentStore, ProvenanceDocument};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Ledger configuration file (defaults to the built-in template)
    #[arg(short, long, env = "COLDTRACE_CONFIG")]
    config: Option<PathBuf>,

    /// Fixed oracle reading; omit to draw from the configured probe range
    #[arg(short, long, allow_hyphen_values = true)]
    reading: Option<Temperature>,

    /// Required storage temperature of the batch
    #[arg(short, long, default_value_t = 5, allow_hyphen_values = true)]
    threshold: Temperature,

    /// Certifying authority secret key (hex); a fresh key is generated if omitted
    #[arg(long, env = "COLDTRACE_AUTHORITY_SECRET")]
    authority_secret: Option<String>,

    /// Seconds to wait for the oracle reply
    #[arg(long, default_value_t = 5)]
    oracle_timeout: u64,
}

fn step(n: usize, title: &str) {
    println!();
    println!(" ── Step {}/6: {} ──", n, title);
}

fn ok(msg: &str) {
    println!("   [OK]  {}", msg);
}

fn info(msg: &str) {
    println!("   [--]  {}", msg);
}

fn warn(msg: &str) {
    println!("   [!!]  {}", msg);
}

pub async fn run(args: DemoArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LedgerConfig::template(),
    };
    let authority = match &args.authority_secret {
        Some(secret) => AuthorityKeypair::from_secret_hex(secret)?,
        None => AuthorityKeypair::generate(),
    };

    match args.reading {
        Some(reading) => scenario(config, authority, FixedFeed(reading), &args).await,
        None => scenario(config, authority, SimulatedFeed, &args).await,
    }
}

async fn scenario<F>(
    config: LedgerConfig,
    authority: AuthorityKeypair,
    feed: F,
    args: &DemoArgs,
) -> anyhow::Result<()>
where
    F: TemperatureFeed + 'static,
{
    let admin = config.administrator;
    let oracle = config.oracle;
    let doa = Address::from_label("department-of-agriculture");
    let producer = Address::from_label("producer");
    let distributor = Address::from_label("distributor");

    // ── Step 1: trust setup ─────────────────────────────────────────
    step(1, "Trust setup");
    let registry = Arc::new(AuthorityRegistry::new(doa));
    registry.add_key(authority.address(), &doa)?;
    ok(&format!("Authority {} registered", authority.address()));

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let ledger = Arc::new(BatchLedger::try_new(config, registry)?.with_request_channel(tx));
    ledger.add_producer(producer, &admin)?;
    ok(&format!("Producer {} allow-listed", producer));

    let worker = OracleWorker::new(oracle, feed, ledger.clone()).spawn(rx);
    tracing::debug!(oracle = %oracle, "Oracle worker started");

    // ── Step 2: create the batch ────────────────────────────────────
    step(2, "Create batch");
    let store = InMemoryContentStore::new();
    let document = ProvenanceDocument {
        barcode: "7391413312094".into(),
        quantity: 3200,
        product_name: "Madagascar Bananas".into(),
        produce_date: "24/11/2023".into(),
        expiry_date: "30/12/2023".into(),
        producer: "Fruits Orchard".into(),
        location: "Newcastle, NSW".into(),
        phone: "04222333990".into(),
        email: "hello@fruitsorchard.com.au".into(),
        description: "Organic bananas grown without pesticides".into(),
        sale_contract: "#38850138".into(),
    };
    let (content_hash, locator) = publish(&store, &document).await?;
    let id = ledger.create_batch(content_hash, args.threshold, locator, &producer)?;
    let batch = ledger.batch(&id)?;
    ok(&format!("Batch {} created", id));
    info(&format!(
        "compliant={}  certification={:?}  locator={}",
        batch.compliant,
        batch.certification(),
        batch.storage_ref
    ));

    // ── Step 3: certification ───────────────────────────────────────
    step(3, "Certification");
    ledger.add_certificate(&id, CertificateVerifier::issue(&id, &authority), &producer)?;
    if !ledger.verify_certificate(&id) {
        bail!("certificate for {} does not verify", id);
    }
    ok("Certificate stored and verified");

    // ── Step 4: temperature check ───────────────────────────────────
    step(4, "Temperature check");
    ledger.request_temperature_check(&id, &producer)?;
    info("Request sent to oracle");
    await_reply(&ledger, &id, Duration::from_secs(args.oracle_timeout)).await?;
    if ledger.is_compliant(&id)? {
        ok(&format!("Reading within {}°, batch compliant", args.threshold));
    } else {
        warn(&format!("Reading above {}°, batch non-compliant", args.threshold));
        ledger.update_status(&id, true, &producer)?;
        ok("Physical inspection passed, compliance restored by owner");
    }

    // ── Step 5: transfer ────────────────────────────────────────────
    step(5, "Transfer to distributor");
    ledger.update_owner(&id, content_hash, distributor, &producer)?;
    ok(&format!("Owner is now {}", ledger.batch(&id)?.owner));
    match ledger.add_certificate(&id, CertificateVerifier::issue(&id, &authority), &producer) {
        Err(LedgerError::Unauthorized { .. }) => ok("Previous owner can no longer modify the batch"),
        Err(e) => bail!("unexpected error: {}", e),
        Ok(()) => bail!("previous owner still holds mutation rights"),
    }

    // ── Step 6: buyer-side checks ───────────────────────────────────
    step(6, "Distributor verification");
    let batch = ledger.batch(&id)?;
    if matches_hash(&store, &batch.storage_ref, &batch.content_hash).await? {
        ok("Provenance document matches the ledger hash");
    } else {
        bail!("provenance document does not match the ledger hash");
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&batch)?);

    worker.abort();
    tracing::info!(batch = %id, owner = %batch.owner, "Demo scenario complete");
    Ok(())
}

/// Wait until the oracle has consumed the pending request for `id`.
async fn await_reply(ledger: &BatchLedger, id: &BatchId, timeout: Duration) -> anyhow::Result<()> {
    tracing::debug!(batch = %id, ?timeout, "Waiting for oracle reply");
    let waited = tokio::time::timeout(timeout, async {
        while ledger.pending_request(id).is_some() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    if waited.is_err() {
        tracing::warn!(batch = %id, ?timeout, "Oracle reply timed out; request left pending");
    }
    waited.with_context(|| format!("oracle did not answer for batch {} within {:?}", id, timeout))
}
