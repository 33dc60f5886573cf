use std::collections::BTreeSet;
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use gst_chainbase::{Database, UndoSession};
use gst_core::{ResourceLimitsManager, name::Name};
use gst_proc_macros::name;

const PAYER: Name = Name::new(name!("payer"));

fn setup() -> (UndoSession, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let db = Database::temporary(temp_dir.path()).expect("failed to create database");
    let mut session = db.undo_session().expect("failed to create session");
    ResourceLimitsManager::initialize_database(&mut session)
        .expect("failed to initialize resource limits");
    ResourceLimitsManager::initialize_account(&mut session, PAYER)
        .expect("failed to initialize account");
    // commit finite weights so admission exercises the fair-share check
    // rather than skipping it on the unlimited default
    ResourceLimitsManager::set_account_limits(&mut session, PAYER, -1, 1000, 1000)
        .expect("failed to set account limits");
    ResourceLimitsManager::process_account_limit_updates(&mut session)
        .expect("failed to commit account limits");
    (session, temp_dir)
}

fn bench(params: (&mut UndoSession, &BTreeSet<Name>, u64)) {
    let (session, accounts, slot) = params;
    ResourceLimitsManager::add_transaction_usage(session, accounts, 100, 100, slot)
        .expect("admission failed");
    ResourceLimitsManager::process_block_usage(session, slot).expect("block rollup failed");
}

fn criterion_benchmark(c: &mut Criterion) {
    let (mut session, _temp_dir) = setup();
    let accounts = BTreeSet::from([PAYER]);
    let mut slot = 0u64;

    c.bench_function("add_transaction_usage", |b| {
        b.iter(|| {
            slot += 1;
            bench(black_box((&mut session, &accounts, slot)))
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
