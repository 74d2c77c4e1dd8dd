//! Persistence Tests - Real File Adapters on Scratch Directories
//!
//! Exercises the session store and trade journal against the actual
//! filesystem in uuid-suffixed scratch directories under the system temp
//! dir. Covers the round-trip fidelity of serialized sessions (Decimal,
//! Uuid, timestamps), overwrite and delete semantics, and the journal's
//! oldest-first ordering and malformed-line tolerance.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use eth_paper_trader::adapters::persistence::{FileSessionStore, FileTradeJournal};
use eth_paper_trader::domain::{
    Ledger, MarketSnapshot, TradeAction, TradeDecision, DEFAULT_REFERENCE_ADDRESS,
};
use eth_paper_trader::ports::journal::{JournalRecord, TradeJournal};
use eth_paper_trader::ports::session_store::SessionStore;

const TOKEN: &str = "0x1111111111111111111111111111111111111111";
const SESSION_KEY: &str = "simulationState";

// ---- Fixtures ----

/// Fresh scratch directory for one test, removed by the caller when done.
fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("eth-paper-trader-test-{}", Uuid::new_v4()))
}

fn ledger() -> Ledger {
    Ledger::new(DEFAULT_REFERENCE_ADDRESS, "WETH", dec!(10))
}

fn token_snapshot(price_usd: rust_decimal::Decimal, price_native: rust_decimal::Decimal) -> MarketSnapshot {
    MarketSnapshot {
        address: TOKEN.to_string(),
        symbol: "AAA".to_string(),
        price_usd,
        price_native,
        liquidity_usd: 500_000.0,
        volume_h24: None,
        price_change_h24: None,
        buys_h24: None,
        sells_h24: None,
        fdv: None,
        market_cap: None,
    }
}

/// A session with a real position and trade history, so the round trip
/// covers every serialized field shape.
fn session_with_position() -> eth_paper_trader::domain::Session {
    let ledger = ledger();
    let mut session = ledger.start_session(dec!(2000));
    let decision = TradeDecision {
        address: TOKEN.to_string(),
        symbol: "AAA".to_string(),
        price_usd: dec!(100),
        action: TradeAction::Buy,
        amount: dec!(5),
        rationale: "momentum".to_string(),
    };
    ledger
        .apply_decision(&mut session, &decision, &token_snapshot(dec!(100), dec!(0.05)))
        .unwrap();
    session
}

fn record(session_id: Uuid, minutes_ago: i64, symbol: &str) -> JournalRecord {
    JournalRecord {
        session_id,
        trade: eth_paper_trader::domain::TradeRecord {
            address: TOKEN.to_string(),
            symbol: symbol.to_string(),
            action: TradeAction::Buy,
            amount: dec!(5),
            price_usd: dec!(100),
            executed_at: Utc::now() - Duration::minutes(minutes_ago),
        },
    }
}

// ---- Session Store ----

#[tokio::test]
async fn test_set_get_round_trip_preserves_session() {
    let dir = scratch_dir();
    let store = FileSessionStore::new(dir.to_str().unwrap()).await.unwrap();

    let session = session_with_position();
    store.set(SESSION_KEY, &session).await.unwrap();

    let loaded = store.get(SESSION_KEY).await.unwrap().unwrap();
    assert_eq!(loaded, session);
    assert_eq!(loaded.portfolio.len(), 2);
    assert_eq!(loaded.history.len(), 1);
    assert_eq!(
        loaded.portfolio.get(DEFAULT_REFERENCE_ADDRESS).unwrap().amount,
        dec!(9.75)
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_set_overwrites_previous_session() {
    let dir = scratch_dir();
    let store = FileSessionStore::new(dir.to_str().unwrap()).await.unwrap();

    let first = ledger().start_session(dec!(2000));
    store.set(SESSION_KEY, &first).await.unwrap();

    let second = session_with_position();
    store.set(SESSION_KEY, &second).await.unwrap();

    let loaded = store.get(SESSION_KEY).await.unwrap().unwrap();
    assert_eq!(loaded, second);
    assert_ne!(loaded.id, first.id);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_get_missing_key_is_none() {
    let dir = scratch_dir();
    let store = FileSessionStore::new(dir.to_str().unwrap()).await.unwrap();

    assert!(store.get(SESSION_KEY).await.unwrap().is_none());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_delete_removes_session_and_tolerates_absence() {
    let dir = scratch_dir();
    let store = FileSessionStore::new(dir.to_str().unwrap()).await.unwrap();

    let session = ledger().start_session(dec!(2000));
    store.set(SESSION_KEY, &session).await.unwrap();
    store.delete(SESSION_KEY).await.unwrap();
    assert!(store.get(SESSION_KEY).await.unwrap().is_none());

    // Deleting an absent key is not an error.
    store.delete(SESSION_KEY).await.unwrap();

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_store_is_healthy_on_writable_directory() {
    let dir = scratch_dir();
    let store = FileSessionStore::new(dir.to_str().unwrap()).await.unwrap();

    assert!(store.is_healthy().await);

    std::fs::remove_dir_all(&dir).ok();
}

// ---- Trade Journal ----

#[tokio::test]
async fn test_journal_loads_records_oldest_first() {
    let dir = scratch_dir();
    let journal = FileTradeJournal::new(dir.to_str().unwrap()).await.unwrap();

    let session_id = Uuid::new_v4();
    // Appended newest-first; load_all must sort by execution time.
    journal.append(&record(session_id, 1, "AAA")).await.unwrap();
    journal.append(&record(session_id, 30, "BBB")).await.unwrap();
    journal.append(&record(session_id, 10, "CCC")).await.unwrap();

    let records = journal.load_all().await.unwrap();
    assert_eq!(records.len(), 3);
    let symbols: Vec<&str> = records.iter().map(|r| r.trade.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["BBB", "CCC", "AAA"]);
    assert!(records.iter().all(|r| r.session_id == session_id));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_journal_round_trip_preserves_record() {
    let dir = scratch_dir();
    let journal = FileTradeJournal::new(dir.to_str().unwrap()).await.unwrap();

    let original = record(Uuid::new_v4(), 5, "AAA");
    journal.append(&original).await.unwrap();

    let records = journal.load_all().await.unwrap();
    assert_eq!(records, vec![original]);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_journal_skips_malformed_lines() {
    let dir = scratch_dir();
    let journal = FileTradeJournal::new(dir.to_str().unwrap()).await.unwrap();

    let session_id = Uuid::new_v4();
    journal.append(&record(session_id, 20, "AAA")).await.unwrap();
    journal.append(&record(session_id, 10, "BBB")).await.unwrap();

    // Corrupt today's file with a non-JSON line and a blank line.
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let path = dir.join("journal").join(format!("{today}.jsonl"));
    let mut contents = std::fs::read_to_string(&path).unwrap();
    contents.push_str("not json at all\n\n");
    std::fs::write(&path, contents).unwrap();

    let records = journal.load_all().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].trade.symbol, "AAA");
    assert_eq!(records[1].trade.symbol, "BBB");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_journal_empty_directory_loads_nothing() {
    let dir = scratch_dir();
    let journal = FileTradeJournal::new(dir.to_str().unwrap()).await.unwrap();

    assert!(journal.load_all().await.unwrap().is_empty());

    std::fs::remove_dir_all(&dir).ok();
}
