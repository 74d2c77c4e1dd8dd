//! Integration Tests - Trade and Session Flows over Mock Ports
//!
//! Tests the orchestrator, lifecycle, and analyzer use cases against
//! mockall adapters. Uses mockall for trait mocking and tokio::test for
//! async tests. The central properties: every failure path performs zero
//! store writes, and every successful trade performs exactly one.

use mockall::mock;
use mockall::predicate::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use eth_paper_trader::domain::{
    HoldingReport, Ledger, MarketSnapshot, Session, SimulationError, TradeAction, TradeDecision,
    DEFAULT_REFERENCE_ADDRESS,
};
use eth_paper_trader::usecases::{SessionLifecycle, TokenAnalyzer, TradeOrchestrator};

// ---- Mock Definitions ----

mock! {
    pub Gateway {}

    #[async_trait::async_trait]
    impl eth_paper_trader::ports::market_data::MarketDataGateway for Gateway {
        async fn pair_snapshot(
            &self,
            address: &eth_paper_trader::domain::TokenAddress,
        ) -> anyhow::Result<eth_paper_trader::domain::MarketSnapshot>;

        async fn reference_price(&self) -> anyhow::Result<Decimal>;

        async fn token_overview(
            &self,
            query: &str,
        ) -> anyhow::Result<eth_paper_trader::domain::MarketSnapshot>;

        async fn is_healthy(&self) -> bool;
    }
}

mock! {
    pub Oracle {}

    #[async_trait::async_trait]
    impl eth_paper_trader::ports::oracle::DecisionOracle for Oracle {
        async fn trade_decision(
            &self,
            snapshot: &eth_paper_trader::domain::MarketSnapshot,
            portfolio: &eth_paper_trader::domain::Portfolio,
        ) -> anyhow::Result<String>;

        async fn token_analysis(
            &self,
            snapshot: &eth_paper_trader::domain::MarketSnapshot,
        ) -> anyhow::Result<String>;
    }
}

mock! {
    pub Store {}

    #[async_trait::async_trait]
    impl eth_paper_trader::ports::session_store::SessionStore for Store {
        async fn get(&self, key: &str) -> anyhow::Result<Option<Session>>;

        async fn set(
            &self,
            key: &str,
            session: &eth_paper_trader::domain::Session,
        ) -> anyhow::Result<()>;

        async fn delete(&self, key: &str) -> anyhow::Result<()>;

        async fn is_healthy(&self) -> bool;
    }
}

mock! {
    pub Journal {}

    #[async_trait::async_trait]
    impl eth_paper_trader::ports::journal::TradeJournal for Journal {
        async fn append(
            &self,
            record: &eth_paper_trader::ports::journal::JournalRecord,
        ) -> anyhow::Result<()>;

        async fn load_all(
            &self,
        ) -> anyhow::Result<Vec<eth_paper_trader::ports::journal::JournalRecord>>;
    }
}

// ---- Fixtures ----

const TOKEN: &str = "0x1111111111111111111111111111111111111111";
const SESSION_KEY: &str = "simulationState";

fn ledger() -> Ledger {
    Ledger::new(DEFAULT_REFERENCE_ADDRESS, "WETH", dec!(10))
}

fn token_snapshot(price_usd: Decimal, price_native: Decimal) -> MarketSnapshot {
    MarketSnapshot {
        address: TOKEN.to_string(),
        symbol: "AAA".to_string(),
        price_usd,
        price_native,
        liquidity_usd: 250_000.0,
        volume_h24: Some(40_000.0),
        price_change_h24: None,
        buys_h24: None,
        sells_h24: None,
        fdv: None,
        market_cap: None,
    }
}

/// Fresh session: 10 WETH seeded at a $2000 reference price.
fn seeded_session() -> Session {
    ledger().start_session(dec!(2000))
}

/// Seeded session plus 5 AAA bought at $100 (0.05 WETH per unit),
/// leaving 9.75 WETH.
fn session_with_position() -> Session {
    let ledger = ledger();
    let mut session = ledger.start_session(dec!(2000));
    let decision = TradeDecision {
        address: TOKEN.to_string(),
        symbol: "AAA".to_string(),
        price_usd: dec!(100),
        action: TradeAction::Buy,
        amount: dec!(5),
        rationale: String::new(),
    };
    ledger
        .apply_decision(&mut session, &decision, &token_snapshot(dec!(100), dec!(0.05)))
        .unwrap();
    session
}

fn oracle_reply(action: &str, amount: &str, price_usd: &str) -> String {
    format!(
        r#"Here is my decision:
{{"address": "{TOKEN}", "symbol": "AAA", "priceUsd": {price_usd}, "action": "{action}", "amount": {amount}, "reasoning": "test fixture"}}"#
    )
}

fn orchestrator(
    gateway: MockGateway,
    oracle: MockOracle,
    store: MockStore,
    journal: MockJournal,
) -> TradeOrchestrator<MockGateway, MockOracle, MockStore, MockJournal> {
    TradeOrchestrator::new(
        gateway,
        oracle,
        store,
        journal,
        ledger(),
        SESSION_KEY.to_string(),
    )
}

fn lifecycle(gateway: MockGateway, store: MockStore) -> SessionLifecycle<MockGateway, MockStore> {
    SessionLifecycle::new(gateway, store, ledger(), SESSION_KEY.to_string())
}

// ---- Trade Orchestrator Tests ----

#[tokio::test]
async fn test_buy_applies_decision_and_persists_exactly_once() {
    let mut gateway = MockGateway::new();
    let mut oracle = MockOracle::new();
    let mut store = MockStore::new();
    let mut journal = MockJournal::new();

    let session = seeded_session();
    let session_id = session.id;
    store
        .expect_get()
        .with(eq(SESSION_KEY))
        .times(2)
        .returning(move |_| Ok(Some(session.clone())));
    gateway
        .expect_pair_snapshot()
        .withf(|addr| addr.as_str() == TOKEN)
        .times(1)
        .returning(|_| Ok(token_snapshot(dec!(100), dec!(0.05))));
    oracle
        .expect_trade_decision()
        .withf(|snapshot, portfolio| {
            snapshot.symbol == "AAA" && portfolio.contains_key(DEFAULT_REFERENCE_ADDRESS)
        })
        .times(1)
        .returning(|_, _| Ok(oracle_reply("BUY", "5", "100")));
    store
        .expect_set()
        .withf(|key, session| {
            key == SESSION_KEY
                && session.portfolio[TOKEN].amount == dec!(5)
                && session.portfolio[TOKEN].average_cost == dec!(100)
                && session.portfolio[DEFAULT_REFERENCE_ADDRESS].amount == dec!(9.75)
                && session.history.len() == 1
        })
        .times(1)
        .returning(|_, _| Ok(()));
    journal
        .expect_append()
        .withf(move |record| record.session_id == session_id && record.trade.symbol == "AAA")
        .times(1)
        .returning(|_| Ok(()));

    let orchestrator = orchestrator(gateway, oracle, store, journal);
    let outcome = orchestrator.execute_trade(TOKEN).await.unwrap();

    assert_eq!(outcome.record.action, TradeAction::Buy);
    assert_eq!(outcome.record.amount, dec!(5));
    assert_eq!(outcome.portfolio[TOKEN].average_cost, dec!(100));
    assert_eq!(
        outcome.portfolio[DEFAULT_REFERENCE_ADDRESS].amount,
        dec!(9.75)
    );
}

#[tokio::test]
async fn test_partial_sell_credits_reference_asset() {
    let mut gateway = MockGateway::new();
    let mut oracle = MockOracle::new();
    let mut store = MockStore::new();
    let mut journal = MockJournal::new();

    let session = session_with_position();
    store
        .expect_get()
        .times(2)
        .returning(move |_| Ok(Some(session.clone())));
    gateway
        .expect_pair_snapshot()
        .times(1)
        .returning(|_| Ok(token_snapshot(dec!(120), dec!(0.06))));
    oracle
        .expect_trade_decision()
        .times(1)
        .returning(|_, _| Ok(oracle_reply("SELL", "2", "120")));
    store
        .expect_set()
        .withf(|_, session| {
            // 9.75 + 2 × 0.06 credited back
            session.portfolio[DEFAULT_REFERENCE_ADDRESS].amount == dec!(9.87)
                && session.portfolio[TOKEN].amount == dec!(3)
        })
        .times(1)
        .returning(|_, _| Ok(()));
    journal.expect_append().times(1).returning(|_| Ok(()));

    let orchestrator = orchestrator(gateway, oracle, store, journal);
    let outcome = orchestrator.execute_trade(TOKEN).await.unwrap();

    assert_eq!(outcome.record.action, TradeAction::Sell);
    assert_eq!(outcome.portfolio[TOKEN].amount, dec!(3));
}

#[tokio::test]
async fn test_hold_touches_history_but_not_positions() {
    let mut gateway = MockGateway::new();
    let mut oracle = MockOracle::new();
    let mut store = MockStore::new();
    let mut journal = MockJournal::new();

    let session = seeded_session();
    store
        .expect_get()
        .times(2)
        .returning(move |_| Ok(Some(session.clone())));
    gateway
        .expect_pair_snapshot()
        .times(1)
        .returning(|_| Ok(token_snapshot(dec!(100), dec!(0.05))));
    oracle
        .expect_trade_decision()
        .times(1)
        .returning(|_, _| Ok(oracle_reply("HOLD", "0", "100")));
    store
        .expect_set()
        .withf(|_, session| {
            session.portfolio.len() == 1
                && session.portfolio[DEFAULT_REFERENCE_ADDRESS].amount == dec!(10)
                && session.history.len() == 1
        })
        .times(1)
        .returning(|_, _| Ok(()));
    journal.expect_append().times(1).returning(|_| Ok(()));

    let orchestrator = orchestrator(gateway, oracle, store, journal);
    let outcome = orchestrator.execute_trade(TOKEN).await.unwrap();

    assert_eq!(outcome.record.action, TradeAction::Hold);
    assert!(!outcome.portfolio.contains_key(TOKEN));
}

#[tokio::test]
async fn test_gateway_failure_writes_nothing() {
    let mut gateway = MockGateway::new();
    let oracle = MockOracle::new();
    let mut store = MockStore::new();
    let journal = MockJournal::new();

    let session = seeded_session();
    store
        .expect_get()
        .times(1)
        .returning(move |_| Ok(Some(session.clone())));
    gateway
        .expect_pair_snapshot()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("gateway returned HTTP 503")));
    store.expect_set().times(0);

    let orchestrator = orchestrator(gateway, oracle, store, journal);
    let err = orchestrator.execute_trade(TOKEN).await.unwrap_err();

    assert!(matches!(err, SimulationError::MarketDataUnavailable { .. }));
}

#[tokio::test]
async fn test_unparseable_oracle_reply_writes_nothing() {
    let mut gateway = MockGateway::new();
    let mut oracle = MockOracle::new();
    let mut store = MockStore::new();
    let journal = MockJournal::new();

    let session = seeded_session();
    store
        .expect_get()
        .times(1)
        .returning(move |_| Ok(Some(session.clone())));
    gateway
        .expect_pair_snapshot()
        .times(1)
        .returning(|_| Ok(token_snapshot(dec!(100), dec!(0.05))));
    oracle
        .expect_trade_decision()
        .times(1)
        .returning(|_, _| Ok("I would probably buy a little.".to_string()));
    store.expect_set().times(0);

    let orchestrator = orchestrator(gateway, oracle, store, journal);
    let err = orchestrator.execute_trade(TOKEN).await.unwrap_err();

    assert!(matches!(err, SimulationError::InvalidDecision { .. }));
}

#[tokio::test]
async fn test_insufficient_funds_leaves_state_untouched() {
    let mut gateway = MockGateway::new();
    let mut oracle = MockOracle::new();
    let mut store = MockStore::new();
    let journal = MockJournal::new();

    let session = seeded_session();
    store
        .expect_get()
        .times(2)
        .returning(move |_| Ok(Some(session.clone())));
    gateway
        .expect_pair_snapshot()
        .times(1)
        .returning(|_| Ok(token_snapshot(dec!(100), dec!(0.05))));
    // 1000 units at 0.05 WETH each costs 50 WETH; only 10 are held.
    oracle
        .expect_trade_decision()
        .times(1)
        .returning(|_, _| Ok(oracle_reply("BUY", "1000", "100")));
    store.expect_set().times(0);

    let orchestrator = orchestrator(gateway, oracle, store, journal);
    let err = orchestrator.execute_trade(TOKEN).await.unwrap_err();

    match err {
        SimulationError::InsufficientFunds { needed, available } => {
            assert_eq!(needed, dec!(50));
            assert_eq!(available, dec!(10));
        }
        other => panic!("expected InsufficientFunds, got {other:?}"),
    }
}

#[tokio::test]
async fn test_overselling_is_rejected() {
    let mut gateway = MockGateway::new();
    let mut oracle = MockOracle::new();
    let mut store = MockStore::new();
    let journal = MockJournal::new();

    let session = session_with_position();
    store
        .expect_get()
        .times(2)
        .returning(move |_| Ok(Some(session.clone())));
    gateway
        .expect_pair_snapshot()
        .times(1)
        .returning(|_| Ok(token_snapshot(dec!(120), dec!(0.06))));
    oracle
        .expect_trade_decision()
        .times(1)
        .returning(|_, _| Ok(oracle_reply("SELL", "9", "120")));
    store.expect_set().times(0);

    let orchestrator = orchestrator(gateway, oracle, store, journal);
    let err = orchestrator.execute_trade(TOKEN).await.unwrap_err();

    assert!(matches!(
        err,
        SimulationError::InsufficientHoldings { held, .. } if held == dec!(5)
    ));
}

#[tokio::test]
async fn test_invalid_identifier_makes_no_port_calls() {
    // Mocks carry no expectations: any call at all fails the test.
    let orchestrator = orchestrator(
        MockGateway::new(),
        MockOracle::new(),
        MockStore::new(),
        MockJournal::new(),
    );

    let err = orchestrator.execute_trade("definitely-not-a-token").await.unwrap_err();
    assert!(matches!(err, SimulationError::InvalidIdentifier(_)));
}

#[tokio::test]
async fn test_reference_asset_is_not_tradable() {
    let orchestrator = orchestrator(
        MockGateway::new(),
        MockOracle::new(),
        MockStore::new(),
        MockJournal::new(),
    );

    let err = orchestrator
        .execute_trade(DEFAULT_REFERENCE_ADDRESS)
        .await
        .unwrap_err();
    assert!(matches!(err, SimulationError::InvalidIdentifier(_)));
}

#[tokio::test]
async fn test_trade_without_session_skips_gateway_and_oracle() {
    let gateway = MockGateway::new();
    let oracle = MockOracle::new();
    let mut store = MockStore::new();
    let journal = MockJournal::new();

    store.expect_get().times(1).returning(|_| Ok(None));

    let orchestrator = orchestrator(gateway, oracle, store, journal);
    let err = orchestrator.execute_trade(TOKEN).await.unwrap_err();

    assert!(matches!(err, SimulationError::NoActiveSession));
    assert!(err.is_status());
}

#[tokio::test]
async fn test_journal_failure_does_not_fail_the_trade() {
    let mut gateway = MockGateway::new();
    let mut oracle = MockOracle::new();
    let mut store = MockStore::new();
    let mut journal = MockJournal::new();

    let session = seeded_session();
    store
        .expect_get()
        .times(2)
        .returning(move |_| Ok(Some(session.clone())));
    gateway
        .expect_pair_snapshot()
        .times(1)
        .returning(|_| Ok(token_snapshot(dec!(100), dec!(0.05))));
    oracle
        .expect_trade_decision()
        .times(1)
        .returning(|_, _| Ok(oracle_reply("BUY", "5", "100")));
    store.expect_set().times(1).returning(|_, _| Ok(()));
    journal
        .expect_append()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("disk full")));

    let orchestrator = orchestrator(gateway, oracle, store, journal);
    let outcome = orchestrator.execute_trade(TOKEN).await.unwrap();

    assert_eq!(outcome.record.action, TradeAction::Buy);
}

// ---- Session Lifecycle Tests ----

#[tokio::test]
async fn test_start_seeds_reference_holding_at_live_price() {
    let mut gateway = MockGateway::new();
    let mut store = MockStore::new();

    store.expect_get().times(1).returning(|_| Ok(None));
    gateway
        .expect_reference_price()
        .times(1)
        .returning(|| Ok(dec!(2000)));
    store
        .expect_set()
        .withf(|key, session| {
            key == SESSION_KEY
                && session.active
                && session.portfolio[DEFAULT_REFERENCE_ADDRESS].amount == dec!(10)
                && session.portfolio[DEFAULT_REFERENCE_ADDRESS].average_cost == dec!(2000)
                && session.history.is_empty()
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let lifecycle = lifecycle(gateway, store);
    let session = lifecycle.start().await.unwrap();

    assert_eq!(session.holding_count(), 1);
}

#[tokio::test]
async fn test_start_twice_reports_already_active() {
    let gateway = MockGateway::new();
    let mut store = MockStore::new();

    let session = seeded_session();
    store
        .expect_get()
        .times(1)
        .returning(move |_| Ok(Some(session.clone())));
    store.expect_set().times(0);

    let lifecycle = lifecycle(gateway, store);
    let err = lifecycle.start().await.unwrap_err();

    assert!(matches!(err, SimulationError::AlreadyActive));
    assert!(err.is_status());
}

#[tokio::test]
async fn test_end_without_session_is_a_status() {
    let gateway = MockGateway::new();
    let mut store = MockStore::new();

    store.expect_get().times(1).returning(|_| Ok(None));
    store.expect_delete().times(0);

    let lifecycle = lifecycle(gateway, store);
    let err = lifecycle.end().await.unwrap_err();

    assert!(matches!(err, SimulationError::NoActiveSession));
}

#[tokio::test]
async fn test_end_prices_holdings_and_clears_store() {
    let mut gateway = MockGateway::new();
    let mut store = MockStore::new();

    let session = session_with_position();
    store
        .expect_get()
        .times(1)
        .returning(move |_| Ok(Some(session.clone())));
    gateway
        .expect_reference_price()
        .times(1)
        .returning(|| Ok(dec!(2100)));
    gateway
        .expect_pair_snapshot()
        .withf(|addr| addr.as_str() == TOKEN)
        .times(1)
        .returning(|_| Ok(token_snapshot(dec!(120), dec!(0.06))));
    store
        .expect_delete()
        .with(eq(SESSION_KEY))
        .times(1)
        .returning(|_| Ok(()));

    let lifecycle = lifecycle(gateway, store);
    let report = lifecycle.end().await.unwrap();

    // AAA: (120 - 100) × 5 = 100; WETH: (2100 - 2000) × 9.75 = 975
    assert_eq!(report.reference_price_usd, dec!(2100));
    assert_eq!(report.total_pnl_usd, dec!(1075));
    assert_eq!(
        report.total_pnl_in_reference_asset.round_dp(6),
        dec!(0.511905)
    );
    assert_eq!(report.holdings.len(), 2);
}

#[tokio::test]
async fn test_end_carries_error_entries_for_failed_lookups() {
    let mut gateway = MockGateway::new();
    let mut store = MockStore::new();

    let session = session_with_position();
    store
        .expect_get()
        .times(1)
        .returning(move |_| Ok(Some(session.clone())));
    gateway
        .expect_reference_price()
        .times(1)
        .returning(|| Ok(dec!(2100)));
    gateway
        .expect_pair_snapshot()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("no pairs found")));
    store.expect_delete().times(1).returning(|_| Ok(()));

    let lifecycle = lifecycle(gateway, store);
    let report = lifecycle.end().await.unwrap();

    // Only the WETH leg contributes to the total.
    assert_eq!(report.total_pnl_usd, dec!(975));
    let unpriced = report
        .holdings
        .iter()
        .find(|h| matches!(h, HoldingReport::Unpriced { .. }))
        .expect("failed lookup must appear as an error entry");
    match unpriced {
        HoldingReport::Unpriced { symbol, error, .. } => {
            assert_eq!(symbol, "AAA");
            assert!(error.contains("price lookup failed"));
        }
        HoldingReport::Priced { .. } => unreachable!(),
    }
}

#[tokio::test]
async fn test_end_aborts_with_session_intact_when_reference_price_fails() {
    let mut gateway = MockGateway::new();
    let mut store = MockStore::new();

    let session = session_with_position();
    store
        .expect_get()
        .times(1)
        .returning(move |_| Ok(Some(session.clone())));
    gateway
        .expect_reference_price()
        .times(1)
        .returning(|| Err(anyhow::anyhow!("reference pool lookup failed")));
    store.expect_delete().times(0);

    let lifecycle = lifecycle(gateway, store);
    let err = lifecycle.end().await.unwrap_err();

    assert!(matches!(err, SimulationError::MarketDataUnavailable { .. }));
}

// ---- Token Analyzer Tests ----

#[tokio::test]
async fn test_analyze_resolves_pair_and_validates_reply() {
    let mut gateway = MockGateway::new();
    let mut oracle = MockOracle::new();

    gateway
        .expect_token_overview()
        .with(eq("pepe"))
        .times(1)
        .returning(|_| Ok(token_snapshot(dec!(0.0000012), dec!(0.0000000006))));
    oracle.expect_token_analysis().times(1).returning(|_| {
        Ok(r#"{"overview": "meme token with deep liquidity", "recommendation": "HOLD",
            "confidence": 55, "reasoning": "pure sentiment play", "risks": ["no utility"],
            "opportunities": ["viral cycles"]}"#
            .to_string())
    });

    let analyzer = TokenAnalyzer::new(gateway, oracle);
    let report = analyzer.analyze("pepe").await.unwrap();

    assert_eq!(report.snapshot.symbol, "AAA");
    assert_eq!(report.analysis.recommendation, TradeAction::Hold);
    assert_eq!(report.analysis.risks, vec!["no utility"]);
}

#[tokio::test]
async fn test_analyze_rejects_blank_query_before_any_call() {
    let analyzer = TokenAnalyzer::new(MockGateway::new(), MockOracle::new());

    let err = analyzer.analyze("   ").await.unwrap_err();
    assert!(matches!(err, SimulationError::InvalidIdentifier(_)));
}
