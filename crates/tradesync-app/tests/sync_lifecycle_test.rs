//! End-to-end lifecycle tests against the replay venue.
//!
//! Workers run on real time with millisecond intervals; each assertion
//! polls the repository until the expected state appears.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tradesync_app::config::{AppConfig, REFERENCE_SYMBOL};
use tradesync_app::{AppError, Application};
use tradesync_core::{
    Fill, IncomeKind, Order, Side, SymbolInfo, SymbolStatus, TickerPrice, WalletBalance,
};
use tradesync_store::{MemoryRepository, Repository};
use tradesync_venue::{ReplayFixture, ReplayVenue};

const WAIT: Duration = Duration::from_secs(5);

async fn wait_for<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let reached = tokio::time::timeout(WAIT, async {
        loop {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "timed out waiting for {what}");
}

fn fill(order_id: u64, time_ms: i64, is_buyer: bool, price: f64) -> Fill {
    Fill {
        symbol: "BTCUSDT".to_string(),
        order_id,
        quantity: 1.0,
        price,
        is_buyer,
        time_ms,
    }
}

fn fixture() -> ReplayFixture {
    ReplayFixture {
        symbols: vec![
            SymbolInfo::new("BTCUSDT", SymbolStatus::Trading, "BTC", "USDT"),
            SymbolInfo::new("ETHUSDT", SymbolStatus::Trading, "ETH", "USDT"),
        ],
        fills: vec![
            fill(1, 1_000, true, 100.0),
            fill(2, 2_000, true, 200.0),
            fill(3, 3_000, false, 250.0),
        ],
        balances: vec![
            WalletBalance {
                asset: "USDT".to_string(),
                free: 1000.0,
                locked: 0.0,
            },
            WalletBalance {
                asset: "BTC".to_string(),
                free: 1.0,
                locked: 0.0,
            },
        ],
        prices: vec![
            TickerPrice {
                symbol: "BTCUSDT".to_string(),
                price: 300.0,
            },
            TickerPrice {
                symbol: "ETHUSDT".to_string(),
                price: 20.0,
            },
        ],
        open_orders: vec![Order {
            symbol: "BTCUSDT".to_string(),
            price: 400.0,
            quantity: 1.0,
            side: Side::Sell,
            order_type: "LIMIT".to_string(),
        }],
    }
}

fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.symbols = vec!["ETHUSDT".to_string()];
    config.ensure_reference_symbol();
    config.store.journal = false;
    config.discovery.interval_ms = 10;
    config.trade_sync.interval_ms = 10;
    config.trade_sync.page_size = 2;
    config.account.interval_ms = 10;
    config.orders.interval_ms = 10;
    config.prices.publish_interval_ms = 10;
    config
}

async fn trade_count(repo: &dyn Repository) -> usize {
    repo.trades("BTCUSDT").await.map_or(0, |t| t.len())
}

#[tokio::test]
async fn test_full_sync_lifecycle() {
    let venue = Arc::new(ReplayVenue::new(fixture()));
    let repo = Arc::new(MemoryRepository::new());
    let app = Application::with_parts(fast_config(), venue.clone(), repo.clone());

    let running = app.start().await.unwrap();
    assert_eq!(running.catalog().len(), 2);
    assert!(running.price_feed().is_subscribed(REFERENCE_SYMBOL));
    assert!(running.price_feed().is_subscribed("ETHUSDT"));

    // Discovery marks BTCUSDT, trade sync pages the whole history in.
    wait_for("full history", || {
        let repo = repo.clone();
        async move { trade_count(repo.as_ref()).await == 3 }
    })
    .await;
    wait_for("realized income", || {
        let repo = repo.clone();
        async move { repo.incomes("BTCUSDT").await.map_or(0, |i| i.len()) == 1 }
    })
    .await;

    let incomes = repo.incomes("BTCUSDT").await.unwrap();
    assert_eq!(incomes[0].kind, IncomeKind::RealizedPnl);
    assert_eq!(incomes[0].transaction_id, 3);
    assert!((incomes[0].amount - 100.0).abs() < 1e-9);

    wait_for("discovery pass", || {
        let repo = repo.clone();
        async move { repo.is_symbol_checked("ETHUSDT").await.unwrap_or(false) }
    })
    .await;
    assert!(!repo.is_symbol_traded("ETHUSDT").await.unwrap());

    // Stored BTC history plus a stored open order yields a position.
    wait_for("position", || {
        let repo = repo.clone();
        async move { repo.positions().await.map_or(false, |p| p.len() == 1) }
    })
    .await;
    let balance = repo.balance().await.unwrap();
    let market_value = balance.total_balance + balance.total_unrealized_profit;
    assert!((market_value - 1300.0).abs() < 1e-6);

    // New activity on the venue is picked up by the forward scan.
    venue.push_fill(fill(4, 4_000, false, 350.0));
    wait_for("new fill", || {
        let repo = repo.clone();
        async move { trade_count(repo.as_ref()).await == 4 }
    })
    .await;
    wait_for("recomputed incomes", || {
        let repo = repo.clone();
        async move { repo.incomes("BTCUSDT").await.map_or(0, |i| i.len()) == 2 }
    })
    .await;

    // Live prices reach the repository.
    venue.set_price("BTCUSDT", 310.0);
    wait_for("tick", || {
        let repo = repo.clone();
        async move {
            repo.current_price("BTCUSDT")
                .await
                .ok()
                .flatten()
                .map_or(false, |t| t.price == 310.0)
        }
    })
    .await;

    running.shutdown().await;
}

#[tokio::test]
async fn test_open_orders_follow_venue() {
    let venue = Arc::new(ReplayVenue::new(fixture()));
    let repo = Arc::new(MemoryRepository::new());
    let app = Application::with_parts(fast_config(), venue.clone(), repo.clone());
    let running = app.start().await.unwrap();

    wait_for("open orders", || {
        let repo = repo.clone();
        async move { repo.open_orders("BTCUSDT").await.map_or(0, |o| o.len()) == 1 }
    })
    .await;

    venue.set_open_orders(Vec::new());
    wait_for("cleared open orders", || {
        let repo = repo.clone();
        async move { repo.open_orders("BTCUSDT").await.map_or(false, |o| o.is_empty()) }
    })
    .await;

    running.shutdown().await;
}

#[tokio::test]
async fn test_journal_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let fixture_path = dir.path().join("fixture.json");
    std::fs::write(&fixture_path, serde_json::to_string(&fixture()).unwrap()).unwrap();

    let mut config = fast_config();
    config.venue.fixture_path = fixture_path.to_string_lossy().into_owned();
    config.store.journal = true;
    config.store.data_dir = dir.path().join("data").to_string_lossy().into_owned();

    let app = Application::new(config.clone()).unwrap();
    let repo = app.repository();
    let token = app.shutdown_token();
    let run = tokio::spawn(app.run());

    wait_for("journaled history", || {
        let repo = repo.clone();
        async move { trade_count(repo.as_ref()).await == 3 }
    })
    .await;

    token.cancel();
    tokio_test::assert_ok!(run.await.unwrap());
    drop(repo);

    let restored = MemoryRepository::open(&config.store.data_dir).unwrap();
    assert_eq!(restored.trades("BTCUSDT").await.unwrap().len(), 3);
    assert!(restored.is_symbol_traded("BTCUSDT").await.unwrap());
    assert!(restored.is_symbol_checked("BTCUSDT").await.unwrap());
}

#[tokio::test]
async fn test_missing_fixture_is_fatal() {
    let mut config = fast_config();
    config.venue.fixture_path = "/nonexistent/fixture.json".to_string();

    assert!(matches!(Application::new(config), Err(AppError::Venue(_))));
}
