//! In-memory repository with optional journaling.
//!
//! State lives behind a single `RwLock`. When opened on a data directory,
//! primary records are appended to the [`Journal`] before memory is
//! updated, and the journal is replayed on open so trades, incomes,
//! discovery marks and backfill flags survive a restart.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};
use tradesync_core::{Balance, Income, Order, Position, Tick, Trade};

use crate::error::StoreResult;
use crate::journal::{Journal, JournalRecord};
use crate::repository::{Repository, SyncState};

#[derive(Debug, Default)]
struct State {
    /// symbol -> order id -> trade.
    trades: HashMap<String, BTreeMap<u64, Trade>>,
    incomes: HashMap<String, Vec<Income>>,
    checked: HashSet<String>,
    traded: BTreeSet<String>,
    sync: HashMap<String, SyncState>,
    /// symbol -> sequence of its latest download mark; orders equal times.
    download_seq: HashMap<String, u64>,
    next_download_seq: u64,
    balance: Balance,
    positions: Vec<Position>,
    open_orders: Vec<Order>,
    ticks: HashMap<String, Tick>,
}

impl State {
    fn apply(&mut self, record: JournalRecord) {
        match record {
            JournalRecord::Trade(trade) => {
                self.trades
                    .entry(trade.symbol.clone())
                    .or_default()
                    .insert(trade.order_id, trade);
            }
            JournalRecord::Incomes { symbol, incomes } => {
                self.incomes.insert(symbol, incomes);
            }
            JournalRecord::SymbolChecked { symbol } => {
                self.checked.insert(symbol);
            }
            JournalRecord::SymbolTraded { symbol } => {
                self.traded.insert(symbol);
            }
            JournalRecord::BackfillComplete { symbol } => {
                self.sync.entry(symbol).or_default().backfill_complete = true;
            }
        }
    }

    fn sorted_trades<'a>(iter: impl Iterator<Item = &'a Trade>) -> Vec<Trade> {
        let mut trades: Vec<Trade> = iter.cloned().collect();
        trades.sort_by_key(|t| (t.timestamp_ms, t.order_id));
        trades
    }
}

/// Repository held in process memory.
pub struct MemoryRepository {
    state: RwLock<State>,
    journal: Option<Mutex<Journal>>,
}

impl MemoryRepository {
    /// Create an empty repository with no journal.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            journal: None,
        }
    }

    /// Open a journaled repository in `data_dir`, replaying prior records.
    pub fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        let mut state = State::default();
        for record in Journal::replay(data_dir)? {
            state.apply(record);
        }

        info!(
            data_dir = %data_dir.display(),
            symbols = state.trades.len(),
            trades = state.trades.values().map(BTreeMap::len).sum::<usize>(),
            traded = state.traded.len(),
            checked = state.checked.len(),
            "Repository restored"
        );

        Ok(Self {
            state: RwLock::new(state),
            journal: Some(Mutex::new(Journal::open(data_dir)?)),
        })
    }

    pub fn is_journaled(&self) -> bool {
        self.journal.is_some()
    }

    /// Total trades held across all symbols.
    pub fn trade_count(&self) -> usize {
        self.state.read().trades.values().map(BTreeMap::len).sum()
    }

    fn journal(&self, records: &[JournalRecord]) -> StoreResult<()> {
        match &self.journal {
            Some(journal) => journal.lock().append(records),
            None => Ok(()),
        }
    }

    /// Journal a record, then apply it to memory.
    fn commit(&self, record: JournalRecord) -> StoreResult<()> {
        self.journal(std::slice::from_ref(&record))?;
        self.state.write().apply(record);
        Ok(())
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn upsert_trades(&self, trades: &[Trade]) -> StoreResult<usize> {
        // Only trades that are new or changed hit the journal.
        let (changed, inserted) = {
            let state = self.state.read();
            let mut changed = Vec::new();
            let mut inserted = 0usize;
            for trade in trades {
                match state
                    .trades
                    .get(&trade.symbol)
                    .and_then(|by_id| by_id.get(&trade.order_id))
                {
                    Some(existing) if existing == trade => {}
                    Some(_) => changed.push(JournalRecord::Trade(trade.clone())),
                    None => {
                        inserted += 1;
                        changed.push(JournalRecord::Trade(trade.clone()));
                    }
                }
            }
            (changed, inserted)
        };

        if changed.is_empty() {
            return Ok(0);
        }

        self.journal(&changed)?;
        let mut state = self.state.write();
        for record in changed {
            state.apply(record);
        }

        debug!(received = trades.len(), inserted, "Upserted trades");
        Ok(inserted)
    }

    async fn oldest_trade(&self, symbol: &str) -> StoreResult<Option<Trade>> {
        Ok(self.state.read().trades.get(symbol).and_then(|by_id| {
            by_id
                .values()
                .min_by_key(|t| (t.timestamp_ms, t.order_id))
                .cloned()
        }))
    }

    async fn newest_trade(&self, symbol: &str) -> StoreResult<Option<Trade>> {
        Ok(self
            .state
            .read()
            .trades
            .get(symbol)
            .and_then(|by_id| by_id.values().next_back().cloned()))
    }

    async fn trades(&self, symbol: &str) -> StoreResult<Vec<Trade>> {
        let state = self.state.read();
        Ok(state
            .trades
            .get(symbol)
            .map(|by_id| State::sorted_trades(by_id.values()))
            .unwrap_or_default())
    }

    async fn trades_by_asset(&self, asset: &str) -> StoreResult<Vec<Trade>> {
        let state = self.state.read();
        Ok(State::sorted_trades(
            state
                .trades
                .values()
                .flat_map(|by_id| by_id.values())
                .filter(|t| t.asset == asset),
        ))
    }

    async fn replace_incomes(&self, symbol: &str, incomes: &[Income]) -> StoreResult<()> {
        self.commit(JournalRecord::Incomes {
            symbol: symbol.to_string(),
            incomes: incomes.to_vec(),
        })
    }

    async fn incomes(&self, symbol: &str) -> StoreResult<Vec<Income>> {
        Ok(self
            .state
            .read()
            .incomes
            .get(symbol)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_balance(&self, balance: Balance) -> StoreResult<()> {
        self.state.write().balance = balance;
        Ok(())
    }

    async fn balance(&self) -> StoreResult<Balance> {
        Ok(self.state.read().balance.clone())
    }

    async fn replace_positions(&self, positions: Vec<Position>) -> StoreResult<()> {
        self.state.write().positions = positions;
        Ok(())
    }

    async fn positions(&self) -> StoreResult<Vec<Position>> {
        Ok(self.state.read().positions.clone())
    }

    async fn replace_open_orders(&self, orders: Vec<Order>) -> StoreResult<()> {
        self.state.write().open_orders = orders;
        Ok(())
    }

    async fn open_orders(&self, symbol: &str) -> StoreResult<Vec<Order>> {
        Ok(self
            .state
            .read()
            .open_orders
            .iter()
            .filter(|o| o.symbol == symbol)
            .cloned()
            .collect())
    }

    async fn mark_symbol_checked(&self, symbol: &str) -> StoreResult<()> {
        if self.state.read().checked.contains(symbol) {
            return Ok(());
        }
        self.commit(JournalRecord::SymbolChecked {
            symbol: symbol.to_string(),
        })
    }

    async fn is_symbol_checked(&self, symbol: &str) -> StoreResult<bool> {
        Ok(self.state.read().checked.contains(symbol))
    }

    async fn mark_symbol_traded(&self, symbol: &str) -> StoreResult<()> {
        if self.state.read().traded.contains(symbol) {
            return Ok(());
        }
        self.commit(JournalRecord::SymbolTraded {
            symbol: symbol.to_string(),
        })
    }

    async fn is_symbol_traded(&self, symbol: &str) -> StoreResult<bool> {
        Ok(self.state.read().traded.contains(symbol))
    }

    async fn next_traded_symbol(&self) -> StoreResult<Option<String>> {
        let state = self.state.read();
        // None sorts before Some, so never-downloaded symbols go first.
        Ok(state
            .traded
            .iter()
            .map(|symbol| {
                let last = state.sync.get(symbol).and_then(|s| s.last_downloaded_ms);
                let seq = state.download_seq.get(symbol).copied().unwrap_or(0);
                (last, seq, symbol)
            })
            .min()
            .map(|(_, _, symbol)| symbol.clone()))
    }

    async fn record_last_downloaded(&self, symbol: &str, time_ms: i64) -> StoreResult<()> {
        let mut state = self.state.write();
        state.next_download_seq += 1;
        let seq = state.next_download_seq;
        state.download_seq.insert(symbol.to_string(), seq);
        state
            .sync
            .entry(symbol.to_string())
            .or_default()
            .last_downloaded_ms = Some(time_ms);
        Ok(())
    }

    async fn sync_state(&self, symbol: &str) -> StoreResult<SyncState> {
        Ok(self
            .state
            .read()
            .sync
            .get(symbol)
            .copied()
            .unwrap_or_default())
    }

    async fn mark_backfill_complete(&self, symbol: &str) -> StoreResult<()> {
        if self.sync_state(symbol).await?.backfill_complete {
            return Ok(());
        }
        self.commit(JournalRecord::BackfillComplete {
            symbol: symbol.to_string(),
        })
    }

    async fn record_tick(&self, tick: Tick) -> StoreResult<()> {
        self.state.write().ticks.insert(tick.symbol.clone(), tick);
        Ok(())
    }

    async fn current_price(&self, symbol: &str) -> StoreResult<Option<Tick>> {
        Ok(self.state.read().ticks.get(symbol).cloned())
    }
}
