//! Token ledger service: single source of truth for balance and plan.
//!
//! Every mutation runs inside a [`LedgerSession`], which holds the ledger's
//! mutex from the store read until the store write completes. Two
//! back-to-back calls therefore never read the same stale record: the second
//! waits until the first has persisted.
//!
//! A warm copy of the last persisted account is kept in a `watch` channel so
//! UI reads ([`TokenLedger::snapshot`], [`TokenLedger::balance`], ...) are
//! synchronous.

use std::sync::Arc;

use posty_core::account::{StoredAccount, TokenAccount};
use posty_core::activity::TokenActivityEntry;
use posty_core::clock::Clock;
use posty_core::config::EconomyConfig;
use posty_core::plan::Plan;
use posty_core::types::{CalendarDate, Tokens};
use posty_events::{EconomyEvent, EventBus, EventKind};
use posty_store::repositories::AccountRepo;
use posty_store::DurableStore;
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::activity_log::ActivityLog;
use crate::error::LedgerError;

/// Source tag used when a spend does not name its flow.
pub const DEFAULT_SPEND_SOURCE: &str = "generate";

// ---------------------------------------------------------------------------
// TokenLedger
// ---------------------------------------------------------------------------

/// Persisted, serialized token ledger.
pub struct TokenLedger {
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    bus: Arc<EventBus>,
    activity: Arc<ActivityLog>,
    config: EconomyConfig,
    op_lock: Mutex<()>,
    cache: watch::Sender<TokenAccount>,
}

impl TokenLedger {
    pub fn new(
        store: Arc<dyn DurableStore>,
        clock: Arc<dyn Clock>,
        bus: Arc<EventBus>,
        activity: Arc<ActivityLog>,
        config: EconomyConfig,
    ) -> Self {
        let (cache, _) = watch::channel(TokenAccount::empty(clock.today()));
        Self {
            store,
            clock,
            bus,
            activity,
            config,
            op_lock: Mutex::new(()),
            cache,
        }
    }

    /// Load (or lazily create) the account, applying the daily reset.
    ///
    /// Store failures are logged and the last cached account is returned.
    pub async fn account(&self) -> TokenAccount {
        let result: Result<TokenAccount, LedgerError> = async {
            let mut session = self.begin().await?;
            session.commit().await
        }
        .await;

        match result {
            Ok(account) => account,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load token account, using cached state");
                self.snapshot()
            }
        }
    }

    /// Run the daily refill check. Idempotent per calendar day.
    pub async fn grant_daily(&self) -> TokenAccount {
        self.account().await
    }

    /// Spend `amount` tokens for `source`.
    ///
    /// Pro accounts always succeed without losing balance. The spend is
    /// appended to the activity log after the ledger record is persisted.
    pub async fn spend(&self, amount: Tokens, source: &str) -> Result<TokenAccount, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut session = self.begin().await?;
        if let Err(e) = session.account_mut().spend(amount) {
            tracing::info!(
                requested = e.requested,
                available = e.available,
                source,
                "Spend rejected: insufficient balance"
            );
            return Err(e.into());
        }
        let account = session.commit().await?;

        let now = self.clock.now();
        if let Err(e) = self
            .activity
            .record(TokenActivityEntry::spend(amount, source, now))
            .await
        {
            tracing::error!(error = %e, source, "Failed to log token spend");
        }
        self.bus.publish(
            EconomyEvent::new(EventKind::TokensSpent {
                amount,
                source: source.to_string(),
            })
            .at(now),
        );
        tracing::info!(amount, source, balance = account.balance, "Tokens spent");

        Ok(account)
    }

    /// Switch plan without refilling. See [`TokenAccount::set_plan`].
    pub async fn set_plan(&self, plan: Plan) -> Result<TokenAccount, LedgerError> {
        let mut session = self.begin().await?;
        let previous = session.account().plan;
        session.account_mut().set_plan(plan);
        let account = session.commit().await?;
        tracing::info!(from = %previous, to = %plan, balance = account.balance, "Plan changed");
        Ok(account)
    }

    /// Remove the ledger record and legacy quota keys (account deletion).
    pub async fn clear(&self) -> Result<(), LedgerError> {
        let _guard = self.op_lock.lock().await;
        AccountRepo::purge(&*self.store).await?;
        self.cache
            .send_replace(TokenAccount::empty(self.clock.today()));
        tracing::info!("Token ledger cleared");
        Ok(())
    }

    // -- synchronous reads -------------------------------------------------

    /// Last persisted account.
    pub fn snapshot(&self) -> TokenAccount {
        self.cache.borrow().clone()
    }

    /// Spendable balance (pro reports its sentinel ceiling).
    pub fn balance(&self) -> Tokens {
        self.cache.borrow().spendable()
    }

    pub fn plan(&self) -> Plan {
        self.cache.borrow().plan
    }

    /// Reward tokens still earnable today.
    pub fn remaining_earn_quota(&self) -> Tokens {
        self.cache
            .borrow()
            .remaining_earn_quota(self.config.max_daily_earned)
    }

    /// Receive every persisted account update.
    pub fn subscribe(&self) -> watch::Receiver<TokenAccount> {
        self.cache.subscribe()
    }

    // -- sessions ----------------------------------------------------------

    /// Acquire the ledger lock and load the current account for mutation.
    ///
    /// The returned session holds the lock until dropped. Pending changes
    /// (including a due daily reset) are written only by
    /// [`LedgerSession::commit`].
    pub(crate) async fn begin(&self) -> Result<LedgerSession<'_>, LedgerError> {
        let guard = self.op_lock.lock().await;
        let today = self.clock.today();

        let (mut account, mut dirty) = match AccountRepo::find(&*self.store).await {
            Ok(Some(StoredAccount::Current(account))) => (account, false),
            Ok(Some(StoredAccount::Legacy(legacy))) => {
                let reset_date = self.clock.local_date(legacy.last_reset_date);
                let account = legacy.into_account(reset_date);
                tracing::info!(
                    plan = %account.plan,
                    balance = account.balance,
                    "Migrating legacy subscription record"
                );
                (account, true)
            }
            Ok(None) => {
                tracing::info!(initial_grant = self.config.initial_grant, "Creating token account");
                (TokenAccount::new(today, self.config.initial_grant), true)
            }
            Err(e) if e.is_corrupt() => {
                AccountRepo::back_up(&*self.store).await?;
                tracing::warn!(
                    error = %e,
                    backup = posty_store::keys::ACCOUNT_BACKUP,
                    "Token account unreadable, moved aside; starting from an empty account"
                );
                (TokenAccount::empty(today), true)
            }
            Err(e) => return Err(e.into()),
        };

        if account.apply_daily_reset(today) {
            tracing::info!(
                plan = %account.plan,
                balance = account.balance,
                date = %today,
                "Daily token reset applied"
            );
            dirty = true;
        }

        let legacy_date = self.fold_legacy_quota(&mut account, today).await;
        dirty |= legacy_date.is_some();

        Ok(LedgerSession {
            ledger: self,
            _guard: guard,
            account,
            dirty,
            legacy_date,
        })
    }

    /// Merge a leftover date-scoped quota key into `earned_today`.
    ///
    /// Returns the date whose key should be removed after the next commit.
    async fn fold_legacy_quota(
        &self,
        account: &mut TokenAccount,
        today: CalendarDate,
    ) -> Option<CalendarDate> {
        match AccountRepo::find_legacy_earned(&*self.store, today).await {
            Ok(Some(legacy)) => {
                let folded = account
                    .earned_today
                    .max(legacy)
                    .min(self.config.max_daily_earned);
                tracing::info!(legacy, folded, "Folding legacy earn quota into account");
                account.earned_today = folded;
                Some(today)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable legacy earn quota");
                None
            }
        }
    }

    fn max_daily_earned(&self) -> Tokens {
        self.config.max_daily_earned
    }
}

// ---------------------------------------------------------------------------
// LedgerSession
// ---------------------------------------------------------------------------

/// Exclusive read-modify-write access to the account.
pub(crate) struct LedgerSession<'a> {
    ledger: &'a TokenLedger,
    _guard: MutexGuard<'a, ()>,
    account: TokenAccount,
    dirty: bool,
    legacy_date: Option<CalendarDate>,
}

impl LedgerSession<'_> {
    pub(crate) fn account(&self) -> &TokenAccount {
        &self.account
    }

    pub(crate) fn account_mut(&mut self) -> &mut TokenAccount {
        self.dirty = true;
        &mut self.account
    }

    pub(crate) fn max_daily_earned(&self) -> Tokens {
        self.ledger.max_daily_earned()
    }

    /// Persist pending changes and refresh the cache. The lock stays held
    /// until the session is dropped.
    pub(crate) async fn commit(&mut self) -> Result<TokenAccount, LedgerError> {
        let ledger = self.ledger;
        if self.dirty {
            AccountRepo::save(&*ledger.store, &self.account).await?;
            self.dirty = false;

            if let Some(date) = self.legacy_date.take() {
                if let Err(e) = AccountRepo::delete_legacy_earned(&*ledger.store, date).await {
                    tracing::warn!(error = %e, "Failed to remove legacy earn quota key");
                }
            }

            ledger.bus.publish(
                EconomyEvent::new(EventKind::AccountUpdated {
                    plan: self.account.plan,
                    balance: self.account.balance,
                    earned_today: self.account.earned_today,
                })
                .at(ledger.clock.now()),
            );
        }

        ledger.cache.send_replace(self.account.clone());
        Ok(self.account.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
