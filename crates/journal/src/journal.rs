use crate::collection::Collection;
use crate::document::{JournalDocument, TradeDocument};
use crate::error::JournalError;
use core_types::{
    Account, AccountInput, AvoidedTrade, DailyNote, MindsetCheckin, Mistake, PretradeAnalysis,
    Quote, Record, Trade, TradeInput, UserId,
};
use uuid::Uuid;

/// What happens to an account's trades when the account is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Refuse while any trade still references the account.
    #[default]
    Block,
    /// Delete the account's trades along with it.
    Cascade,
}

/// The result of a successful `delete_account`.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRemoval {
    pub account: Account,
    pub trades: Vec<Trade>,
}

macro_rules! record_methods {
    ($kind:ty, $field:ident, $add:ident, $replace:ident, $delete:ident) => {
        pub fn $add(&mut self, body: $kind) -> Result<&Record<$kind>, JournalError> {
            self.$field.insert(body)
        }

        pub fn $replace(&mut self, id: Uuid, body: $kind) -> Result<&Record<$kind>, JournalError> {
            self.$field.replace(id, body)
        }

        pub fn $delete(&mut self, id: Uuid) -> Result<Record<$kind>, JournalError> {
            self.$field.remove(id)
        }

        pub fn $field(&self) -> &Collection<$kind> {
            &self.$field
        }
    };
}

/// The in-memory trading journal.
///
/// Every mutation validates its input before anything is stored, so the
/// collections only ever hold records that passed their checks. Trades always
/// reference an account that exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Journal {
    accounts: Vec<Account>,
    trades: Vec<Trade>,
    mistakes: Collection<Mistake>,
    avoided_trades: Collection<AvoidedTrade>,
    pretrade_analyses: Collection<PretradeAnalysis>,
    checkins: Collection<MindsetCheckin>,
    quotes: Collection<Quote>,
    daily_notes: Collection<DailyNote>,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

impl Journal {
    pub fn new() -> Self {
        Self {
            accounts: Vec::new(),
            trades: Vec::new(),
            mistakes: Collection::new("mistake"),
            avoided_trades: Collection::new("avoided trade"),
            pretrade_analyses: Collection::new("pre-trade analysis"),
            checkins: Collection::new("mindset check-in"),
            quotes: Collection::new("quote"),
            daily_notes: Collection::new("daily note"),
        }
    }

    // --- Accounts ---

    pub fn add_account(&mut self, input: AccountInput) -> Result<&Account, JournalError> {
        let account = Account::new(Uuid::new_v4(), input)?;
        tracing::debug!(id = %account.id, name = %account.name, "Account added.");
        self.accounts.push(account);
        Ok(&self.accounts[self.accounts.len() - 1])
    }

    pub fn replace_account(
        &mut self,
        id: Uuid,
        input: AccountInput,
    ) -> Result<&Account, JournalError> {
        let index = self.account_index(id)?;
        self.accounts[index] = Account::new(id, input)?;
        Ok(&self.accounts[index])
    }

    /// Removes an account. Under `DeletePolicy::Block` this fails with
    /// `AccountInUse` while trades reference it.
    pub fn delete_account(
        &mut self,
        id: Uuid,
        policy: DeletePolicy,
    ) -> Result<AccountRemoval, JournalError> {
        let index = self.account_index(id)?;
        let referenced = self.trades.iter().filter(|t| t.account_id == id).count();
        if policy == DeletePolicy::Block && referenced > 0 {
            return Err(JournalError::AccountInUse {
                account_id: id,
                trades: referenced,
            });
        }

        let account = self.accounts.remove(index);
        let (trades, kept): (Vec<Trade>, Vec<Trade>) = std::mem::take(&mut self.trades)
            .into_iter()
            .partition(|t| t.account_id == id);
        self.trades = kept;

        tracing::info!(%id, trades_removed = trades.len(), "Account deleted.");
        Ok(AccountRemoval { account, trades })
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn accounts_for_user(&self, user_id: UserId) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(move |a| a.user_id == user_id)
    }

    fn account_index(&self, id: Uuid) -> Result<usize, JournalError> {
        self.accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or(JournalError::NotFound { kind: "account", id })
    }

    fn require_account(&self, id: Uuid) -> Result<(), JournalError> {
        match self.account(id) {
            Some(_) => Ok(()),
            None => Err(JournalError::UnknownAccount(id)),
        }
    }

    // --- Trades ---

    /// Validates the input, derives PnL and R-multiple, and stores the trade.
    pub fn add_trade(&mut self, input: TradeInput) -> Result<&Trade, JournalError> {
        self.require_account(input.account_id)?;
        let trade = Trade::new(Uuid::new_v4(), input)?;
        tracing::debug!(id = %trade.id, symbol = %trade.symbol, pnl = %trade.pnl, "Trade added.");
        self.trades.push(trade);
        Ok(&self.trades[self.trades.len() - 1])
    }

    pub fn replace_trade(&mut self, id: Uuid, input: TradeInput) -> Result<&Trade, JournalError> {
        self.require_account(input.account_id)?;
        let index = self.trade_index(id)?;
        self.trades[index].replace(input)?;
        Ok(&self.trades[index])
    }

    pub fn delete_trade(&mut self, id: Uuid) -> Result<Trade, JournalError> {
        let index = self.trade_index(id)?;
        Ok(self.trades.remove(index))
    }

    pub fn trade(&self, id: Uuid) -> Option<&Trade> {
        self.trades.iter().find(|t| t.id == id)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn trades_for_user(&self, user_id: UserId) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(move |t| t.user_id == user_id)
    }

    fn trade_index(&self, id: Uuid) -> Result<usize, JournalError> {
        self.trades
            .iter()
            .position(|t| t.id == id)
            .ok_or(JournalError::NotFound { kind: "trade", id })
    }

    // --- Journal entries ---

    record_methods!(Mistake, mistakes, add_mistake, replace_mistake, delete_mistake);
    record_methods!(
        AvoidedTrade,
        avoided_trades,
        add_avoided_trade,
        replace_avoided_trade,
        delete_avoided_trade
    );
    record_methods!(
        PretradeAnalysis,
        pretrade_analyses,
        add_pretrade_analysis,
        replace_pretrade_analysis,
        delete_pretrade_analysis
    );
    record_methods!(MindsetCheckin, checkins, add_checkin, replace_checkin, delete_checkin);
    record_methods!(Quote, quotes, add_quote, replace_quote, delete_quote);

    /// Links a plan to the trade that executed it.
    pub fn mark_pretrade_executed(
        &mut self,
        plan_id: Uuid,
        trade_id: Uuid,
    ) -> Result<&Record<PretradeAnalysis>, JournalError> {
        if self.trade(trade_id).is_none() {
            return Err(JournalError::NotFound {
                kind: "trade",
                id: trade_id,
            });
        }
        let plan = self.pretrade_analyses.get_mut(plan_id)?;
        plan.body.executed = true;
        plan.body.trade_id = Some(trade_id);
        Ok(&*plan)
    }

    pub fn active_quotes(&self) -> impl Iterator<Item = &Record<Quote>> {
        self.quotes.iter().filter(|q| q.body.active)
    }

    /// Stores the note, replacing the user's existing note for that date.
    pub fn upsert_daily_note(&mut self, note: DailyNote) -> Result<&Record<DailyNote>, JournalError> {
        let existing = self
            .daily_notes
            .iter()
            .find(|r| r.body.user_id == note.user_id && r.body.date == note.date)
            .map(|r| r.id);
        match existing {
            Some(id) => self.daily_notes.replace(id, note),
            None => self.daily_notes.insert(note),
        }
    }

    pub fn delete_daily_note(&mut self, id: Uuid) -> Result<Record<DailyNote>, JournalError> {
        self.daily_notes.remove(id)
    }

    pub fn daily_notes(&self) -> &Collection<DailyNote> {
        &self.daily_notes
    }

    // --- Documents ---

    /// Builds a journal from an exported document, validating every record.
    pub fn from_document(document: JournalDocument) -> Result<Self, JournalError> {
        let mut journal = Self::new();

        for record in document.accounts {
            if journal.account(record.id).is_some() {
                return Err(JournalError::DuplicateId {
                    kind: "account",
                    id: record.id,
                });
            }
            journal.accounts.push(Account::new(record.id, record.body)?);
        }

        for entry in document.trades {
            let trade = entry.into_trade()?;
            if journal.trade(trade.id).is_some() {
                return Err(JournalError::DuplicateId {
                    kind: "trade",
                    id: trade.id,
                });
            }
            journal.require_account(trade.account_id)?;
            journal.trades.push(trade);
        }

        for record in document.mistakes {
            journal.mistakes.restore(record)?;
        }
        for record in document.avoided_trades {
            journal.avoided_trades.restore(record)?;
        }
        for record in document.pretrade_analyses {
            journal.pretrade_analyses.restore(record)?;
        }
        for record in document.checkins {
            journal.checkins.restore(record)?;
        }
        for record in document.quotes {
            journal.quotes.restore(record)?;
        }
        for record in document.daily_notes {
            journal.daily_notes.restore(record)?;
        }

        tracing::info!(
            accounts = journal.accounts.len(),
            trades = journal.trades.len(),
            mistakes = journal.mistakes.len(),
            "Journal loaded."
        );
        Ok(journal)
    }

    pub fn to_document(&self) -> JournalDocument {
        JournalDocument {
            accounts: self
                .accounts
                .iter()
                .map(|a| Record {
                    id: a.id,
                    body: AccountInput {
                        user_id: a.user_id,
                        name: a.name.clone(),
                        size: a.size,
                        currency: a.currency,
                    },
                })
                .collect(),
            trades: self.trades.iter().map(TradeDocument::from).collect(),
            mistakes: self.mistakes.as_slice().to_vec(),
            avoided_trades: self.avoided_trades.as_slice().to_vec(),
            pretrade_analyses: self.pretrade_analyses.as_slice().to_vec(),
            checkins: self.checkins.as_slice().to_vec(),
            quotes: self.quotes.as_slice().to_vec(),
            daily_notes: self.daily_notes.as_slice().to_vec(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, JournalError> {
        let document: JournalDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn to_json_string(&self) -> Result<String, JournalError> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }
}
