//! In-process library store.
//!
//! `InMemoryLibrary` implements both the circulation store and the catalogue
//! repository over one shared state; `InMemoryUsers` holds member accounts.
//! They back the server when no database URL is configured and drive the
//! engine tests.
//!
//! A transaction takes the state lock for its whole lifetime and writes in
//! place, recording the prior value of every title or loan it touches.
//! Commit forgets that log; rollback or drop replays it in reverse.
//! Transactions are therefore serialised, which gives the conditional writes
//! their atomicity without further coordination.

mod users;

pub use users::InMemoryUsers;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::ports::{
    CatalogueRepository, CatalogueRepositoryError, CirculationStore, CirculationStoreError,
    CirculationTransaction,
};
use crate::domain::{CopyCounts, Loan, LoanId, Title, TitleDetails, TitleId, UserId};

#[derive(Debug, Default)]
struct LibraryState {
    titles: HashMap<TitleId, Title>,
    loans: Vec<Loan>,
}

impl LibraryState {
    fn loan_position(&self, loan_id: LoanId) -> Option<usize> {
        self.loans.iter().position(|loan| loan.id() == loan_id)
    }

    fn has_active_loan(&self, user_id: &UserId, title_id: TitleId) -> bool {
        self.loans.iter().any(|loan| {
            loan.is_active() && loan.user_id() == user_id && loan.title_id() == title_id
        })
    }
}

fn in_borrow_order(mut loans: Vec<Loan>) -> Vec<Loan> {
    loans.sort_by(|a, b| {
        a.borrowed_at()
            .cmp(&b.borrowed_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
    loans
}

/// Shared in-memory titles and loans.
///
/// Cloning yields another handle onto the same state.
///
/// # Examples
/// ```
/// use schoollib::outbound::memory::InMemoryLibrary;
///
/// let library = InMemoryLibrary::new();
/// let other = library.clone();
/// # let _ = other;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryLibrary {
    state: Arc<Mutex<LibraryState>>,
}

impl InMemoryLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CirculationStore for InMemoryLibrary {
    async fn begin(&self) -> Result<Box<dyn CirculationTransaction>, CirculationStoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(InMemoryTransaction {
            guard,
            undo: Vec::new(),
        }))
    }

    async fn list_loans_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Loan>, CirculationStoreError> {
        let state = self.state.lock().await;
        let loans = state
            .loans
            .iter()
            .filter(|loan| loan.user_id() == user_id)
            .cloned()
            .collect();
        Ok(in_borrow_order(loans))
    }

    async fn list_all_loans(&self) -> Result<Vec<Loan>, CirculationStoreError> {
        let state = self.state.lock().await;
        Ok(in_borrow_order(state.loans.clone()))
    }
}

/// Prior value of one write made inside a transaction.
enum Undo {
    Title(Title),
    LoanInserted,
    LoanReturned { position: usize, previous: Loan },
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<LibraryState>,
    undo: Vec<Undo>,
}

impl InMemoryTransaction {
    fn replace_copies(
        &mut self,
        title_id: TitleId,
        change: impl FnOnce(CopyCounts) -> Option<CopyCounts>,
    ) -> bool {
        let Some(title) = self.guard.titles.get_mut(&title_id) else {
            return false;
        };
        let Some(copies) = change(title.copies()) else {
            return false;
        };
        let replacement = Title::new(title_id, title.details().clone(), copies);
        let previous = std::mem::replace(title, replacement);
        self.undo.push(Undo::Title(previous));
        true
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        let state = &mut *self.guard;
        while let Some(entry) = self.undo.pop() {
            match entry {
                Undo::Title(previous) => {
                    state.titles.insert(previous.id(), previous);
                }
                Undo::LoanInserted => {
                    state.loans.pop();
                }
                Undo::LoanReturned { position, previous } => {
                    if let Some(loan) = state.loans.get_mut(position) {
                        *loan = previous;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl CirculationTransaction for InMemoryTransaction {
    async fn find_active_loan(
        &mut self,
        user_id: &UserId,
        title_id: TitleId,
    ) -> Result<Option<Loan>, CirculationStoreError> {
        Ok(self
            .guard
            .loans
            .iter()
            .find(|loan| {
                loan.is_active() && loan.user_id() == user_id && loan.title_id() == title_id
            })
            .cloned())
    }

    async fn decrement_if_available(
        &mut self,
        title_id: TitleId,
    ) -> Result<u64, CirculationStoreError> {
        Ok(u64::from(self.replace_copies(title_id, CopyCounts::decremented)))
    }

    async fn increment(&mut self, title_id: TitleId) -> Result<(), CirculationStoreError> {
        if self.replace_copies(title_id, |copies| Some(copies.incremented())) {
            Ok(())
        } else {
            Err(CirculationStoreError::query(format!("title {title_id} missing during return")))
        }
    }

    async fn insert_loan(&mut self, loan: &Loan) -> Result<(), CirculationStoreError> {
        if !self.guard.titles.contains_key(&loan.title_id()) {
            return Err(CirculationStoreError::query(format!(
                "title {} does not exist",
                loan.title_id()
            )));
        }
        if self.guard.has_active_loan(loan.user_id(), loan.title_id()) {
            return Err(CirculationStoreError::DuplicateActiveLoan);
        }
        self.guard.loans.push(loan.clone());
        self.undo.push(Undo::LoanInserted);
        Ok(())
    }

    async fn find_loan_for_update(
        &mut self,
        loan_id: LoanId,
    ) -> Result<Option<Loan>, CirculationStoreError> {
        Ok(self
            .guard
            .loan_position(loan_id)
            .map(|position| self.guard.loans[position].clone()))
    }

    async fn mark_returned(
        &mut self,
        loan_id: LoanId,
        returned_at: DateTime<Utc>,
    ) -> Result<u64, CirculationStoreError> {
        let Some(position) = self.guard.loan_position(loan_id) else {
            return Ok(0);
        };
        let loan = &mut self.guard.loans[position];
        let previous = loan.clone();
        // Only an active loan moves; anything else affects no rows.
        if loan.mark_returned(returned_at).is_err() {
            return Ok(0);
        }
        self.undo.push(Undo::LoanReturned { position, previous });
        Ok(1)
    }

    async fn commit(self: Box<Self>) -> Result<(), CirculationStoreError> {
        let mut tx = self;
        tx.undo.clear();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), CirculationStoreError> {
        Ok(())
    }
}

#[async_trait]
impl CatalogueRepository for InMemoryLibrary {
    async fn insert(&self, title: &Title) -> Result<(), CatalogueRepositoryError> {
        let mut state = self.state.lock().await;
        if state.titles.contains_key(&title.id()) {
            return Err(CatalogueRepositoryError::query(format!(
                "title {} already exists",
                title.id()
            )));
        }
        state.titles.insert(title.id(), title.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        title_id: TitleId,
    ) -> Result<Option<Title>, CatalogueRepositoryError> {
        Ok(self.state.lock().await.titles.get(&title_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Title>, CatalogueRepositoryError> {
        let state = self.state.lock().await;
        let mut titles: Vec<Title> = state.titles.values().cloned().collect();
        titles.sort_by(|a, b| {
            a.details()
                .name()
                .cmp(b.details().name())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(titles)
    }

    async fn update(
        &self,
        title_id: TitleId,
        details: &TitleDetails,
        new_total: u32,
    ) -> Result<Option<Title>, CatalogueRepositoryError> {
        let mut state = self.state.lock().await;
        let Some(title) = state.titles.get_mut(&title_id) else {
            return Ok(None);
        };
        *title = Title::new(
            title_id,
            details.clone(),
            title.copies().adjust_total(new_total),
        );
        Ok(Some(title.clone()))
    }

    async fn delete(&self, title_id: TitleId) -> Result<bool, CatalogueRepositoryError> {
        let mut state = self.state.lock().await;
        if state.loans.iter().any(|loan| loan.title_id() == title_id) {
            return Err(CatalogueRepositoryError::in_use(title_id.to_string()));
        }
        Ok(state.titles.remove(&title_id).is_some())
    }
}
