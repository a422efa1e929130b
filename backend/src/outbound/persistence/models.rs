//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    CopyCounts, Loan, LoanId, LoanRecord, LoanStatus, PasswordHash, Role, Title, TitleDetails,
    TitleDetailsDraft, TitleId, UserAccount, UserAccountRecord, UserId, Username,
};

use super::schema::{loans, titles, users};

/// Row struct for reading from the titles table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = titles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TitleRow {
    pub id: Uuid,
    pub name: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
}

impl TitleRow {
    /// Rebuild the domain title, rejecting rows that break its invariants.
    pub fn into_domain(self) -> Result<Title, String> {
        let details = TitleDetails::new(TitleDetailsDraft {
            name: self.name,
            author: self.author,
            publisher: self.publisher,
            isbn: self.isbn,
            category: self.category,
        })
        .map_err(|err| format!("stored title {}: {err}", self.id))?;
        let copies = CopyCounts::from_stored(self.total_copies, self.available_copies)
            .map_err(|err| format!("stored title {}: {err}", self.id))?;
        Ok(Title::new(TitleId::from_uuid(self.id), details, copies))
    }
}

/// Insertable struct for creating title records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = titles)]
pub(crate) struct NewTitleRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub author: Option<&'a str>,
    pub publisher: Option<&'a str>,
    pub isbn: Option<&'a str>,
    pub category: Option<&'a str>,
    pub total_copies: i32,
    pub available_copies: i32,
}

/// Changeset for the metadata columns of a title.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = titles)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TitleDetailsChangeset<'a> {
    pub name: &'a str,
    pub author: Option<&'a str>,
    pub publisher: Option<&'a str>,
    pub isbn: Option<&'a str>,
    pub category: Option<&'a str>,
}

impl<'a> From<&'a TitleDetails> for TitleDetailsChangeset<'a> {
    fn from(details: &'a TitleDetails) -> Self {
        Self {
            name: details.name(),
            author: details.author(),
            publisher: details.publisher(),
            isbn: details.isbn(),
            category: details.category(),
        }
    }
}

/// Row struct for reading from the loans table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = loans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LoanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title_id: Uuid,
    pub status: String,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl LoanRow {
    /// Rebuild the domain loan, rejecting unknown status strings.
    pub fn into_domain(self) -> Result<Loan, String> {
        let status: LoanStatus = self
            .status
            .parse()
            .map_err(|err| format!("stored loan {}: {err}", self.id))?;
        Ok(Loan::from(LoanRecord {
            id: LoanId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            title_id: TitleId::from_uuid(self.title_id),
            status,
            borrowed_at: self.borrowed_at,
            due_at: self.due_at,
            returned_at: self.returned_at,
        }))
    }
}

/// Insertable struct for opening a loan.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = loans)]
pub(crate) struct NewLoanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title_id: Uuid,
    pub status: &'static str,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

impl From<&Loan> for NewLoanRow {
    fn from(loan: &Loan) -> Self {
        Self {
            id: *loan.id().as_uuid(),
            user_id: *loan.user_id().as_uuid(),
            title_id: *loan.title_id().as_uuid(),
            status: loan.status().as_str(),
            borrowed_at: loan.borrowed_at(),
            due_at: loan.due_at(),
        }
    }
}

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub contact: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl UserRow {
    /// Rebuild the domain account, rejecting unknown roles and bad names.
    pub fn into_domain(self) -> Result<UserAccount, String> {
        let role: Role = self
            .role
            .parse()
            .map_err(|err| format!("stored user {}: {err}", self.id))?;
        let username = Username::new(&self.username)
            .map_err(|err| format!("stored user {}: {err}", self.id))?;
        Ok(UserAccount::from(UserAccountRecord {
            id: UserId::from_uuid(self.id),
            username,
            password_hash: PasswordHash::from_encoded(self.password_hash),
            role,
            contact: self.contact,
            registered_at: self.registered_at,
        }))
    }
}

/// Insertable struct for registering an account.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub role: &'static str,
    pub contact: Option<&'a str>,
    pub registered_at: DateTime<Utc>,
}

impl<'a> From<&'a UserAccount> for NewUserRow<'a> {
    fn from(account: &'a UserAccount) -> Self {
        Self {
            id: *account.id().as_uuid(),
            username: account.username().as_ref(),
            password_hash: account.password_hash().as_str(),
            role: account.role().as_str(),
            contact: account.contact(),
            registered_at: account.registered_at(),
        }
    }
}
