//! Builders for HTTP state ports over the configured storage.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;

use schoollib::domain::ports::{CatalogueRepository, CirculationStore, UserRepository};
use schoollib::domain::{AccountService, CatalogueService, CirculationService, Error, LoanPeriod};
use schoollib::inbound::http::state::{HttpState, HttpStatePorts};
use schoollib::outbound::persistence::{
    DieselCatalogueRepository, DieselCirculationStore, DieselUserRepository,
};

use super::config::Storage;

fn account_service<U>(users: Arc<U>) -> Arc<AccountService<U>>
where
    U: UserRepository + 'static,
{
    Arc::new(AccountService::new(users, Arc::new(DefaultClock)))
}

/// Store the built-in accounts that are missing from the configured storage.
pub async fn seed_accounts(storage: &Storage) -> Result<usize, Error> {
    match storage {
        Storage::Postgres(pool) => {
            account_service(Arc::new(DieselUserRepository::new(pool.clone())))
                .seed_fixture_accounts()
                .await
        }
        Storage::Memory(_, users) => {
            account_service(Arc::new(users.clone()))
                .seed_fixture_accounts()
                .await
        }
    }
}

/// Wire the circulation engine and catalogue service over one store pair,
/// and the account service over the user repository.
///
/// The engine and catalogue share the same backing data so that catalogue
/// edits and loans see each other's counter changes.
fn wire_ports<S, R, U>(
    store: Arc<S>,
    catalogue: Arc<R>,
    users: Arc<U>,
    loan_period: LoanPeriod,
) -> HttpStatePorts
where
    S: CirculationStore + 'static,
    R: CatalogueRepository + 'static,
    U: UserRepository + 'static,
{
    let accounts = account_service(users);
    let circulation = Arc::new(CirculationService::new(
        store,
        Arc::new(DefaultClock),
        loan_period,
    ));
    let catalogue = Arc::new(CatalogueService::new(catalogue));
    HttpStatePorts {
        login: accounts.clone(),
        registration: accounts,
        circulation: circulation.clone(),
        circulation_query: circulation,
        catalogue: catalogue.clone(),
        catalogue_query: catalogue,
    }
}

/// Build the shared HTTP state for the configured storage.
pub(super) fn build_http_state(storage: &Storage, loan_period: LoanPeriod) -> web::Data<HttpState> {
    let ports = match storage {
        Storage::Postgres(pool) => wire_ports(
            Arc::new(DieselCirculationStore::new(pool.clone())),
            Arc::new(DieselCatalogueRepository::new(pool.clone())),
            Arc::new(DieselUserRepository::new(pool.clone())),
            loan_period,
        ),
        Storage::Memory(library, users) => wire_ports(
            Arc::new(library.clone()),
            Arc::new(library.clone()),
            Arc::new(users.clone()),
            loan_period,
        ),
    };
    web::Data::new(HttpState::new(ports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use schoollib::domain::ports::{BorrowRequest, LoginService, NewTitle};
    use schoollib::domain::{
        Caller, FIXTURE_PASSWORD, LoginCredentials, Role, TitleDetails, TitleDetailsDraft, UserId,
    };

    fn student() -> Caller {
        let id = UserId::new("6f1c3a52-3a55-4c59-9d7e-2f0b8f3d9a11").expect("valid user id");
        Caller::new(id, Role::Student)
    }

    #[rstest]
    #[tokio::test]
    async fn memory_storage_shares_counters_between_catalogue_and_engine() {
        let storage = Storage::memory();
        let state = build_http_state(&storage, LoanPeriod::default());

        let details = TitleDetails::new(TitleDetailsDraft {
            name: "The Phantom Tollbooth".to_owned(),
            ..TitleDetailsDraft::default()
        })
        .expect("valid details");
        let title = state
            .catalogue
            .create(NewTitle { details, total: 1 })
            .await
            .expect("title created");

        let loan = state
            .circulation
            .borrow(&student(), BorrowRequest { title_id: title.id() })
            .await
            .expect("borrow succeeds");
        assert_eq!(loan.title_id(), title.id());

        let shelved = state
            .catalogue_query
            .get(title.id())
            .await
            .expect("title readable");
        assert_eq!(shelved.copies().available(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn configured_loan_period_sets_due_dates() {
        let storage = Storage::memory();
        let period = LoanPeriod::from_days(7).expect("non-zero period");
        let state = build_http_state(&storage, period);

        let details = TitleDetails::new(TitleDetailsDraft {
            name: "Charlotte's Web".to_owned(),
            ..TitleDetailsDraft::default()
        })
        .expect("valid details");
        let title = state
            .catalogue
            .create(NewTitle { details, total: 2 })
            .await
            .expect("title created");
        let loan = state
            .circulation
            .borrow(&student(), BorrowRequest { title_id: title.id() })
            .await
            .expect("borrow succeeds");

        assert_eq!((loan.due_at() - loan.borrowed_at()).num_days(), 7);
    }

    #[rstest]
    #[tokio::test]
    async fn seeded_memory_accounts_log_in_once_seeded_twice() {
        let storage = Storage::memory();
        assert_eq!(seed_accounts(&storage).await.expect("first seed"), 3);
        assert_eq!(seed_accounts(&storage).await.expect("second seed"), 0);
        let state = build_http_state(&storage, LoanPeriod::default());

        let credentials =
            LoginCredentials::try_from_parts("admin", FIXTURE_PASSWORD).expect("credentials shape");
        let admin = state
            .login
            .authenticate(&credentials)
            .await
            .expect("seeded admin logs in");

        assert_eq!(admin.role, Role::Admin);
    }
}
