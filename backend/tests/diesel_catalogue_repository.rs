//! Integration tests for `DieselCatalogueRepository` against embedded
//! PostgreSQL.
//!
//! # Runtime Strategy
//!
//! Steps are synchronous and share one Tokio runtime held in the test
//! context, so database calls stay deterministic across steps.

use std::sync::{Arc, Mutex};

use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use rstest_bdd_macros::{then, when};
use schoollib::domain::ports::{
    BorrowRequest, CatalogueCommand, CatalogueQuery, CatalogueRepository,
    CatalogueRepositoryError, CirculationCommand, NewTitle, TitleUpdate,
};
use schoollib::domain::{
    Caller, CatalogueService, CirculationService, ErrorCode, LoanPeriod, Role, Title, TitleDetails,
    TitleDetailsDraft, TitleId, UserId,
};
use schoollib::outbound::persistence::{
    DbPool, DieselCatalogueRepository, DieselCirculationStore, PoolConfig,
};
use tokio::runtime::Runtime;
use uuid::Uuid;

mod support;

use support::embedded_postgres::execute_sql;
use support::{handle_cluster_setup_failure, provision_library_database, shared_cluster};

struct TestContext {
    runtime: Runtime,
    repository: Arc<DieselCatalogueRepository>,
    catalogue: CatalogueService<DieselCatalogueRepository>,
    circulation: CirculationService<DieselCirculationStore>,
    database_url: String,
    title: Option<Title>,
    last_update: Option<Title>,
    last_delete: Option<Result<bool, CatalogueRepositoryError>>,
    _database: TemporaryDatabase,
}

type SharedContext = Arc<Mutex<TestContext>>;

fn details(name: &str) -> TitleDetails {
    TitleDetails::new(TitleDetailsDraft {
        name: name.to_owned(),
        author: Some("Louis Sachar".to_owned()),
        isbn: Some("978-0-440-41480-3".to_owned()),
        ..TitleDetailsDraft::default()
    })
    .expect("valid details")
}

fn member() -> Caller {
    let id = UserId::new(Uuid::new_v4().to_string()).expect("valid user id");
    Caller::new(id, Role::Student)
}

fn setup_test_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_library_database(cluster)?;
    let database_url = database.url().to_string();

    let config = PoolConfig::new(&database_url)
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    let repository = Arc::new(DieselCatalogueRepository::new(pool.clone()));
    Ok(TestContext {
        runtime,
        catalogue: CatalogueService::new(Arc::clone(&repository)),
        repository,
        circulation: CirculationService::new(
            Arc::new(DieselCirculationStore::new(pool)),
            Arc::new(DefaultClock),
            LoanPeriod::default(),
        ),
        database_url,
        title: None,
        last_update: None,
        last_delete: None,
        _database: database,
    })
}

#[fixture]
fn catalogue_world() -> Option<SharedContext> {
    match setup_test_context() {
        Ok(ctx) => Some(Arc::new(Mutex::new(ctx))),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn title_id(world: &SharedContext) -> TitleId {
    let ctx = world.lock().expect("context lock");
    ctx.title.as_ref().expect("title catalogued").id()
}

// -----------------------------------------------------------------------------
// Steps
// -----------------------------------------------------------------------------

fn a_catalogued_title(world: &SharedContext, total: u32) {
    let mut ctx = world.lock().expect("context lock");
    let title = ctx
        .runtime
        .block_on(ctx.catalogue.create(NewTitle {
            details: details("Holes"),
            total,
        }))
        .expect("title created");
    ctx.title = Some(title);
}

fn members_borrow_the_title(world: &SharedContext, count: u32) {
    let title_id = title_id(world);
    let ctx = world.lock().expect("context lock");
    for _ in 0..count {
        ctx.runtime
            .block_on(ctx.circulation.borrow(&member(), BorrowRequest { title_id }))
            .expect("borrow succeeds");
    }
}

fn the_total_is_set(world: &SharedContext, total: u32) {
    let title_id = title_id(world);
    let mut ctx = world.lock().expect("context lock");
    let updated = ctx
        .runtime
        .block_on(ctx.catalogue.update(
            title_id,
            TitleUpdate {
                details: details("Holes (Anniversary Edition)"),
                total,
            },
        ))
        .expect("update succeeds");
    ctx.last_update = Some(updated);
}

#[when("the repository deletes the title")]
fn the_repository_deletes_the_title(world: SharedContext) {
    let title_id = title_id(&world);
    let mut ctx = world.lock().expect("context lock");
    let result = ctx.runtime.block_on(ctx.repository.delete(title_id));
    ctx.last_delete = Some(result);
}

fn copies_on_the_shelf(world: &SharedContext, available: u32, total: u32) {
    let ctx = world.lock().expect("context lock");
    let updated = ctx.last_update.as_ref().expect("update recorded");
    assert_eq!(updated.copies().total(), total);
    assert_eq!(updated.copies().available(), available);

    let stored = ctx
        .runtime
        .block_on(ctx.repository.find_by_id(updated.id()))
        .expect("title query")
        .expect("title exists");
    assert_eq!(stored, *updated);
}

#[then("deletion is refused because loans reference the title")]
fn deletion_is_refused(world: SharedContext) {
    let ctx = world.lock().expect("context lock");
    assert!(
        matches!(ctx.last_delete, Some(Err(CatalogueRepositoryError::InUse { .. }))),
        "expected InUse, got: {:?}",
        ctx.last_delete
    );
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[rstest]
#[case(5, 2, 3, 1)]
#[case(5, 2, 6, 4)]
#[case(5, 2, 1, 0)]
#[case(5, 0, 0, 0)]
#[case(2, 2, 2, 0)]
#[case(2_000_000_000, 0, 2_000_000_000, 2_000_000_000)]
#[case(2_147_483_647, 1, 2_147_483_647, 2_147_483_646)]
#[case(3, 1, 2_147_483_647, 2_147_483_646)]
fn total_edits_shift_availability_within_bounds(
    catalogue_world: Option<SharedContext>,
    #[case] initial: u32,
    #[case] borrowed: u32,
    #[case] new_total: u32,
    #[case] expected_available: u32,
) {
    let Some(world) = catalogue_world else {
        eprintln!("SKIP-TEST-CLUSTER: total_edits_shift_availability_within_bounds skipped");
        return;
    };

    a_catalogued_title(&world, initial);
    members_borrow_the_title(&world, borrowed);
    the_total_is_set(&world, new_total);
    copies_on_the_shelf(&world, expected_available, new_total);
}

#[rstest]
fn titles_with_loans_cannot_be_deleted(catalogue_world: Option<SharedContext>) {
    let Some(world) = catalogue_world else {
        eprintln!("SKIP-TEST-CLUSTER: titles_with_loans_cannot_be_deleted skipped");
        return;
    };

    a_catalogued_title(&world, 1);
    members_borrow_the_title(&world, 1);
    the_repository_deletes_the_title(world.clone());
    deletion_is_refused(world);
}

#[rstest]
fn unlent_titles_delete_once(catalogue_world: Option<SharedContext>) {
    let Some(world) = catalogue_world else {
        eprintln!("SKIP-TEST-CLUSTER: unlent_titles_delete_once skipped");
        return;
    };

    a_catalogued_title(&world, 3);
    the_repository_deletes_the_title(world.clone());
    {
        let ctx = world.lock().expect("context lock");
        assert!(matches!(ctx.last_delete, Some(Ok(true))));
    }
    the_repository_deletes_the_title(world.clone());
    let ctx = world.lock().expect("context lock");
    assert!(matches!(ctx.last_delete, Some(Ok(false))));
}

#[rstest]
fn listing_is_ordered_by_name(catalogue_world: Option<SharedContext>) {
    let Some(world) = catalogue_world else {
        eprintln!("SKIP-TEST-CLUSTER: listing_is_ordered_by_name skipped");
        return;
    };

    let ctx = world.lock().expect("context lock");
    for name in ["Wonder", "Coraline", "Matilda"] {
        ctx.runtime
            .block_on(ctx.catalogue.create(NewTitle {
                details: details(name),
                total: 1,
            }))
            .expect("title created");
    }
    let titles = ctx
        .runtime
        .block_on(ctx.catalogue.list())
        .expect("catalogue readable");
    let names: Vec<_> = titles.iter().map(|title| title.details().name()).collect();
    assert_eq!(names, vec!["Coraline", "Matilda", "Wonder"]);
}

#[rstest]
fn unknown_titles_are_not_found(catalogue_world: Option<SharedContext>) {
    let Some(world) = catalogue_world else {
        eprintln!("SKIP-TEST-CLUSTER: unknown_titles_are_not_found skipped");
        return;
    };

    let ctx = world.lock().expect("context lock");
    let err = ctx
        .runtime
        .block_on(ctx.catalogue.get(TitleId::random()))
        .expect_err("no such title");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
fn missing_schema_is_a_query_error(catalogue_world: Option<SharedContext>) {
    let Some(world) = catalogue_world else {
        eprintln!("SKIP-TEST-CLUSTER: missing_schema_is_a_query_error skipped");
        return;
    };

    let ctx = world.lock().expect("context lock");
    execute_sql(&ctx.database_url, "DROP TABLE loans; DROP TABLE titles;")
        .expect("drop tables");
    let result = ctx.runtime.block_on(ctx.repository.list());
    assert!(
        matches!(result, Err(CatalogueRepositoryError::Query { .. })),
        "expected Query error, got: {result:?}"
    );
}
