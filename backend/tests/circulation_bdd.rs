//! Behaviour tests for lending: duplicate borrows, contention for the last
//! copy, ownership on return and one-shot returns.
//!
//! Steps are synchronous and drive the engine through a runtime owned by the
//! world, over the in-memory library.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use mockable::DefaultClock;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use schoollib::domain::ports::{
    BorrowRequest, CatalogueRepository, CirculationCommand, CirculationStore, ReturnRequest,
};
use schoollib::domain::{
    Caller, CirculationError, CirculationService, CopyCounts, Loan, LoanId, LoanPeriod,
    LoanStatus, Role, Title, TitleDetails, TitleDetailsDraft, TitleId, UserId,
};
use schoollib::outbound::memory::InMemoryLibrary;
use tokio::runtime::Runtime;

type Outcome = Result<Loan, CirculationError>;

struct CirculationWorld {
    runtime: Runtime,
    library: InMemoryLibrary,
    engine: Arc<CirculationService<InMemoryLibrary>>,
    members: RefCell<HashMap<String, Caller>>,
    title_id: Cell<Option<TitleId>>,
    loan: RefCell<Option<Loan>>,
    borrows: RefCell<Vec<Outcome>>,
    returned: RefCell<Option<Outcome>>,
}

impl CirculationWorld {
    fn new() -> Self {
        let library = InMemoryLibrary::new();
        let engine = Arc::new(CirculationService::new(
            Arc::new(library.clone()),
            Arc::new(DefaultClock),
            LoanPeriod::default(),
        ));
        Self {
            runtime: Runtime::new().expect("tokio runtime"),
            library,
            engine,
            members: RefCell::new(HashMap::new()),
            title_id: Cell::new(None),
            loan: RefCell::new(None),
            borrows: RefCell::new(Vec::new()),
            returned: RefCell::new(None),
        }
    }

    fn member(&self, name: &str) -> Caller {
        self.members
            .borrow_mut()
            .entry(name.to_owned())
            .or_insert_with(|| Caller::new(UserId::random(), Role::Student))
            .clone()
    }

    fn title_id(&self) -> TitleId {
        self.title_id.get().expect("a title is on the shelf")
    }

    fn loan_id(&self) -> LoanId {
        self.loan.borrow().as_ref().expect("a loan was opened").id()
    }

    fn borrow(&self, name: &str) -> Outcome {
        let caller = self.member(name);
        let request = BorrowRequest {
            title_id: self.title_id(),
        };
        self.runtime.block_on(self.engine.borrow(&caller, request))
    }

    fn return_loan(&self, name: &str) -> Outcome {
        let caller = self.member(name);
        let request = ReturnRequest {
            loan_id: self.loan_id(),
        };
        self.runtime.block_on(self.engine.return_loan(&caller, request))
    }

    fn shelf(&self) -> CopyCounts {
        self.runtime
            .block_on(self.library.find_by_id(self.title_id()))
            .expect("title query")
            .expect("title exists")
            .copies()
    }

    fn last_borrow(&self) -> Outcome {
        self.borrows
            .borrow()
            .last()
            .cloned()
            .expect("a borrow was attempted")
    }

    fn last_return(&self) -> Outcome {
        self.returned
            .borrow()
            .clone()
            .expect("a return was attempted")
    }
}

#[fixture]
fn world() -> CirculationWorld {
    CirculationWorld::new()
}

#[given("a title whose shelf holds {copies}")]
fn a_title_whose_shelf_holds(world: &CirculationWorld, copies: u32) {
    let details = TitleDetails::new(TitleDetailsDraft {
        name: "The Westing Game".to_owned(),
        ..TitleDetailsDraft::default()
    })
    .expect("valid details");
    let title = Title::new(TitleId::random(), details, CopyCounts::fully_available(copies));
    world
        .runtime
        .block_on(world.library.insert(&title))
        .expect("title stored");
    world.title_id.set(Some(title.id()));
}

#[given("member {name} has borrowed the title")]
fn member_has_borrowed_the_title(world: &CirculationWorld, name: String) {
    let loan = world.borrow(&name).expect("borrow succeeds");
    assert_eq!(loan.status(), LoanStatus::Active);
    *world.loan.borrow_mut() = Some(loan);
}

#[given("member {name} has returned the loan")]
fn member_has_returned_the_loan(world: &CirculationWorld, name: String) {
    let loan = world.return_loan(&name).expect("return succeeds");
    assert_eq!(loan.status(), LoanStatus::Returned);
}

#[when("member {name} borrows the title")]
fn member_borrows_the_title(world: &CirculationWorld, name: String) {
    let outcome = world.borrow(&name);
    world.borrows.borrow_mut().push(outcome);
}

#[when("two members borrow the title at the same time")]
fn two_members_borrow_at_the_same_time(world: &CirculationWorld) {
    let title_id = world.title_id();
    let callers = [world.member("A"), world.member("B")];
    let outcomes = world.runtime.block_on(async {
        let attempts = callers.into_iter().map(|caller| {
            let engine = Arc::clone(&world.engine);
            tokio::spawn(async move { engine.borrow(&caller, BorrowRequest { title_id }).await })
        });
        join_all(attempts).await
    });
    world.borrows.borrow_mut().extend(
        outcomes
            .into_iter()
            .map(|outcome| outcome.expect("borrow task completes")),
    );
}

#[when("member {name} returns the loan")]
fn member_returns_the_loan(world: &CirculationWorld, name: String) {
    let outcome = world.return_loan(&name);
    *world.returned.borrow_mut() = Some(outcome);
}

#[then("the borrow fails because the title is already borrowed")]
fn the_borrow_fails_as_already_borrowed(world: &CirculationWorld) {
    assert_eq!(
        world.last_borrow(),
        Err(CirculationError::AlreadyBorrowed {
            title_id: world.title_id()
        })
    );
}

#[then("exactly one borrow succeeds and the other finds no stock")]
fn exactly_one_borrow_succeeds(world: &CirculationWorld) {
    let title_id = world.title_id();
    let borrows = world.borrows.borrow();
    let granted = borrows.iter().filter(|outcome| outcome.is_ok()).count();
    let refused = borrows
        .iter()
        .filter(|outcome| **outcome == Err(CirculationError::StockInsufficient { title_id }))
        .count();
    assert_eq!((granted, refused), (1, 1));
}

#[then("the return fails because the caller does not own the loan")]
fn the_return_fails_as_not_owner(world: &CirculationWorld) {
    assert_eq!(
        world.last_return(),
        Err(CirculationError::NotOwner {
            loan_id: world.loan_id()
        })
    );
}

#[then("the return fails because the loan is not active")]
fn the_return_fails_as_not_active(world: &CirculationWorld) {
    let outcome = world.last_return();
    assert!(
        matches!(
            outcome,
            Err(CirculationError::InvalidReturnState {
                status: LoanStatus::Returned,
                ..
            })
        ),
        "unexpected return outcome: {outcome:?}"
    );
}

#[then("the loan is recorded as returned")]
fn the_loan_is_recorded_as_returned(world: &CirculationWorld) {
    let loan_id = world.loan_id();
    let ledger = world
        .runtime
        .block_on(world.library.list_all_loans())
        .expect("ledger readable");
    let loan = ledger
        .iter()
        .find(|loan| loan.id() == loan_id)
        .expect("loan kept in the ledger");
    assert_eq!(loan.status(), LoanStatus::Returned);
    assert!(loan.returned_at().is_some());
}

#[then("the shelf holds {copies}")]
fn the_shelf_holds(world: &CirculationWorld, copies: u32) {
    let shelf = world.shelf();
    assert_eq!(shelf.available(), copies);
    assert!(shelf.available() <= shelf.total());
}

#[scenario(
    path = "tests/features/circulation.feature",
    name = "A member cannot hold two loans of the same title"
)]
fn a_member_cannot_hold_two_loans(world: CirculationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/circulation.feature",
    name = "Two members race for the last copy"
)]
fn two_members_race_for_the_last_copy(world: CirculationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/circulation.feature",
    name = "Only the borrower can return a loan"
)]
fn only_the_borrower_can_return(world: CirculationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/circulation.feature",
    name = "A loan is returned exactly once"
)]
fn a_loan_is_returned_exactly_once(world: CirculationWorld) {
    drop(world);
}
