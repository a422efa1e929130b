//! Circulation engine: the borrow and return use cases over a
//! [`CirculationStore`](crate::domain::ports::CirculationStore).

mod error;
mod service;

pub use self::error::CirculationError;
pub use self::service::CirculationService;
