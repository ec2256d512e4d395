//! Market-state engine for the Agora simulator.
//!
//! Three concerns live here:
//! - `model`: roster generation and the periodic bounded-random-walk
//!   revaluation (pure functions over instrument lists)
//! - `impact`: the market-impact engine that moves one instrument's price
//!   in response to a single trade
//! - `clock`: revaluation-grid arithmetic and the cancellable scheduler
//!   task that drives periodic revaluation

pub mod clock;
pub mod impact;
pub mod model;

pub use clock::{next_grid_instant, ClockError, RevaluationHandler, RevaluationScheduler};
pub use impact::apply_impact;
pub use model::{generate_roster, revalue, VOLUME_FLOOR};
