//! Round-domain logic for the eggvote service.
//!
//! Pure policy lives here, away from storage and HTTP: snapshot ordering and
//! winner rules, the daily close schedule, the clock seam, and the client
//! for the external tokenization collaborator.

pub mod clock;
pub mod outcome;
pub mod schedule;
pub mod tokenizer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use outcome::{ranked, total_votes, winner};
pub use schedule::CloseSchedule;
pub use tokenizer::{
    DispatchError, HttpTokenizer, NullTokenizer, TokenizationRequest, Tokenizer,
};
