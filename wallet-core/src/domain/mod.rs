//! Core domain entities
//!
//! All wallet entities are defined here. These are pure data structures
//! with their invariants - no I/O or external dependencies.

mod address;
mod session;
mod snapshot;
pub mod state;
mod transaction;
pub mod result;

pub use address::{is_valid_address, WalletAddress, ADDRESS_LEN};
pub use session::{Identity, Session, SessionId};
pub use snapshot::{WalletSnapshot, DEFAULT_BALANCE};
pub use state::{ActiveSession, ClientState, StateEvent};
pub use transaction::{Direction, Transaction};
