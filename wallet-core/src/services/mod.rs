//! Service layer - session lifecycle, synchronization and transfers
//!
//! Services coordinate domain state transitions and port interactions.
//! `history` and `resolver` are pure; the rest share one `ClientState`.

pub mod history;
pub mod logging;
pub mod poller;
pub mod refresh;
pub mod resolver;
pub mod session;
pub mod transfer;

pub use history::{view, HistoryFilter, HistorySort};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use poller::{PollingScheduler, DEFAULT_POLL_INTERVAL};
pub use refresh::{RefreshFailure, RefreshMode, RefreshReport, SharedState, SnapshotRefresher, SnapshotSource};
pub use resolver::resolve_address;
pub use session::SessionManager;
pub use transfer::{TransferCoordinator, TransferReceipt, GAS_LIMIT, GAS_PRICE_WEI};
