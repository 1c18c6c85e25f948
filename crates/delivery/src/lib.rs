//! Push delivery — token validation, the transport boundary, chunked batch
//! dispatch with partial-failure isolation, receipt reconciliation, and the
//! token lifecycle operations.

pub mod dispatcher;
pub mod expo;
pub mod receipts;
pub mod registry;
pub mod token;
pub mod transport;

pub use dispatcher::{BatchDispatcher, DispatchReport};
pub use expo::ExpoTransport;
pub use receipts::ReceiptReconciler;
pub use registry::TokenRegistry;
pub use transport::{MemoryTransport, PushTransport};
