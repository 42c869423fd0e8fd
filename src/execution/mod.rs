/// Execution Layer
///
/// Turns a selected route into the instructions downstream bridging and execution
/// components act on. Submission, signing and bridge protocols live outside this crate.
pub mod transfer_plan;

pub use transfer_plan::{CrossChainTransfer, TransferDirection, derive_transfers};
