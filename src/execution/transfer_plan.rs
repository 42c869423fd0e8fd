use crate::logic::pools::SourceId;
use crate::logic::types::{AllocationEntry, PairSymbols};
use alloy_primitives::{Address, U256};
use serde::Serialize;
use strum_macros::Display;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum TransferDirection {
    /// Input moves from the execution source to a remote pool's source
    Outbound,
    /// Output comes back to the execution source
    Return,
}

/// One (source, amount) movement a multi-source route needs.
///
/// No wire format is implied; bridging collaborators decide how to carry it out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CrossChainTransfer {
    pub from_source: SourceId,
    pub to_source: SourceId,
    /// Logical symbol, or address when unresolved
    pub token: String,
    /// Token address on the remote source
    pub remote_token: Address,
    pub amount: U256,
    pub direction: TransferDirection,
}

/// Transfers needed to realize `entries`, aggregated per remote source.
///
/// Each remote source gets one outbound transfer of the input it swaps and one return
/// transfer of the output it is expected to produce, in order of first appearance.
/// Local entries need no transfer.
pub fn derive_transfers(execution_source: &SourceId, entries: &[AllocationEntry], symbols: &PairSymbols) -> Vec<CrossChainTransfer> {
    struct Leg<'a> {
        source_id: &'a SourceId,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        amount_out: U256,
    }

    let mut legs: Vec<Leg<'_>> = Vec::new();
    for entry in entries.iter().filter(|e| e.source_id() != execution_source) {
        match legs.iter_mut().find(|leg| leg.source_id == entry.source_id()) {
            Some(leg) => {
                leg.amount_in = leg.amount_in.saturating_add(entry.amount_allocated);
                leg.amount_out = leg.amount_out.saturating_add(entry.expected_output);
            }
            None => legs.push(Leg {
                source_id: entry.source_id(),
                token_in: entry.pool.token_in(),
                token_out: entry.pool.token_out(),
                amount_in: entry.amount_allocated,
                amount_out: entry.expected_output,
            }),
        }
    }

    let mut transfers = Vec::with_capacity(legs.len() * 2);
    for leg in legs {
        transfers.push(CrossChainTransfer {
            from_source: execution_source.clone(),
            to_source: leg.source_id.clone(),
            token: symbols.display_in.clone(),
            remote_token: leg.token_in,
            amount: leg.amount_in,
            direction: TransferDirection::Outbound,
        });
        transfers.push(CrossChainTransfer {
            from_source: leg.source_id.clone(),
            to_source: execution_source.clone(),
            token: symbols.display_out.clone(),
            remote_token: leg.token_out,
            amount: leg.amount_out,
            direction: TransferDirection::Return,
        });
    }
    transfers
}
