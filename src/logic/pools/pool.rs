use super::source_id::SourceId;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum_macros::{Display as StrumDisplay, EnumString};

/// One side of a two-reserve pool.
#[derive(Copy, Clone, Debug, StrumDisplay, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Canonical snapshot of one liquidity source on one chain.
///
/// Pools are produced by the depth tracker and never mutated afterwards; the
/// optimizer only ever reads them. Reserves are in each token's smallest unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub source_id: SourceId,
    pub pool_address: Address,
    pub token_a: Address,
    pub token_b: Address,
    pub reserve_a: U256,
    pub reserve_b: U256,
    pub decimals_a: u8,
    pub decimals_b: u8,
    /// Swap fee in basis points, `0..=10000`.
    pub fee_bps: u16,
    pub total_supply: U256,
    /// Total value locked, 18-decimal fixed-point USD, priced from the pool itself.
    pub tvl_usd: U256,
    /// Unix seconds of the poll that produced this record.
    pub last_update: u64,
    pub is_synthetic_fallback: bool,
    /// Reserves are vault totals (`totalProjectToken` / `totalUSDC`), not a paired pool.
    pub is_aggregated_vault: bool,
}

impl Pool {
    pub fn token(&self, side: Side) -> Address {
        match side {
            Side::A => self.token_a,
            Side::B => self.token_b,
        }
    }

    pub fn reserve(&self, side: Side) -> U256 {
        match side {
            Side::A => self.reserve_a,
            Side::B => self.reserve_b,
        }
    }

    pub fn decimals(&self, side: Side) -> u8 {
        match side {
            Side::A => self.decimals_a,
            Side::B => self.decimals_b,
        }
    }

    /// Side holding `token`, if the pool holds it at all.
    pub fn side_of(&self, token: Address) -> Option<Side> {
        if self.token_a == token {
            Some(Side::A)
        } else if self.token_b == token {
            Some(Side::B)
        } else {
            None
        }
    }

    /// `(reserve_in, reserve_out)` for a swap that pays in on `input_side`.
    pub fn oriented_reserves(&self, input_side: Side) -> (U256, U256) {
        (self.reserve(input_side), self.reserve(input_side.opposite()))
    }

    pub fn has_liquidity(&self) -> bool {
        !self.reserve_a.is_zero() && !self.reserve_b.is_zero()
    }

    pub fn is_empty(&self) -> bool {
        self.reserve_a.is_zero() && self.reserve_b.is_zero()
    }

    /// Equality on everything except `last_update`.
    pub fn same_state(&self, other: &Pool) -> bool {
        Pool { last_update: other.last_update, ..self.clone() } == *other
    }
}

impl Display for Pool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}(fee={}bps", self.pool_address, self.source_id, self.fee_bps)?;
        if self.is_synthetic_fallback {
            write!(f, ", synthetic")?;
        }
        if self.is_aggregated_vault {
            write!(f, ", vault")?;
        }
        write!(f, ")")
    }
}
