use crate::errors::{RouteError, RouteResult};
use crate::logic::pools::SourceId;
use crate::utils::fixed_point::to_display_f64;
use alloy_primitives::utils::{Unit, parse_units};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A chain-local token: address on one source plus the metadata needed to present amounts.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Token {
    source_id: SourceId,
    address: Address,
    decimals: u8,
    symbol: Option<String>,
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source_id.hash(state);
        self.address.hash(state)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.source_id == other.source_id && self.address == other.address
    }
}

impl Eq for Token {}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.source_id, self.address).cmp(&(&other.source_id, other.address))
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Token {
    pub fn new(source_id: SourceId, address: Address) -> Token {
        Token { source_id, address, decimals: 18, symbol: None }
    }

    pub fn new_with_data(source_id: SourceId, address: Address, symbol: Option<String>, decimals: Option<u8>) -> Token {
        Token { source_id, address, symbol, decimals: decimals.unwrap_or(18) }
    }

    pub fn get_symbol(&self) -> String {
        self.symbol.clone().unwrap_or(self.address.to_string())
    }

    pub fn get_decimals(&self) -> u8 {
        self.decimals
    }

    pub fn get_source_id(&self) -> &SourceId {
        &self.source_id
    }

    pub fn get_exp(&self) -> U256 {
        if self.decimals == 18 { Unit::ETHER.wei() } else { U256::from(10).pow(U256::from(self.decimals)) }
    }

    pub fn get_address(&self) -> Address {
        self.address
    }

    /// Presentation-only conversion of a smallest-unit amount.
    ///
    /// Amounts too large for the u64 fast path go through decimal formatting instead.
    pub fn to_float(&self, value: U256) -> f64 {
        if self.decimals == 0 {
            return u64::try_from(value).map(|v| v as f64).unwrap_or_else(|_| to_display_f64(value, 0));
        }
        let divider = self.get_exp();
        let (div, rem) = value.div_rem(divider);

        match (u64::try_from(div), u64::try_from(rem)) {
            (Ok(div), Ok(rem)) => div as f64 + (rem as f64 / 10f64.powi(self.decimals as i32)),
            _ => to_display_f64(value, self.decimals),
        }
    }

    /// Parse a human amount such as `"4000.5"` into smallest units.
    pub fn parse_amount(&self, amount: &str) -> RouteResult<U256> {
        let trimmed = amount.trim();
        if trimmed.starts_with('-') {
            return Err(RouteError::invalid_config(format!("amount must not be negative: {amount}")));
        }
        parse_units(trimmed, self.decimals)
            .map(|parsed| parsed.get_absolute())
            .map_err(|e| RouteError::invalid_config(format!("invalid amount {amount:?}: {e}")))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn usdc() -> Token {
        Token::new_with_data(SourceId::from("flow"), Address::repeat_byte(0x0c), Some("USDC".to_string()), Some(6))
    }

    #[test]
    fn test_to_float() {
        let token = usdc();
        assert_eq!(token.to_float(U256::from(90_661u64)), 0.090661);
        assert_eq!(token.get_symbol(), "USDC");

        let unnamed = Token::new(SourceId::from("flow"), Address::repeat_byte(0x01));
        assert_eq!(unnamed.to_float(U256::from(10u64).pow(U256::from(18u64))), 1.0);
        assert_eq!(unnamed.get_symbol(), Address::repeat_byte(0x01).to_string());
    }

    #[test]
    fn test_to_float_beyond_u64() {
        let token = Token::new(SourceId::from("flow"), Address::repeat_byte(0x01));
        // 10^30 whole tokens; the quotient does not fit in a u64
        let huge = U256::from(10u64).pow(U256::from(48u64));
        let value = token.to_float(huge);
        assert!((value / 1e30 - 1.0).abs() < 1e-9);

        let raw = Token::new_with_data(SourceId::from("flow"), Address::ZERO, None, Some(0));
        assert!((raw.to_float(U256::from(u64::MAX) * U256::from(4u64)) / (u64::MAX as f64 * 4.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_amount() {
        let token = usdc();
        assert_eq!(token.parse_amount("1.25").unwrap(), U256::from(1_250_000u64));
        assert!(token.parse_amount("-3").is_err());
    }

    #[test]
    fn test_identity_includes_source() {
        let a = Token::new(SourceId::from("flow"), Address::repeat_byte(0x01));
        let b = Token::new(SourceId::from("base"), Address::repeat_byte(0x01));
        assert_ne!(a, b);
    }

    #[test]
    fn test_serialize() {
        let serialized = serde_json::to_string(&usdc()).unwrap();
        assert_eq!(
            serialized,
            "{\"source_id\":\"flow\",\"address\":\"0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c\",\"decimals\":6,\"symbol\":\"USDC\"}"
        );
    }
}
