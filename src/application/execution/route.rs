//! Protocol routing table for deposits and withdrawals.
//!
//! The set of supported protocols is closed. Anything not listed here is
//! rejected before a single chain call is made.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use crate::error::ExecutionError;

sol! {
    /// Aave v3 lending pool.
    interface IPool {
        function withdraw(address asset, uint256 amount, address to) external returns (uint256);
    }

    /// Fluid lending vault token.
    interface IFToken {
        function redeem(uint256 amount) external;
    }

    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// How capital leaves a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawRoute {
    /// `pool.withdraw(underlying, amount, recipient)`, amount in underlying
    /// decimals.
    LendingPool,
    /// `vaultToken.redeem(amount)`, amount in vault-token decimals.
    VaultRedeem,
}

impl WithdrawRoute {
    /// Look up the route for a protocol key (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::UnsupportedProtocol` for unlisted protocols.
    pub fn for_protocol(protocol_key: &str) -> Result<Self, ExecutionError> {
        match protocol_key.to_ascii_lowercase().as_str() {
            "aave" | "aavev3" => Ok(Self::LendingPool),
            "fluid" => Ok(Self::VaultRedeem),
            _ => Err(ExecutionError::UnsupportedProtocol {
                protocol: protocol_key.to_string(),
            }),
        }
    }
}

/// Deposits go through the transaction builder, but only into protocols we
/// can also withdraw from.
///
/// # Errors
///
/// Returns `ExecutionError::UnsupportedProtocol` for unlisted protocols.
pub fn ensure_depositable(protocol_key: &str) -> Result<(), ExecutionError> {
    WithdrawRoute::for_protocol(protocol_key).map(|_| ())
}

pub fn pool_withdraw_calldata(asset: Address, amount: U256, to: Address) -> Bytes {
    IPool::withdrawCall { asset, amount, to }.abi_encode().into()
}

pub fn vault_redeem_calldata(amount: U256) -> Bytes {
    IFToken::redeemCall { amount }.abi_encode().into()
}

pub fn allowance_calldata(owner: Address, spender: Address) -> Bytes {
    IERC20::allowanceCall { owner, spender }.abi_encode().into()
}

pub fn approve_calldata(spender: Address, amount: U256) -> Bytes {
    IERC20::approveCall { spender, amount }.abi_encode().into()
}

/// Decode the return data of an `allowance` call.
///
/// # Errors
///
/// Returns `ExecutionError::TransactionBuild` if the data is malformed.
pub fn decode_allowance(data: &[u8]) -> Result<U256, ExecutionError> {
    IERC20::allowanceCall::abi_decode_returns(data)
        .map_err(|e| ExecutionError::TransactionBuild(format!("bad allowance response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_are_a_closed_table() {
        assert_eq!(
            WithdrawRoute::for_protocol("aavev3").unwrap(),
            WithdrawRoute::LendingPool
        );
        assert_eq!(
            WithdrawRoute::for_protocol("Aave").unwrap(),
            WithdrawRoute::LendingPool
        );
        assert_eq!(
            WithdrawRoute::for_protocol("fluid").unwrap(),
            WithdrawRoute::VaultRedeem
        );
        assert!(matches!(
            WithdrawRoute::for_protocol("radiant"),
            Err(ExecutionError::UnsupportedProtocol { protocol }) if protocol == "radiant"
        ));
        assert!(ensure_depositable("compound").is_err());
    }

    #[test]
    fn calldata_uses_function_selectors() {
        let withdraw = pool_withdraw_calldata(Address::ZERO, U256::from(5u8), Address::ZERO);
        assert_eq!(&withdraw[..4], IPool::withdrawCall::SELECTOR.as_slice());
        assert_eq!(withdraw.len(), 4 + 32 * 3);

        let redeem = vault_redeem_calldata(U256::from(5u8));
        assert_eq!(&redeem[..4], IFToken::redeemCall::SELECTOR.as_slice());
        assert_eq!(redeem.len(), 4 + 32);
    }

    #[test]
    fn decodes_allowance_word() {
        let mut word = [0u8; 32];
        word[31] = 42;
        assert_eq!(decode_allowance(&word).unwrap(), U256::from(42u8));
        assert!(decode_allowance(&[1, 2, 3]).is_err());
    }
}
