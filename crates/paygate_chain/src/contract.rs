//! ABI encoding for the `PaymentGate` contract.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{SolCall, sol};

sol! {
    interface IPaymentGate {
        function setReceiverContract(address receiver) external;
    }
}

/// ABI-encode constructor arguments as they are appended to creation bytecode
/// (and as explorers expect them, minus the `0x`).
pub fn encode_constructor_args(args: &[DynSolValue]) -> Vec<u8> {
    if args.is_empty() {
        return Vec::new();
    }
    DynSolValue::Tuple(args.to_vec()).abi_encode_params()
}

/// Calldata for `setReceiverContract(receiver)`.
pub fn set_receiver_calldata(receiver: Address) -> Bytes {
    IPaymentGate::setReceiverContractCall { receiver }
        .abi_encode()
        .into()
}
