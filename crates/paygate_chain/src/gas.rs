use std::fmt::Write as _;

use alloy_primitives::U256;
use alloy_primitives::utils::format_ether;
use serde::Serialize;

use crate::client::TxReceipt;

/// One transaction's line in the gas report.
#[derive(Debug, Clone, Serialize)]
pub struct GasEntry {
    pub label: String,
    pub gas_used: u64,
    pub effective_gas_price: u128,
}

impl GasEntry {
    pub fn fee_wei(&self) -> U256 {
        U256::from(self.gas_used) * U256::from(self.effective_gas_price)
    }
}

/// Gas consumed by the transactions of one deployment run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GasReport {
    entries: Vec<GasEntry>,
}

impl GasReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: impl Into<String>, receipt: &TxReceipt) {
        self.entries.push(GasEntry {
            label: label.into(),
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
        });
    }

    pub fn entries(&self) -> &[GasEntry] {
        &self.entries
    }

    pub fn total_gas(&self) -> u64 {
        self.entries.iter().map(|e| e.gas_used).sum()
    }

    pub fn total_fee_wei(&self) -> U256 {
        self.entries.iter().map(GasEntry::fee_wei).fold(U256::ZERO, |acc, fee| acc + fee)
    }

    /// Plain-text table of every recorded transaction plus a total row.
    pub fn render(&self, native_symbol: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<16} {:>12} {:>14} {:>24}",
            "transaction", "gas used", "price (gwei)", format!("fee ({native_symbol})")
        );
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "{:<16} {:>12} {:>14.3} {:>24}",
                entry.label,
                entry.gas_used,
                entry.effective_gas_price as f64 / 1e9,
                format_ether(entry.fee_wei())
            );
        }
        let _ = writeln!(
            out,
            "{:<16} {:>12} {:>14} {:>24}",
            "total",
            self.total_gas(),
            "",
            format_ether(self.total_fee_wei())
        );
        out
    }
}
