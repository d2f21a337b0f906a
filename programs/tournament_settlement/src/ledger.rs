use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettlementError};
use crate::state::Address;

/// Claimable balance of one account, split by origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub prize: u64,
    pub refund: u64,
}

impl Credit {
    pub fn total(&self) -> u64 {
        self.prize + self.refund
    }
}

/// Custody of entry fees. Funds leave the vault only through [`EscrowLedger::claim`];
/// every other operation moves value between the unallocated pool and
/// per-account credits.
///
/// Invariant: `vault == unallocated + sum(claimable)`.
#[derive(Debug, Clone, Default)]
pub struct EscrowLedger {
    vault: u64,
    total_prize_pool: u64,
    unallocated: u64,
    claimable: IndexMap<Address, Credit>,
    total_paid: u64,
}

impl EscrowLedger {
    pub fn vault(&self) -> u64 {
        self.vault
    }

    /// Entry fees of currently registered participants; frozen once the
    /// tournament settles.
    pub fn total_prize_pool(&self) -> u64 {
        self.total_prize_pool
    }

    /// Part of the pool not yet credited to anyone.
    pub fn unallocated(&self) -> u64 {
        self.unallocated
    }

    pub fn total_paid(&self) -> u64 {
        self.total_paid
    }

    pub fn credit(&self, account: &Address) -> Credit {
        self.claimable.get(account).copied().unwrap_or_default()
    }

    pub fn claimable(&self, account: &Address) -> u64 {
        self.credit(account).total()
    }

    pub fn outstanding(&self) -> u64 {
        self.claimable.values().map(Credit::total).sum()
    }

    pub(crate) fn capture_fee(&mut self, amount: u64) -> Result<()> {
        self.vault = checked_add(self.vault, amount)?;
        self.total_prize_pool = checked_add(self.total_prize_pool, amount)?;
        self.unallocated = checked_add(self.unallocated, amount)?;
        Ok(())
    }

    /// Withdrawal before the start: the fee leaves the pool and becomes a
    /// refund credit.
    pub(crate) fn refund_withdrawal(&mut self, account: Address, amount: u64) -> Result<()> {
        self.total_prize_pool = checked_sub(self.total_prize_pool, amount)?;
        self.unallocated = checked_sub(self.unallocated, amount)?;
        let credit = self.claimable.entry(account).or_default();
        credit.refund = checked_add(credit.refund, amount)?;
        Ok(())
    }

    pub(crate) fn allocate_refund(&mut self, account: Address, amount: u64) -> Result<()> {
        self.unallocated = checked_sub(self.unallocated, amount)?;
        let credit = self.claimable.entry(account).or_default();
        credit.refund = checked_add(credit.refund, amount)?;
        Ok(())
    }

    pub(crate) fn allocate_prize(&mut self, account: Address, amount: u64) -> Result<()> {
        self.unallocated = checked_sub(self.unallocated, amount)?;
        let credit = self.claimable.entry(account).or_default();
        credit.prize = checked_add(credit.prize, amount)?;
        Ok(())
    }

    /// Zeroes the account's balance and releases it from the vault.
    pub(crate) fn claim(&mut self, account: &Address) -> Result<Credit> {
        let credit = self.credit(account);
        let amount = credit.total();
        if amount == 0 {
            return Err(SettlementError::NoBalanceToClaim);
        }
        if self.vault < amount {
            return Err(SettlementError::InsufficientVaultBalance {
                needed: amount,
                available: self.vault,
            });
        }
        self.vault -= amount;
        self.total_paid = checked_add(self.total_paid, amount)?;
        self.claimable.shift_remove(account);
        Ok(credit)
    }

    pub fn check_conservation(&self) -> Result<()> {
        let accounted = checked_add(self.unallocated, self.outstanding())?;
        if accounted != self.vault {
            return Err(SettlementError::ConservationViolated(format!(
                "vault {} != unallocated {} + claimable {}",
                self.vault,
                self.unallocated,
                self.outstanding()
            )));
        }
        Ok(())
    }
}

fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(SettlementError::ArithmeticOverflow)
}

fn checked_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or_else(|| {
        SettlementError::ConservationViolated(format!("cannot release {} from {}", b, a))
    })
}
