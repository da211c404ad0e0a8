//! Per-session economy: money, lives, score, and upgrade points.
//!
//! Spending is precondition-checked so money never goes negative.

use rampart_core::constants::*;
use rampart_core::enums::EnemyRank;
use rampart_core::error::Rejection;
use rampart_core::state::EconomyState;

/// Money awarded for killing an enemy of the given rank.
pub fn kill_bounty(rank: EnemyRank) -> u32 {
    if rank.is_boss() {
        BOSS_KILL_REWARD
    } else {
        KILL_REWARD
    }
}

/// Lives lost when an enemy of the given rank reaches the exit.
pub fn leak_penalty(rank: EnemyRank) -> u32 {
    if rank.is_boss() {
        BOSS_LEAK_PENALTY
    } else {
        LEAK_PENALTY
    }
}

/// Cost to upgrade a tower currently at `level`.
pub fn tower_upgrade_cost(level: u32) -> u32 {
    UPGRADE_COST_PER_LEVEL * level
}

/// Money returned for selling a tower that cost `placement_cost`.
pub fn sell_refund(placement_cost: u32) -> u32 {
    (placement_cost as f64 * SELL_REFUND_RATIO).floor() as u32
}

/// Starting money after Economy meta upgrades.
pub fn starting_money(base: u32, economy_level: u32) -> u32 {
    base + ECONOMY_MONEY_PER_LEVEL * economy_level
}

/// Starting lives after Fortitude meta upgrades.
pub fn starting_lives(base: u32, fortitude_level: u32) -> u32 {
    base + FORTITUDE_LIVES_PER_LEVEL * fortitude_level
}

/// Ledger for a single session.
#[derive(Debug, Clone, Default)]
pub struct EconomyLedger {
    state: EconomyState,
}

impl EconomyLedger {
    pub fn new(money: u32, lives: u32) -> Self {
        Self {
            state: EconomyState {
                money,
                lives: lives as i32,
                score: 0,
                upgrade_points: 0,
            },
        }
    }

    pub fn state(&self) -> &EconomyState {
        &self.state
    }

    pub fn money(&self) -> u32 {
        self.state.money
    }

    pub fn lives(&self) -> i32 {
        self.state.lives
    }

    pub fn is_defeated(&self) -> bool {
        self.state.lives <= 0
    }

    /// Check that `cost` can be paid without spending it.
    pub fn ensure_affordable(&self, cost: u32) -> Result<(), Rejection> {
        if self.state.money < cost {
            return Err(Rejection::InsufficientFunds {
                needed: cost,
                available: self.state.money,
            });
        }
        Ok(())
    }

    pub fn spend(&mut self, cost: u32) -> Result<(), Rejection> {
        self.ensure_affordable(cost)?;
        self.state.money -= cost;
        Ok(())
    }

    pub fn credit(&mut self, amount: u32) {
        self.state.money = self.state.money.saturating_add(amount);
    }

    /// Pay out a kill. Returns the bounty.
    pub fn award_kill(&mut self, rank: EnemyRank) -> u32 {
        let bounty = kill_bounty(rank);
        self.credit(bounty);
        self.state.score += bounty as u64;
        if rank.is_boss() {
            self.state.upgrade_points += BOSS_UPGRADE_POINTS;
        }
        bounty
    }

    /// Charge a leak. Returns the lives lost.
    pub fn record_leak(&mut self, rank: EnemyRank) -> u32 {
        let penalty = leak_penalty(rank);
        self.state.lives -= penalty as i32;
        penalty
    }

    pub fn record_wave_cleared(&mut self, wave: u32) {
        self.state.score += WAVE_CLEAR_SCORE * wave as u64;
    }

    /// Hand over upgrade points earned this session for banking.
    pub fn take_upgrade_points(&mut self) -> u32 {
        std::mem::take(&mut self.state.upgrade_points)
    }
}
