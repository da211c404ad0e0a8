//! Cross-session progression: completed levels, unlocks, and meta upgrades.
//!
//! Unlocks only ever grow. Re-syncing from the high-water mark adds whatever
//! the mark entitles the player to and never removes anything.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use rampart_core::constants::*;
use rampart_core::enums::*;
use rampart_core::error::Rejection;
use rampart_core::events::RewardSummary;
use rampart_core::types::{BuildId, GridCell};

use crate::persistence::{self, KeyValueStore, StoreError};
use crate::upgrades::MetaProgress;

/// Campaign progression document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignProgress {
    pub completed: BTreeSet<u32>,
    /// Highest global level the player may select.
    pub unlocked_level: u32,
    /// Obstacle cells cleared per global level.
    #[serde(default)]
    pub cleared_obstacles: BTreeMap<u32, BTreeSet<GridCell>>,
}

impl Default for CampaignProgress {
    fn default() -> Self {
        Self {
            completed: BTreeSet::new(),
            unlocked_level: 1,
            cleared_obstacles: BTreeMap::new(),
        }
    }
}

/// Feature-unlocks document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureUnlocks {
    pub towers: BTreeSet<TowerType>,
    pub abilities: BTreeSet<AbilityKind>,
    #[serde(default)]
    pub custom_builds: bool,
    #[serde(default)]
    pub final_boss_mode: bool,
    /// Saved module compositions by build id.
    #[serde(default)]
    pub builds: BTreeMap<u32, Vec<ModuleKind>>,
}

impl Default for FeatureUnlocks {
    fn default() -> Self {
        Self {
            towers: BTreeSet::from([TowerType::Blaster]),
            abilities: BTreeSet::from([AbilityKind::Freeze]),
            custom_builds: false,
            final_boss_mode: false,
            builds: BTreeMap::new(),
        }
    }
}

/// Unlocks granted by a single sync.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnlockDelta {
    pub towers: Vec<TowerType>,
    pub abilities: Vec<AbilityKind>,
}

/// Owner of all persisted progression.
#[derive(Debug, Clone)]
pub struct ProgressionGate {
    meta: MetaProgress,
    campaign: CampaignProgress,
    unlocks: FeatureUnlocks,
    final_level: u32,
}

impl ProgressionGate {
    /// Fresh progression for a campaign with `final_level` levels.
    pub fn new(final_level: u32) -> Self {
        Self::from_documents(
            MetaProgress::default(),
            CampaignProgress::default(),
            FeatureUnlocks::default(),
            final_level,
        )
    }

    /// Load the three documents, recovering defaults for any that are corrupt.
    pub fn load(store: &dyn KeyValueStore, final_level: u32) -> Self {
        let meta = persistence::load(store, META_PROGRESS_KEY, MetaProgress::default());
        let campaign = persistence::load(store, CAMPAIGN_PROGRESS_KEY, CampaignProgress::default());
        let unlocks = persistence::load(store, FEATURE_UNLOCKS_KEY, FeatureUnlocks::default());
        Self::from_documents(meta, campaign, unlocks, final_level)
    }

    fn from_documents(
        meta: MetaProgress,
        mut campaign: CampaignProgress,
        mut unlocks: FeatureUnlocks,
        final_level: u32,
    ) -> Self {
        let final_level = final_level.max(1);

        // Saved progress may come from a larger campaign table.
        campaign.completed.retain(|l| (1..=final_level).contains(l));
        campaign
            .cleared_obstacles
            .retain(|l, _| (1..=final_level).contains(l));
        let earned = campaign
            .completed
            .iter()
            .map(|l| l + 1)
            .max()
            .unwrap_or(1);
        campaign.unlocked_level = campaign.unlocked_level.max(earned).clamp(1, final_level);
        unlocks.towers.insert(TowerType::Blaster);

        let mut gate = Self {
            meta,
            campaign,
            unlocks,
            final_level,
        };
        gate.sync_unlocks();
        gate
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        persistence::save(store, META_PROGRESS_KEY, &self.meta)?;
        persistence::save(store, CAMPAIGN_PROGRESS_KEY, &self.campaign)?;
        persistence::save(store, FEATURE_UNLOCKS_KEY, &self.unlocks)
    }

    pub fn meta(&self) -> &MetaProgress {
        &self.meta
    }

    pub fn campaign(&self) -> &CampaignProgress {
        &self.campaign
    }

    pub fn unlocks(&self) -> &FeatureUnlocks {
        &self.unlocks
    }

    pub fn final_level(&self) -> u32 {
        self.final_level
    }

    pub fn is_level_unlocked(&self, global: u32) -> bool {
        global >= 1 && global <= self.campaign.unlocked_level
    }

    pub fn is_tower_unlocked(&self, tower: TowerType) -> bool {
        self.unlocks.towers.contains(&tower)
    }

    pub fn is_ability_unlocked(&self, ability: AbilityKind) -> bool {
        self.unlocks.abilities.contains(&ability)
    }

    pub fn custom_builds_unlocked(&self) -> bool {
        self.unlocks.custom_builds
    }

    pub fn final_boss_unlocked(&self) -> bool {
        self.unlocks.final_boss_mode
    }

    pub fn meta_level(&self, track: MetaTrack) -> u32 {
        self.meta.level(track)
    }

    pub fn upgrade_points(&self) -> u32 {
        self.meta.upgrade_points
    }

    pub fn bank_upgrade_points(&mut self, points: u32) {
        self.meta.upgrade_points += points;
    }

    /// Grant everything the high-water mark entitles the player to.
    pub fn sync_unlocks(&mut self) -> UnlockDelta {
        let mark = self.campaign.unlocked_level;
        let mut delta = UnlockDelta::default();

        let entitled = (mark as usize).min(TOWER_UNLOCK_ORDER.len());
        for tower in &TOWER_UNLOCK_ORDER[..entitled] {
            if self.unlocks.towers.insert(*tower) {
                delta.towers.push(*tower);
            }
        }
        for (ability, threshold) in ABILITY_UNLOCKS {
            if mark >= threshold && self.unlocks.abilities.insert(ability) {
                delta.abilities.push(ability);
            }
        }
        if mark >= CUSTOM_BUILDS_UNLOCK_LEVEL {
            self.unlocks.custom_builds = true;
        }
        if self.campaign.completed.contains(&self.final_level) {
            self.unlocks.final_boss_mode = true;
        }
        delta
    }

    /// Record a completed level and grant its rewards.
    pub fn complete_level(&mut self, global: u32) -> RewardSummary {
        let first_completion = self.campaign.completed.insert(global);
        let next = (global + 1).min(self.final_level);
        self.campaign.unlocked_level = self.campaign.unlocked_level.max(next);
        self.meta.upgrade_points += LEVEL_REWARD_POINTS;
        self.meta.banked_credits += LEVEL_REWARD_CREDITS;

        let mut unlocked_tower = None;
        if first_completion {
            unlocked_tower = TOWER_UNLOCK_ORDER
                .iter()
                .copied()
                .find(|t| !self.unlocks.towers.contains(t));
            if let Some(tower) = unlocked_tower {
                self.unlocks.towers.insert(tower);
            }
        }

        let had_final_boss = self.unlocks.final_boss_mode;
        let delta = self.sync_unlocks();
        let unlocked_tower = unlocked_tower.or_else(|| delta.towers.first().copied());
        let final_boss_unlocked = !had_final_boss && self.unlocks.final_boss_mode;

        info!(
            level = global,
            first_completion,
            unlocked_level = self.campaign.unlocked_level,
            final_boss_unlocked,
            "level_completed"
        );

        RewardSummary {
            credits: LEVEL_REWARD_CREDITS,
            upgrade_points: LEVEL_REWARD_POINTS,
            first_completion,
            unlocked_tower,
            unlocked_abilities: delta.abilities,
            final_boss_unlocked,
        }
    }

    pub fn banked_credits(&self) -> u32 {
        self.meta.banked_credits
    }

    /// Withdraw every banked completion credit. The bank is empty afterwards.
    pub fn take_banked_credits(&mut self) -> u32 {
        std::mem::take(&mut self.meta.banked_credits)
    }

    /// Buy a meta upgrade. Returns the new level and the points spent.
    pub fn purchase_meta(&mut self, track: MetaTrack) -> Result<(u32, u32), Rejection> {
        self.meta.purchase(track)
    }

    pub fn record_cleared_obstacle(&mut self, global: u32, cell: GridCell) {
        self.campaign
            .cleared_obstacles
            .entry(global)
            .or_default()
            .insert(cell);
    }

    pub fn cleared_obstacles(&self, global: u32) -> BTreeSet<GridCell> {
        self.campaign
            .cleared_obstacles
            .get(&global)
            .cloned()
            .unwrap_or_default()
    }

    /// Store a module composition. Callers validate the modules first.
    pub fn save_build(&mut self, modules: Vec<ModuleKind>) -> BuildId {
        let id = self
            .unlocks
            .builds
            .keys()
            .next_back()
            .map(|last| last + 1)
            .unwrap_or(1);
        self.unlocks.builds.insert(id, modules);
        BuildId(id)
    }

    pub fn build(&self, id: BuildId) -> Option<&[ModuleKind]> {
        self.unlocks.builds.get(&id.0).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn fresh_progression_has_first_level_and_blaster() {
        let gate = ProgressionGate::new(20);
        assert!(gate.is_level_unlocked(1));
        assert!(!gate.is_level_unlocked(2));
        assert!(!gate.is_level_unlocked(0));
        assert!(gate.is_tower_unlocked(TowerType::Blaster));
        assert!(!gate.is_tower_unlocked(TowerType::Frost));
        assert!(gate.is_ability_unlocked(AbilityKind::Freeze));
        assert!(!gate.is_ability_unlocked(AbilityKind::Nuclear));
        assert!(!gate.custom_builds_unlocked());
    }

    #[test]
    fn completion_raises_mark_and_unlocks_next_tower() {
        let mut gate = ProgressionGate::new(20);
        let reward = gate.complete_level(1);
        assert!(reward.first_completion);
        assert_eq!(reward.unlocked_tower, Some(TowerType::Frost));
        assert_eq!(reward.upgrade_points, 2);
        assert_eq!(gate.upgrade_points(), 2);
        assert!(gate.is_level_unlocked(2));

        // Replaying grants points but no new tower.
        let replay = gate.complete_level(1);
        assert!(!replay.first_completion);
        assert_eq!(replay.unlocked_tower, None);
        assert_eq!(gate.upgrade_points(), 4);
    }

    #[test]
    fn completion_credits_are_banked_until_taken() {
        let mut gate = ProgressionGate::new(20);
        gate.complete_level(1);
        gate.complete_level(1);
        assert_eq!(gate.banked_credits(), 2 * LEVEL_REWARD_CREDITS);

        assert_eq!(gate.take_banked_credits(), 2 * LEVEL_REWARD_CREDITS);
        assert_eq!(gate.take_banked_credits(), 0);
    }

    #[test]
    fn banked_credits_survive_a_reload() {
        let mut store = MemoryStore::new();
        let mut gate = ProgressionGate::new(20);
        gate.complete_level(1);
        gate.save(&mut store).unwrap();

        let mut loaded = ProgressionGate::load(&store, 20);
        assert_eq!(loaded.take_banked_credits(), LEVEL_REWARD_CREDITS);
    }

    #[test]
    fn final_level_unlocks_final_boss_mode() {
        let mut gate = ProgressionGate::new(3);
        gate.complete_level(1);
        gate.complete_level(2);
        assert!(!gate.final_boss_unlocked());
        let reward = gate.complete_level(3);
        assert!(reward.final_boss_unlocked);
        assert!(gate.final_boss_unlocked());
        assert_eq!(gate.campaign().unlocked_level, 3);
    }

    #[test]
    fn sync_never_revokes() {
        let mut gate = ProgressionGate::new(20);
        gate.unlocks.towers.insert(TowerType::Sniper);
        gate.unlocks.abilities.insert(AbilityKind::Nuclear);
        gate.sync_unlocks();
        assert!(gate.is_tower_unlocked(TowerType::Sniper));
        assert!(gate.is_ability_unlocked(AbilityKind::Nuclear));
    }

    #[test]
    fn mark_grants_abilities_by_threshold() {
        let mut gate = ProgressionGate::new(20);
        gate.campaign.unlocked_level = 5;
        let delta = gate.sync_unlocks();
        assert_eq!(delta.abilities, vec![AbilityKind::Poison, AbilityKind::Overclock]);
        assert!(gate.custom_builds_unlocked());
        assert_eq!(delta.towers.len(), 4);
    }

    #[test]
    fn save_and_load_round_trip() {
        let mut store = MemoryStore::new();
        let mut gate = ProgressionGate::new(20);
        gate.complete_level(1);
        gate.purchase_meta(MetaTrack::Damage).unwrap();
        gate.record_cleared_obstacle(2, GridCell::new(4, 4));
        let id = gate.save_build(vec![ModuleKind::Arc, ModuleKind::Cryo]);
        gate.save(&mut store).unwrap();

        let loaded = ProgressionGate::load(&store, 20);
        assert_eq!(loaded.meta_level(MetaTrack::Damage), 1);
        assert_eq!(loaded.upgrade_points(), 0);
        assert!(loaded.is_tower_unlocked(TowerType::Frost));
        assert!(loaded.cleared_obstacles(2).contains(&GridCell::new(4, 4)));
        assert_eq!(
            loaded.build(id),
            Some(&[ModuleKind::Arc, ModuleKind::Cryo][..])
        );
    }

    #[test]
    fn corrupt_documents_fall_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.write(CAMPAIGN_PROGRESS_KEY, "[1, 2").unwrap();
        store.write(META_PROGRESS_KEY, "null").unwrap();
        let gate = ProgressionGate::load(&store, 20);
        assert_eq!(gate.campaign(), &CampaignProgress::default());
        assert_eq!(gate.meta(), &MetaProgress::default());
        assert!(gate.is_tower_unlocked(TowerType::Blaster));
    }

    #[test]
    fn load_clamps_progress_to_table() {
        let mut store = MemoryStore::new();
        let saved = CampaignProgress {
            completed: BTreeSet::from([1, 2, 40]),
            unlocked_level: 41,
            cleared_obstacles: BTreeMap::new(),
        };
        persistence::save(&mut store, CAMPAIGN_PROGRESS_KEY, &saved).unwrap();
        let gate = ProgressionGate::load(&store, 10);
        assert_eq!(gate.campaign().unlocked_level, 10);
        assert!(!gate.campaign().completed.contains(&40));
    }

    #[test]
    fn build_ids_increase() {
        let mut gate = ProgressionGate::new(5);
        let a = gate.save_build(vec![ModuleKind::Beam, ModuleKind::Beam]);
        let b = gate.save_build(vec![ModuleKind::Kinetic, ModuleKind::Cryo]);
        assert_eq!(a, BuildId(1));
        assert_eq!(b, BuildId(2));
    }
}
