use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rampart_core::constants::META_UPGRADE_BASE_COST;
use rampart_core::enums::MetaTrack;
use rampart_core::error::Rejection;

/// Cost to raise a meta track from `current_level` to the next level.
pub fn meta_upgrade_cost(current_level: u32) -> u32 {
    META_UPGRADE_BASE_COST + current_level
}

/// Permanent upgrades and the upgrade points available to buy them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaProgress {
    pub upgrade_points: u32,
    #[serde(default)]
    pub levels: BTreeMap<MetaTrack, u32>,
    /// Level-completion credits waiting for the next session's starting money.
    #[serde(default)]
    pub banked_credits: u32,
}

impl MetaProgress {
    pub fn level(&self, track: MetaTrack) -> u32 {
        self.levels.get(&track).copied().unwrap_or(0)
    }

    /// Buy one level of a track. Returns the new level and the points spent.
    pub fn purchase(&mut self, track: MetaTrack) -> Result<(u32, u32), Rejection> {
        let current = self.level(track);
        let cost = meta_upgrade_cost(current);
        if self.upgrade_points < cost {
            return Err(Rejection::InsufficientUpgradePoints {
                needed: cost,
                available: self.upgrade_points,
            });
        }
        self.upgrade_points -= cost;
        self.levels.insert(track, current + 1);
        Ok((current + 1, cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_grows_with_level() {
        assert_eq!(meta_upgrade_cost(0), 2);
        assert_eq!(meta_upgrade_cost(3), 5);
    }

    #[test]
    fn purchase_spends_points_and_raises_level() {
        let mut meta = MetaProgress {
            upgrade_points: 5,
            ..Default::default()
        };
        assert_eq!(meta.purchase(MetaTrack::Damage), Ok((1, 2)));
        assert_eq!(meta.purchase(MetaTrack::Damage), Ok((2, 3)));
        assert_eq!(meta.upgrade_points, 0);
        assert_eq!(meta.level(MetaTrack::Damage), 2);
        assert_eq!(meta.level(MetaTrack::Economy), 0);
    }

    #[test]
    fn purchase_without_points_is_rejected() {
        let mut meta = MetaProgress {
            upgrade_points: 1,
            ..Default::default()
        };
        assert_eq!(
            meta.purchase(MetaTrack::Fortitude),
            Err(Rejection::InsufficientUpgradePoints {
                needed: 2,
                available: 1
            })
        );
        assert_eq!(meta.upgrade_points, 1);
        assert_eq!(meta.level(MetaTrack::Fortitude), 0);
    }

    #[test]
    fn tracks_serialize_as_map_keys() {
        let mut meta = MetaProgress::default();
        meta.levels.insert(MetaTrack::Economy, 3);
        let json = serde_json::to_string(&meta).unwrap();
        let back: MetaProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }
}
