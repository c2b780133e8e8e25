use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::assets::Skeleton;
use super::error::LookupError;
use crate::config::WeaponProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponState {
    Drawn,
    Sheathed,
}

/// Items parented to skeleton bones: item name to bone name.
#[derive(Debug, Default)]
pub struct ItemAttachments {
    items: HashMap<String, String>,
}

impl ItemAttachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parents `item` to `bone`. A missing bone is logged and the item stays
    /// where it was (or unattached).
    pub fn attach(&mut self, item: &str, bone: &str, skeleton: &Skeleton) -> Result<(), LookupError> {
        if let Err(err) = skeleton.bone(bone) {
            warn!(item, skeleton = %skeleton.name, error = %err, "attachment skipped");
            return Err(err);
        }
        debug!(item, bone, "item attached");
        self.items.insert(item.to_string(), bone.to_string());
        Ok(())
    }

    pub fn bone_of(&self, item: &str) -> Option<&str> {
        self.items.get(item).map(String::as_str)
    }

    pub fn weapon_state(&self, weapon: &WeaponProfile) -> Option<WeaponState> {
        match self.bone_of(&weapon.item)? {
            bone if bone == weapon.hand_bone => Some(WeaponState::Drawn),
            bone if bone == weapon.sheath_bone => Some(WeaponState::Sheathed),
            _ => None,
        }
    }

    /// Moves the weapon between hand and sheath. An unattached weapon is drawn.
    pub fn toggle_sheathe(&mut self, weapon: &WeaponProfile, skeleton: &Skeleton) -> Option<WeaponState> {
        let (bone, next) = match self.weapon_state(weapon) {
            Some(WeaponState::Drawn) => (&weapon.sheath_bone, WeaponState::Sheathed),
            _ => (&weapon.hand_bone, WeaponState::Drawn),
        };
        match self.attach(&weapon.item, bone, skeleton) {
            Ok(()) => Some(next),
            Err(_) => self.weapon_state(weapon),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::assets::Bone;
    use crate::game::constants::bones;

    fn skeleton(names: &[&str]) -> Skeleton {
        Skeleton {
            name: "rig".to_string(),
            bones: names
                .iter()
                .map(|n| Bone {
                    name: n.to_string(),
                    parent: None,
                })
                .collect(),
        }
    }

    fn sword() -> WeaponProfile {
        WeaponProfile {
            item: "sword".to_string(),
            hand_bone: bones::RIGHT_HAND.to_string(),
            sheath_bone: bones::SPINE.to_string(),
        }
    }

    #[test]
    fn test_toggle_moves_weapon_between_bones() {
        let rig = skeleton(&[bones::SPINE, bones::RIGHT_HAND]);
        let mut attachments = ItemAttachments::new();

        assert_eq!(attachments.toggle_sheathe(&sword(), &rig), Some(WeaponState::Drawn));
        assert_eq!(attachments.bone_of("sword"), Some(bones::RIGHT_HAND));

        assert_eq!(attachments.toggle_sheathe(&sword(), &rig), Some(WeaponState::Sheathed));
        assert_eq!(attachments.bone_of("sword"), Some(bones::SPINE));
        assert_eq!(attachments.toggle_sheathe(&sword(), &rig), Some(WeaponState::Drawn));
    }

    #[test]
    fn test_missing_bone_leaves_item_unattached() {
        let rig = skeleton(&[bones::SPINE]);
        let mut attachments = ItemAttachments::new();

        let err = attachments.attach("shield", bones::LEFT_HAND, &rig).unwrap_err();
        assert!(matches!(err, LookupError::Bone { .. }));
        assert!(attachments.bone_of("shield").is_none());
        assert_eq!(attachments.toggle_sheathe(&sword(), &rig), None);
    }

    #[test]
    fn test_missing_sheath_bone_keeps_weapon_in_hand() {
        let rig = skeleton(&[bones::RIGHT_HAND]);
        let mut attachments = ItemAttachments::new();
        attachments.attach("sword", bones::RIGHT_HAND, &rig).unwrap();

        assert_eq!(attachments.toggle_sheathe(&sword(), &rig), Some(WeaponState::Drawn));
        assert_eq!(attachments.bone_of("sword"), Some(bones::RIGHT_HAND));
    }
}
