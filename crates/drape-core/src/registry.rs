//! Named mask presets per garment side.
//!
//! Names are unique within one registry, compared case-insensitively
//! after trimming. Every mutating operation either succeeds completely or
//! leaves the registry untouched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::geometry;
use crate::types::{GarmentSide, GeometryError, Mask, PixelMask, Viewport};

/// A mask snapshot saved under a user-chosen name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMask {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub mask: Mask,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("a saved mask named {0:?} already exists")]
    NameCollision(String),

    #[error("saved mask name is empty")]
    EmptyName,

    #[error("no saved mask with id {0}")]
    UnknownId(Uuid),

    #[error("saved mask id {0} appears more than once")]
    DuplicateId(Uuid),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Saved masks for one garment side, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaskRegistry {
    masks: Vec<SavedMask>,
}

impl MaskRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self { masks: Vec::new() }
    }

    /// Rebuild a registry from persisted entries, re-checking ids and
    /// names.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] found: an empty name, a name
    /// collision or a repeated id.
    pub fn from_saved(saved: Vec<SavedMask>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for entry in saved {
            if registry.get(entry.id).is_some() {
                return Err(RegistryError::DuplicateId(entry.id));
            }
            let name = registry.check_name(&entry.name, None)?;
            registry.masks.push(SavedMask {
                name,
                mask: entry.mask.with_clamped_skew(),
                ..entry
            });
        }
        Ok(registry)
    }

    /// Save `mask` under `name` with a fresh id. Skews are clamped to
    /// `±MAX_SKEW_DEG` before storing.
    ///
    /// # Errors
    ///
    /// [`RegistryError::EmptyName`] for a blank name,
    /// [`RegistryError::NameCollision`] if another saved mask already has
    /// this name ignoring case.
    pub fn add(&mut self, mask: Mask, name: &str) -> Result<&SavedMask, RegistryError> {
        let name = self.check_name(name, None)?;
        let id = Uuid::new_v4();
        tracing::debug!(%id, name = %name, "saving mask");
        let index = self.masks.len();
        self.masks.push(SavedMask {
            id,
            name,
            mask: mask.with_clamped_skew(),
        });
        Ok(&self.masks[index])
    }

    /// Give the mask `id` a new name.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownId`] if `id` is not saved here; otherwise
    /// the same name errors as [`Self::add`], where renaming to the
    /// mask's own name (in any case) is allowed.
    pub fn rename(&mut self, id: Uuid, name: &str) -> Result<&SavedMask, RegistryError> {
        let index = self.index_of(id)?;
        let name = self.check_name(name, Some(id))?;
        tracing::debug!(%id, name = %name, "renaming mask");
        self.masks[index].name = name;
        Ok(&self.masks[index])
    }

    /// Remove the mask `id`, returning it if it existed.
    pub fn delete(&mut self, id: Uuid) -> Option<SavedMask> {
        let index = self.index_of(id).ok()?;
        tracing::debug!(%id, "deleting mask");
        Some(self.masks.remove(index))
    }

    /// Denormalize the saved mask `id` for `viewport`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownId`] if `id` is not saved here,
    /// [`RegistryError::Geometry`] if the viewport has no area.
    pub fn apply(&self, id: Uuid, viewport: Viewport) -> Result<PixelMask, RegistryError> {
        let saved = self.get(id).ok_or(RegistryError::UnknownId(id))?;
        Ok(geometry::to_pixel(&saved.mask, viewport)?)
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&SavedMask> {
        self.masks.iter().find(|m| m.id == id)
    }

    /// Look up a saved mask by name, ignoring case.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&SavedMask> {
        let wanted = fold(name);
        self.masks.iter().find(|m| fold(&m.name) == wanted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedMask> {
        self.masks.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.masks.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    fn index_of(&self, id: Uuid) -> Result<usize, RegistryError> {
        self.masks
            .iter()
            .position(|m| m.id == id)
            .ok_or(RegistryError::UnknownId(id))
    }

    /// Validate `name`, ignoring the entry `except`. Returns the trimmed
    /// name to store.
    fn check_name(&self, name: &str, except: Option<Uuid>) -> Result<String, RegistryError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let wanted = fold(trimmed);
        let taken = self
            .masks
            .iter()
            .any(|m| Some(m.id) != except && fold(&m.name) == wanted);
        if taken {
            return Err(RegistryError::NameCollision(trimmed.to_owned()));
        }
        Ok(trimmed.to_owned())
    }
}

fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}

impl<'a> IntoIterator for &'a MaskRegistry {
    type Item = &'a SavedMask;
    type IntoIter = std::slice::Iter<'a, SavedMask>;

    fn into_iter(self) -> Self::IntoIter {
        self.masks.iter()
    }
}

impl Serialize for MaskRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.masks.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MaskRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let saved = Vec::<SavedMask>::deserialize(deserializer)?;
        Self::from_saved(saved).map_err(serde::de::Error::custom)
    }
}

/// Saved masks for both sides of one garment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GarmentMasks {
    pub front: MaskRegistry,
    pub back: MaskRegistry,
}

impl GarmentMasks {
    #[must_use]
    pub const fn side(&self, side: GarmentSide) -> &MaskRegistry {
        match side {
            GarmentSide::Front => &self.front,
            GarmentSide::Back => &self.back,
        }
    }

    pub const fn side_mut(&mut self, side: GarmentSide) -> &mut MaskRegistry {
        match side {
            GarmentSide::Front => &mut self.front,
            GarmentSide::Back => &mut self.back,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn chest() -> Mask {
        Mask {
            x: 0.3,
            y: 0.2,
            width: 0.4,
            height: 0.3,
            rotation: 5.0,
            skew_x: 0.0,
            skew_y: 0.0,
        }
    }

    fn pocket() -> Mask {
        Mask {
            x: 0.6,
            y: 0.25,
            width: 0.1,
            height: 0.1,
            rotation: 0.0,
            skew_x: 10.0,
            skew_y: 0.0,
        }
    }

    #[test]
    fn duplicate_name_is_rejected_and_original_kept() {
        let mut registry = MaskRegistry::new();
        let first = registry.add(chest(), "Chest").unwrap().clone();

        let err = registry.add(pocket(), "chest").unwrap_err();
        assert_eq!(err, RegistryError::NameCollision("chest".to_owned()));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(first.id), Some(&first));
        assert_eq!(registry.get(first.id).unwrap().mask, chest());
    }

    #[test]
    fn surrounding_whitespace_does_not_make_names_distinct() {
        let mut registry = MaskRegistry::new();
        registry.add(chest(), "Chest").unwrap();
        assert!(matches!(
            registry.add(pocket(), "  CHEST "),
            Err(RegistryError::NameCollision(_))
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut registry = MaskRegistry::new();
        assert_eq!(registry.add(chest(), "   "), Err(RegistryError::EmptyName));
        assert!(registry.is_empty());
    }

    #[test]
    fn names_are_stored_trimmed() {
        let mut registry = MaskRegistry::new();
        let saved = registry.add(chest(), "  Chest  ").unwrap();
        assert_eq!(saved.name, "Chest");
    }

    #[test]
    fn rename_to_own_name_in_other_case_is_allowed() {
        let mut registry = MaskRegistry::new();
        let id = registry.add(chest(), "Chest").unwrap().id;
        assert_eq!(registry.rename(id, "CHEST").unwrap().name, "CHEST");
    }

    #[test]
    fn rename_collision_leaves_both_untouched() {
        let mut registry = MaskRegistry::new();
        registry.add(chest(), "Chest").unwrap();
        let id = registry.add(pocket(), "Pocket").unwrap().id;

        assert!(matches!(
            registry.rename(id, "chest"),
            Err(RegistryError::NameCollision(_))
        ));
        assert_eq!(registry.get(id).unwrap().name, "Pocket");
        assert!(registry.find_by_name("CHEST").is_some());
    }

    #[test]
    fn rename_unknown_id() {
        let mut registry = MaskRegistry::new();
        let id = Uuid::new_v4();
        assert_eq!(
            registry.rename(id, "Chest"),
            Err(RegistryError::UnknownId(id))
        );
    }

    #[test]
    fn delete_frees_the_name() {
        let mut registry = MaskRegistry::new();
        let id = registry.add(chest(), "Chest").unwrap().id;
        let removed = registry.delete(id).unwrap();
        assert_eq!(removed.name, "Chest");
        assert!(registry.delete(id).is_none());
        assert!(registry.add(pocket(), "chest").is_ok());
    }

    #[test]
    fn apply_denormalizes() {
        let mut registry = MaskRegistry::new();
        let id = registry.add(chest(), "Chest").unwrap().id;
        let pixel = registry.apply(id, Viewport::new(1000.0, 500.0)).unwrap();
        assert!((pixel.x - 300.0).abs() < 1e-9);
        assert!((pixel.y - 100.0).abs() < 1e-9);
        assert!((pixel.width - 400.0).abs() < 1e-9);
        assert!((pixel.height - 150.0).abs() < 1e-9);
        assert!((pixel.rotation - 5.0).abs() < 1e-9);
    }

    #[test]
    fn apply_on_empty_viewport_is_geometry_error() {
        let mut registry = MaskRegistry::new();
        let id = registry.add(chest(), "Chest").unwrap().id;
        assert!(matches!(
            registry.apply(id, Viewport::new(0.0, 500.0)),
            Err(RegistryError::Geometry(_))
        ));
    }

    #[test]
    fn sides_are_independent() {
        let mut masks = GarmentMasks::default();
        masks.side_mut(GarmentSide::Front).add(chest(), "Logo").unwrap();
        assert!(masks.side_mut(GarmentSide::Back).add(pocket(), "logo").is_ok());
        assert_eq!(masks.side(GarmentSide::Front).len(), 1);
        assert_eq!(masks.side(GarmentSide::Back).len(), 1);
    }

    #[test]
    fn json_round_trip_uses_flat_entries() {
        let mut masks = GarmentMasks::default();
        masks.front.add(pocket(), "Pocket").unwrap();

        let json = serde_json::to_value(&masks).unwrap();
        let entry = &json["front"][0];
        assert_eq!(entry["name"], "Pocket");
        assert_eq!(entry["skewX"], 10.0);
        assert!(json["back"].as_array().unwrap().is_empty());

        let back: GarmentMasks = serde_json::from_value(json).unwrap();
        assert_eq!(back, masks);
    }

    #[test]
    fn deserialize_rejects_duplicate_names() {
        let json = r#"[
            {"id": "6f1c2a52-7b63-4d6e-9a36-3f5d1c6a0b11", "name": "Chest",
             "x": 0.1, "y": 0.1, "width": 0.2, "height": 0.2, "rotation": 0},
            {"id": "0b9e8f4e-1d7a-4c55-8f0e-2a6b9c3d4e5f", "name": "chest",
             "x": 0.5, "y": 0.5, "width": 0.2, "height": 0.2, "rotation": 0}
        ]"#;
        let err = serde_json::from_str::<MaskRegistry>(json).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn deserialize_accepts_missing_skews() {
        let json = r#"[{"id": "6f1c2a52-7b63-4d6e-9a36-3f5d1c6a0b11", "name": "Chest",
            "x": 0.1, "y": 0.1, "width": 0.2, "height": 0.2, "rotation": 12}]"#;
        let registry: MaskRegistry = serde_json::from_str(json).unwrap();
        let saved = registry.iter().next().unwrap();
        assert!((saved.mask.skew_x).abs() < f64::EPSILON);
        assert!((saved.mask.rotation - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stored_skew_is_clamped() {
        let mut registry = MaskRegistry::new();
        let tilted = Mask {
            skew_x: 89.0,
            skew_y: -90.0,
            ..chest()
        };
        let saved = registry.add(tilted, "Tilted").unwrap();
        assert!((saved.mask.skew_x - 75.0).abs() < f64::EPSILON);
        assert!((saved.mask.skew_y + 75.0).abs() < f64::EPSILON);

        let restored = MaskRegistry::from_saved(vec![SavedMask {
            id: Uuid::new_v4(),
            name: "Tilted".to_owned(),
            mask: tilted,
        }])
        .unwrap();
        let saved = restored.iter().next().unwrap();
        assert!((saved.mask.skew_x - 75.0).abs() < f64::EPSILON);
        assert!((saved.mask.skew_y + 75.0).abs() < f64::EPSILON);
    }
}
