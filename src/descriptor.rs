/*
 * Creature Descriptor Module
 *
 * A descriptor is the configuration one control panel sends for one creature:
 * which model to load, its hue, its size, its starting rotation and the
 * morph-target blend per mesh. Panels send numbers as strings more often than
 * not, so color and size accept both.
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

// Morph state captured for one mesh: target name -> slot, and the slot values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphBinding {
    pub dictionary: BTreeMap<String, usize>,
    pub influences: Vec<f32>,
}

impl MorphBinding {
    // Target names ordered by their slot index
    pub fn names_in_slot_order(&self) -> Vec<(&str, usize)> {
        let mut names: Vec<(&str, usize)> = self
            .dictionary
            .iter()
            .map(|(name, &slot)| (name.as_str(), slot))
            .collect();
        names.sort_by_key(|&(_, slot)| slot);
        names
    }

    pub fn influence_of(&self, name: &str) -> Option<f32> {
        self.dictionary
            .get(name)
            .and_then(|&slot| self.influences.get(slot).copied())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureDescriptor {
    pub model_path: String,

    #[serde(default, deserialize_with = "lenient_number")]
    pub color: Option<f32>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub size: Option<f32>,

    #[serde(default)]
    pub rotation: Rotation,

    #[serde(default)]
    pub morph_targets: BTreeMap<String, MorphBinding>,
}

impl CreatureDescriptor {
    pub fn new(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            color: None,
            size: None,
            rotation: Rotation::default(),
            morph_targets: BTreeMap::new(),
        }
    }

    pub fn with_color(mut self, hue: f32) -> Self {
        self.color = Some(hue);
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Rotation { x, y, z };
        self
    }

    // Record the morph blend for one mesh, slots numbered by position in `names`
    pub fn with_morph(mut self, mesh: impl Into<String>, names: &[&str], influences: &[f32]) -> Self {
        let dictionary = names
            .iter()
            .enumerate()
            .map(|(slot, name)| (name.to_string(), slot))
            .collect();
        self.morph_targets.insert(
            mesh.into(),
            MorphBinding {
                dictionary,
                influences: influences.to_vec(),
            },
        );
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    // Hue wrapped onto the 0..360 wheel, if the panel sent one
    pub fn hue(&self) -> Option<f32> {
        self.color
            .filter(|hue| hue.is_finite())
            .map(|hue| hue.rem_euclid(360.0))
    }

    // Requested size when it is usable as a scale
    pub fn valid_size(&self) -> Option<f32> {
        self.size.filter(|size| size.is_finite() && *size > 0.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

// Accept `12.5` and `"12.5"`; anything else counts as absent
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) => Some(n as f32),
        Some(NumberOrText::Text(text)) => text.trim().parse::<f32>().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_panel_payload_with_string_numbers() {
        let json = r#"{
            "color": "200",
            "size": "1.5",
            "modelPath": "/assets/modelo.glb",
            "morphTargets": {
                "Body": {
                    "dictionary": {"spiky": 0, "round": 1},
                    "influences": [0.2, 0.8]
                }
            },
            "position": {"x": 1, "y": 2, "z": 3},
            "rotation": {"x": 0.1, "y": 0.2, "z": 0.3}
        }"#;

        let descriptor = CreatureDescriptor::from_json(json).unwrap();
        assert_eq!(descriptor.model_path, "/assets/modelo.glb");
        assert_eq!(descriptor.color, Some(200.0));
        assert_eq!(descriptor.size, Some(1.5));
        assert_eq!(descriptor.rotation.y, 0.2);

        let body = &descriptor.morph_targets["Body"];
        assert_eq!(body.influence_of("round"), Some(0.8));
        assert_eq!(body.influence_of("missing"), None);
    }

    #[test]
    fn missing_and_garbage_fields_fall_back() {
        let descriptor =
            CreatureDescriptor::from_json(r#"{"modelPath": "a.glb", "size": "big", "color": null}"#)
                .unwrap();
        assert_eq!(descriptor.color, None);
        assert_eq!(descriptor.size, None);
        assert_eq!(descriptor.valid_size(), None);
        assert!(descriptor.morph_targets.is_empty());
        assert_eq!(descriptor.rotation, Rotation::default());
    }

    #[test]
    fn hue_wraps_onto_the_wheel() {
        assert_eq!(CreatureDescriptor::new("a").with_color(370.0).hue(), Some(10.0));
        assert_eq!(CreatureDescriptor::new("a").with_color(-30.0).hue(), Some(330.0));
        assert_eq!(CreatureDescriptor::new("a").hue(), None);
    }

    #[test]
    fn non_positive_size_is_not_valid() {
        assert_eq!(CreatureDescriptor::new("a").with_size(0.0).valid_size(), None);
        assert_eq!(CreatureDescriptor::new("a").with_size(-2.0).valid_size(), None);
        assert_eq!(CreatureDescriptor::new("a").with_size(0.5).valid_size(), Some(0.5));
    }

    #[test]
    fn slot_order_follows_dictionary_indices() {
        let mut binding = MorphBinding::default();
        binding.dictionary.insert("zeta".into(), 0);
        binding.dictionary.insert("alpha".into(), 1);
        let names: Vec<&str> = binding.names_in_slot_order().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
