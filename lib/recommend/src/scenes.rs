use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tastematch_core::{Error, Result};

/// Scene label -> item names, produced by an offline classification job.
///
/// Used only to annotate results after retrieval. Names match
/// case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct SceneTable {
    scenes: BTreeMap<String, Vec<String>>,
    by_name: AHashMap<String, Vec<String>>,
}

impl From<BTreeMap<String, Vec<String>>> for SceneTable {
    fn from(scenes: BTreeMap<String, Vec<String>>) -> Self {
        let mut by_name: AHashMap<String, Vec<String>> = AHashMap::new();
        // BTreeMap order keeps each name's labels sorted
        for (scene, names) in &scenes {
            for name in names {
                let labels = by_name.entry(name.trim().to_lowercase()).or_default();
                if !labels.contains(scene) {
                    labels.push(scene.clone());
                }
            }
        }
        Self { scenes, by_name }
    }
}

impl From<SceneTable> for BTreeMap<String, Vec<String>> {
    fn from(table: SceneTable) -> Self {
        table.scenes
    }
}

impl SceneTable {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Scene labels for an item name, sorted; empty if unlisted.
    pub fn scenes_for(&self, name: &str) -> Vec<String> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn names(&self, scene: &str) -> Option<&[String]> {
        self.scenes.get(scene).map(Vec::as_slice)
    }

    pub fn scene_labels(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "friend": ["Alpha", "Gamma"],
        "dating": ["alpha"],
        "family": []
    }"#;

    #[test]
    fn test_scenes_for_name() {
        let table = SceneTable::from_json_str(TABLE).unwrap();
        assert_eq!(table.scenes_for("ALPHA"), vec!["dating", "friend"]);
        assert_eq!(table.scenes_for("Gamma"), vec!["friend"]);
        assert!(table.scenes_for("Beta").is_empty());
    }

    #[test]
    fn test_labels_and_names() {
        let table = SceneTable::from_json_str(TABLE).unwrap();
        let labels: Vec<&str> = table.scene_labels().collect();
        assert_eq!(labels, vec!["dating", "family", "friend"]);
        assert_eq!(table.names("family"), Some(&[][..]));
        assert!(table.names("professional").is_none());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            SceneTable::from_json_str("[1, 2]"),
            Err(Error::Serialization(_))
        ));
    }
}
