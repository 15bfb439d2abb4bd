use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entity::{GameObject, ObjectReference};
use crate::error::{CoreError, CoreResult};
use crate::ordered::OrderedMap;
use crate::value::null_as_default;

/// A converted save file.
///
/// Only `levels` feeds the world index. The other blocks are kept so a
/// decoded document can be inspected or written back out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveDocument {
    /// Save metadata.
    pub header: Header,
    /// Levels in document order, keyed by level name.
    pub levels: OrderedMap<Level>,
    /// Save name as written by the converter.
    pub name: String,
    /// Grid hash block.
    pub grid_hash: GridHash,
    /// Spatial grids keyed by grid name.
    pub grids: OrderedMap<Grid>,
    /// Compression parameters of the original save.
    pub compression_info: CompressionInfo,
    /// World data the converter could not attribute to a level.
    #[serde(deserialize_with = "null_as_default")]
    pub unresolved_world_save_data: Vec<ObjectReference>,
}

impl SaveDocument {
    /// Decode a document from JSON text.
    pub fn from_json_str(source: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Decode a document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Read and decode a document from disk.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    /// Every object across all levels, in document order.
    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.levels.values().flat_map(|level| level.objects.iter())
    }
}

/// Save metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Header {
    /// Game build the save was written by.
    pub build_version: i64,
    /// Consistency hash of the save.
    pub consistency_hash_bytes: ConsistencyHash,
    /// Whether creative mode was enabled.
    pub creative_mode_enabled: bool,
    /// Editor object version.
    pub f_editor_object_version: i64,
    /// Whether the save was written with mods loaded.
    #[serde(
        deserialize_with = "deserialize_bool_int",
        serialize_with = "serialize_bool_int"
    )]
    pub is_modded_save: bool,
    /// Map the session plays on.
    pub map_name: String,
    /// Map URL options.
    pub map_options: String,
    /// Whether world partition is enabled.
    pub partition_enabled_flag: bool,
    /// Total play time.
    pub play_duration_seconds: i64,
    /// Mod metadata as written by the mod loader.
    pub raw_mod_metadata_string: String,
    /// When the save was written.
    #[serde(
        deserialize_with = "deserialize_unix_timestamp",
        serialize_with = "chrono::serde::ts_seconds_option::serialize"
    )]
    pub save_date_time: Option<DateTime<Utc>>,
    /// Header format revision.
    pub save_header_type: i64,
    /// Unique save identifier.
    pub save_identifier: String,
    /// Name of the save slot.
    pub save_name: String,
    /// Save format version.
    pub save_version: i64,
    /// Name of the session.
    pub session_name: String,
    /// Session visibility setting.
    pub session_visibility: i64,
}

/// Consistency hash of a save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsistencyHash {
    /// Whether the hash was computed.
    pub is_valid: bool,
    /// Hash bytes.
    pub hash: Vec<i64>,
}

/// One level of the world and the objects saved in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Level {
    /// Level name.
    pub name: String,
    /// Objects in document order.
    #[serde(deserialize_with = "null_as_default")]
    pub objects: Vec<GameObject>,
    /// Collectables already picked up in this level.
    #[serde(deserialize_with = "null_as_default")]
    pub collectables: Vec<Collectable>,
    /// Per-level save version.
    pub save_custom_version: i64,
}

/// A collected pickup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Collectable {
    /// Path of the collected object.
    pub path_name: String,
}

/// Grid hash block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridHash {
    /// Hash format version.
    pub version: i64,
    /// First hash.
    pub hash1: Vec<i64>,
    /// Second hash.
    pub hash2: Vec<i64>,
}

/// A spatial grid: cell size and per-cell hashes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Grid {
    /// Cell edge length. Zero for grids that do not record one.
    pub cell_size: i64,
    /// Cell name to cell hash.
    pub children: OrderedMap<i64>,
}

/// Compression parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressionInfo {
    /// Chunk header version.
    pub chunk_header_version: i64,
    /// Package file tag.
    pub package_file_tag: i64,
    /// Largest uncompressed chunk.
    pub max_uncompressed_chunk_content_size: i64,
    /// Compression algorithm id.
    pub compression_algorithm: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrText {
    Int(i64),
    Text(String),
}

/// Timestamps are Unix seconds, written either as a number or a string.
/// Values past 1e12 are milliseconds.
fn deserialize_unix_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<IntOrText>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let mut seconds = match raw {
        IntOrText::Int(n) => n,
        IntOrText::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|e| D::Error::custom(format!("invalid timestamp \"{text}\": {e}")))?,
    };
    if seconds > 1_000_000_000_000 {
        seconds /= 1000;
    }
    DateTime::from_timestamp(seconds, 0)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {seconds}")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrInt {
    Bool(bool),
    Int(i64),
}

fn deserialize_bool_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match BoolOrInt::deserialize(deserializer)? {
        BoolOrInt::Bool(b) => b,
        BoolOrInt::Int(n) => n != 0,
    })
}

fn serialize_bool_int<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(i64::from(*value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_header_timestamps_in_both_forms() {
        let from_text: Header =
            serde_json::from_value(json!({ "saveDateTime": "1700000000" })).unwrap();
        let from_millis: Header =
            serde_json::from_value(json!({ "saveDateTime": 1_700_000_000_000i64 })).unwrap();
        let expected = DateTime::from_timestamp(1_700_000_000, 0);
        assert_eq!(from_text.save_date_time, expected);
        assert_eq!(from_millis.save_date_time, expected);
    }

    #[test]
    fn invalid_timestamp_fails_the_header() {
        let result = serde_json::from_value::<Header>(json!({ "saveDateTime": "yesterday" }));
        assert!(result.is_err());
    }

    #[test]
    fn modded_flag_accepts_integers() {
        let header: Header = serde_json::from_value(json!({ "isModdedSave": 1 })).unwrap();
        assert!(header.is_modded_save);
        let out = serde_json::to_value(&header).unwrap();
        assert_eq!(out["isModdedSave"], 1);
    }

    #[test]
    fn levels_keep_document_order() {
        let doc = SaveDocument::from_json_str(
            r#"{
                "header": { "saveName": "Factory" },
                "levels": {
                    "Zeta": { "name": "Zeta", "objects": [] },
                    "Alpha": { "name": "Alpha", "objects": [], "collectables": [ { "pathName": "Berry_1" } ] }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(doc.header.save_name, "Factory");
        assert_eq!(doc.levels.keys().collect::<Vec<_>>(), ["Zeta", "Alpha"]);
        assert_eq!(doc.levels.get("Alpha").map(|l| l.collectables.len()), Some(1));
    }

    #[test]
    fn metadata_blocks_decode() {
        let doc = SaveDocument::from_json_str(
            r#"{
                "gridHash": { "version": 1, "hash1": [1, 2], "hash2": [3] },
                "grids": { "MainGrid": { "children": { "cell_0": 12345 } }, "FoliageGrid": { "cellSize": 256, "children": {} } },
                "compressionInfo": { "chunkHeaderVersion": 572662306, "packageFileTag": 2653586369, "maxUncompressedChunkContentSize": 131072, "compressionAlgorithm": 3 },
                "unresolvedWorldSaveData": [ { "levelName": "L", "pathName": "P" } ]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.grid_hash.hash1, [1, 2]);
        assert_eq!(doc.grids.get("FoliageGrid").map(|g| g.cell_size), Some(256));
        assert_eq!(
            doc.grids.get("MainGrid").and_then(|g| g.children.get("cell_0")),
            Some(&12345)
        );
        assert_eq!(doc.compression_info.compression_algorithm, 3);
        assert_eq!(doc.unresolved_world_save_data.len(), 1);
    }

    #[test]
    fn non_object_document_is_malformed() {
        assert!(matches!(
            SaveDocument::from_json_str("[1, 2, 3]"),
            Err(CoreError::Malformed(_))
        ));
        assert!(SaveDocument::from_json_str("{ \"levels\": ").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = SaveDocument::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
        assert!(err.to_string().contains("missing.json"));
    }
}
