//! Hydrus API wire types
//!
//! Every field the server may omit depending on its version or the request
//! flags is optional here. Fields this crate does not model are kept in
//! `extra` so they survive normalization untouched.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

fn floor_secs<E: serde::de::Error>(value: f64) -> Result<Option<i64>, E> {
    if value.is_finite() {
        Ok(Some(value.floor() as i64))
    } else {
        Err(E::custom("non-finite timestamp"))
    }
}

/// Deserialize an epoch-seconds timestamp that might be an integer, a float,
/// a numeric string, or null.
///
/// Older servers send integers, newer ones send floats for sub-second precision.
fn deserialize_flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de;

    struct FlexibleTimestampVisitor;

    impl<'de> de::Visitor<'de> for FlexibleTimestampVisitor {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an integer, a float, a numeric string, or null")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Option<i64>, E> {
            i64::try_from(value)
                .map(Some)
                .map_err(|_| E::custom("timestamp out of range"))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Option<i64>, E> {
            Ok(Some(value))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Option<i64>, E> {
            floor_secs(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Option<i64>, E> {
            if let Ok(secs) = value.parse::<i64>() {
                return Ok(Some(secs));
            }
            let secs = value.parse::<f64>().map_err(E::custom)?;
            floor_secs(secs)
        }

        fn visit_none<E: de::Error>(self) -> Result<Option<i64>, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Option<i64>, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(FlexibleTimestampVisitor)
}

/// Service type as declared by the server's services object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum ServiceType {
    TagRepository,
    FileRepository,
    LocalFileDomain,
    LocalTag,
    LocalRatingNumerical,
    LocalRatingLike,
    RatingNumericalRepository,
    RatingLikeRepository,
    CombinedTag,
    CombinedFile,
    Ipfs,
    LocalFileTrashDomain,
    CombinedLocalFile,
    CombinedDeletedFile,
    LocalFileUpdateDomain,
    CombinedLocalMedia,
    LocalRatingIncDec,
    /// Any type this crate does not know about
    Other(u16),
}

impl From<u16> for ServiceType {
    fn from(value: u16) -> Self {
        match value {
            0 => ServiceType::TagRepository,
            1 => ServiceType::FileRepository,
            2 => ServiceType::LocalFileDomain,
            5 => ServiceType::LocalTag,
            6 => ServiceType::LocalRatingNumerical,
            7 => ServiceType::LocalRatingLike,
            8 => ServiceType::RatingNumericalRepository,
            9 => ServiceType::RatingLikeRepository,
            10 => ServiceType::CombinedTag,
            11 => ServiceType::CombinedFile,
            13 => ServiceType::Ipfs,
            14 => ServiceType::LocalFileTrashDomain,
            15 => ServiceType::CombinedLocalFile,
            19 => ServiceType::CombinedDeletedFile,
            20 => ServiceType::LocalFileUpdateDomain,
            21 => ServiceType::CombinedLocalMedia,
            22 => ServiceType::LocalRatingIncDec,
            other => ServiceType::Other(other),
        }
    }
}

impl From<ServiceType> for u16 {
    fn from(value: ServiceType) -> Self {
        match value {
            ServiceType::TagRepository => 0,
            ServiceType::FileRepository => 1,
            ServiceType::LocalFileDomain => 2,
            ServiceType::LocalTag => 5,
            ServiceType::LocalRatingNumerical => 6,
            ServiceType::LocalRatingLike => 7,
            ServiceType::RatingNumericalRepository => 8,
            ServiceType::RatingLikeRepository => 9,
            ServiceType::CombinedTag => 10,
            ServiceType::CombinedFile => 11,
            ServiceType::Ipfs => 13,
            ServiceType::LocalFileTrashDomain => 14,
            ServiceType::CombinedLocalFile => 15,
            ServiceType::CombinedDeletedFile => 19,
            ServiceType::LocalFileUpdateDomain => 20,
            ServiceType::CombinedLocalMedia => 21,
            ServiceType::LocalRatingIncDec => 22,
            ServiceType::Other(other) => other,
        }
    }
}

impl ServiceType {
    pub fn is_numerical_rating(&self) -> bool {
        matches!(
            self,
            ServiceType::LocalRatingNumerical | ServiceType::RatingNumericalRepository
        )
    }

    pub fn is_like_rating(&self) -> bool {
        matches!(
            self,
            ServiceType::LocalRatingLike | ServiceType::RatingLikeRepository
        )
    }

    pub fn is_incdec_rating(&self) -> bool {
        matches!(self, ServiceType::LocalRatingIncDec)
    }
}

/// A single entry of the services object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Display name chosen by the user
    pub name: String,
    /// Declared service type
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    /// Human-readable type, e.g. "local like/dislike rating service"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_pretty: Option<String>,
    /// Star shape for rating services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_shape: Option<String>,
    /// Minimum stars (numerical ratings only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stars: Option<u32>,
    /// Maximum stars (numerical ratings only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stars: Option<u32>,
}

/// Service key to service descriptor mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceDirectory(HashMap<String, ServiceInfo>);

impl ServiceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, service_key: &str) -> Option<&ServiceInfo> {
        self.0.get(service_key)
    }

    pub fn insert(&mut self, service_key: impl Into<String>, info: ServiceInfo) {
        self.0.insert(service_key.into(), info);
    }

    /// Fold another directory into this one, later entries winning
    pub fn merge(&mut self, other: ServiceDirectory) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Presence of a file in one file service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFileServiceEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub service_type: Option<ServiceType>,
    #[serde(default)]
    pub type_pretty: Option<String>,
    /// Import time in epoch seconds
    #[serde(default, deserialize_with = "deserialize_flexible_timestamp")]
    pub time_imported: Option<i64>,
    /// Delete time in epoch seconds (deleted services only)
    #[serde(default, deserialize_with = "deserialize_flexible_timestamp")]
    pub time_deleted: Option<i64>,
}

/// Current and deleted file service presence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFileServices {
    #[serde(default)]
    pub current: BTreeMap<String, RawFileServiceEntry>,
    #[serde(default)]
    pub deleted: BTreeMap<String, RawFileServiceEntry>,
}

/// Per-service tags as returned by modern servers.
///
/// Tag maps are keyed by status number as a string ("0" current, "1" pending,
/// "2" deleted, "3" petitioned).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTagService {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub service_type: Option<ServiceType>,
    #[serde(default)]
    pub type_pretty: Option<String>,
    #[serde(default)]
    pub storage_tags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub display_tags: BTreeMap<String, Vec<String>>,
}

/// Service key -> status -> tags, used by servers before the `tags` object
pub type LegacyTagMap = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// A file record exactly as the file_metadata endpoint returns it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFileRecord {
    /// Null for hashes the server has never seen
    #[serde(default)]
    pub file_id: Option<u64>,
    pub hash: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub filetype_human: Option<String>,
    #[serde(default)]
    pub filetype_enum: Option<u32>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub thumbnail_width: Option<u32>,
    #[serde(default)]
    pub thumbnail_height: Option<u32>,
    /// Duration in milliseconds
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub num_frames: Option<u64>,
    #[serde(default)]
    pub num_words: Option<u64>,
    #[serde(default)]
    pub has_audio: Option<bool>,
    #[serde(default)]
    pub blurhash: Option<String>,
    #[serde(default)]
    pub is_inbox: Option<bool>,
    #[serde(default)]
    pub is_local: Option<bool>,
    #[serde(default)]
    pub is_trashed: Option<bool>,
    #[serde(default)]
    pub is_deleted: Option<bool>,
    #[serde(default)]
    pub file_services: Option<RawFileServices>,
    #[serde(default, deserialize_with = "deserialize_flexible_timestamp")]
    pub time_modified: Option<i64>,
    #[serde(default)]
    pub known_urls: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, RawTagService>>,
    #[serde(default)]
    pub service_keys_to_statuses_to_tags: Option<LegacyTagMap>,
    #[serde(default)]
    pub service_keys_to_statuses_to_display_tags: Option<LegacyTagMap>,
    #[serde(default)]
    pub has_exif: Option<bool>,
    #[serde(default)]
    pub has_human_readable_embedded_metadata: Option<bool>,
    #[serde(default)]
    pub has_icc_profile: Option<bool>,
    /// Service key -> raw rating value
    #[serde(default)]
    pub ratings: Option<BTreeMap<String, Value>>,
    /// Anything else the server sent
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Response from the file_metadata endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataResponse {
    #[serde(default)]
    pub metadata: Vec<RawFileRecord>,
    /// Absent on servers that predate the services object
    #[serde(default)]
    pub services: ServiceDirectory,
}

/// Response from the api_version endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVersion {
    pub version: u32,
    #[serde(default)]
    pub hydrus_version: Option<u32>,
}

/// Which files a request is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSelector {
    FileIds(Vec<u64>),
    Hashes(Vec<String>),
}

impl FileSelector {
    pub fn len(&self) -> usize {
        match self {
            FileSelector::FileIds(ids) => ids.len(),
            FileSelector::Hashes(hashes) => hashes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flags recognised by the file_metadata endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataOptions {
    pub only_return_identifiers: bool,
    pub only_return_basic_information: bool,
    pub detailed_url_information: bool,
    pub include_notes: bool,
}

impl MetadataOptions {
    /// Options for filling the basic-file cache
    pub fn basic() -> Self {
        Self {
            only_return_basic_information: true,
            ..Self::default()
        }
    }

    /// Options for full records including notes
    pub fn full() -> Self {
        Self {
            include_notes: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_basic_record() {
        let json = r#"{
            "file_id": 7,
            "hash": "ad6d3599a6c489a575eb19c026face97a9cd6579e74728b0ce94a601d232f3c3",
            "size": 63405,
            "mime": "image/jpeg",
            "filetype_human": "jpeg",
            "filetype_enum": 1,
            "ext": ".jpg",
            "width": 640,
            "height": 480,
            "duration": null,
            "num_frames": null,
            "num_words": null,
            "has_audio": false
        }"#;
        let raw: RawFileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(raw.file_id, Some(7));
        assert_eq!(raw.mime.as_deref(), Some("image/jpeg"));
        assert_eq!(raw.width, Some(640));
        assert_eq!(raw.duration, None);
        assert!(raw.file_services.is_none());
        assert!(raw.extra.is_empty());
    }

    #[test]
    fn test_deserialize_identifiers_only() {
        // only_return_identifiers drops everything but id and hash
        let json = r#"{"file_id": 3, "hash": "abcd"}"#;
        let raw: RawFileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(raw.file_id, Some(3));
        assert_eq!(raw.size, None);
        assert_eq!(raw.mime, None);
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let json = r#"{
            "file_id": 1,
            "hash": "abcd",
            "pixel_hash": "beef",
            "original_mime": "image/png"
        }"#;
        let raw: RawFileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(raw.extra.get("pixel_hash"), Some(&Value::from("beef")));
        assert_eq!(raw.extra.get("original_mime"), Some(&Value::from("image/png")));
    }

    #[test]
    fn test_flexible_timestamps() {
        let json = r#"{
            "file_id": 1,
            "hash": "abcd",
            "time_modified": "1600000000",
            "file_services": {
                "current": {
                    "a": {"name": "my files", "type": 2, "time_imported": 1600000000.75},
                    "b": {"time_imported": 1500000000},
                    "c": {"time_imported": null}
                },
                "deleted": {
                    "d": {"time_imported": 10, "time_deleted": "20"}
                }
            }
        }"#;
        let raw: RawFileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(raw.time_modified, Some(1_600_000_000));
        let services = raw.file_services.unwrap();
        assert_eq!(services.current["a"].time_imported, Some(1_600_000_000));
        assert_eq!(
            services.current["a"].service_type,
            Some(ServiceType::LocalFileDomain)
        );
        assert_eq!(services.current["b"].time_imported, Some(1_500_000_000));
        assert_eq!(services.current["c"].time_imported, None);
        assert_eq!(services.deleted["d"].time_deleted, Some(20));
    }

    #[test]
    fn test_deserialize_metadata_response_with_services() {
        let json = r#"{
            "services": {
                "6c6f63616c2074616773": {"name": "my tags", "type": 5, "type_pretty": "local tag service"},
                "7374617273": {"name": "stars", "type": 6, "star_shape": "circle", "min_stars": 0, "max_stars": 5},
                "6e6577": {"name": "from the future", "type": 99}
            },
            "metadata": [{"file_id": 1, "hash": "abcd"}]
        }"#;
        let resp: MetadataResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.metadata.len(), 1);
        assert_eq!(resp.services.len(), 3);
        let stars = resp.services.get("7374617273").unwrap();
        assert!(stars.service_type.is_numerical_rating());
        assert_eq!(stars.max_stars, Some(5));
        assert_eq!(
            resp.services.get("6c6f63616c2074616773").unwrap().service_type,
            ServiceType::LocalTag
        );
        assert_eq!(
            resp.services.get("6e6577").unwrap().service_type,
            ServiceType::Other(99)
        );
    }

    #[test]
    fn test_unknown_hash_stub_decodes() {
        let json = r#"{
            "metadata": [
                {"file_id": 1, "hash": "aa", "mime": "image/png"},
                {"file_id": null, "hash": "ff"}
            ]
        }"#;
        let response: MetadataResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.metadata.len(), 2);
        assert_eq!(response.metadata[0].file_id, Some(1));
        assert_eq!(response.metadata[1].file_id, None);
        assert_eq!(response.metadata[1].hash, "ff");
    }

    #[test]
    fn test_deserialize_metadata_response_without_services() {
        let json = r#"{"metadata": []}"#;
        let resp: MetadataResponse = serde_json::from_str(json).unwrap();
        assert!(resp.services.is_empty());
    }

    #[test]
    fn test_service_type_round_trip_unknown() {
        assert_eq!(u16::from(ServiceType::from(22)), 22);
        assert_eq!(u16::from(ServiceType::from(1234)), 1234);
        assert!(ServiceType::from(22).is_incdec_rating());
        assert!(ServiceType::from(9).is_like_rating());
        assert_eq!(ServiceType::from(15), ServiceType::CombinedLocalFile);
    }

    #[test]
    fn test_file_selector_serialization() {
        let ids = serde_json::to_value(FileSelector::FileIds(vec![1, 2])).unwrap();
        assert_eq!(ids, serde_json::json!({"file_ids": [1, 2]}));
        let hashes = serde_json::to_value(FileSelector::Hashes(vec!["ab".into()])).unwrap();
        assert_eq!(hashes, serde_json::json!({"hashes": ["ab"]}));
    }
}
