//! File metadata normalization
//!
//! Turns raw file records into [`BasicFile`] and [`FullFile`] values with a
//! shape that does not depend on the server version. Derived fields are
//! recomputed from `(hash, mime)` on every pass.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use super::category::{category, FileCategory};
use super::filetype::{filetype_for_mime, filetype_string, Filetype};
use super::ratings::{normalize_ratings, Rating};
use crate::api::{
    FileUrls, LegacyTagMap, RawFileRecord, RawFileServiceEntry, RawTagService, ServiceDirectory,
    ServiceType,
};

/// Basic file information, as cached by file id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicFile {
    pub file_id: u64,
    pub hash: String,
    pub size: u64,
    pub mime: String,
    pub ext: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Duration in milliseconds
    pub duration: Option<u64>,
    pub num_frames: Option<u64>,
    pub num_words: Option<u64>,
    pub has_audio: bool,
    pub file_url: String,
    pub thumbnail_url: String,
    pub file_type: Filetype,
    pub file_category: FileCategory,
    pub file_type_string: String,
    pub has_thumbnail: bool,
}

/// Tag status as used in the per-service tag maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagStatus {
    Current,
    Pending,
    Deleted,
    Petitioned,
}

impl TagStatus {
    /// Parse the status key used on the wire ("0".."3")
    pub fn from_wire(key: &str) -> Option<Self> {
        match key.trim() {
            "0" => Some(TagStatus::Current),
            "1" => Some(TagStatus::Pending),
            "2" => Some(TagStatus::Deleted),
            "3" => Some(TagStatus::Petitioned),
            _ => None,
        }
    }
}

pub type TagsByStatus = BTreeMap<TagStatus, Vec<String>>;

/// Tags on one tag service
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagServiceState {
    pub name: Option<String>,
    pub service_type: Option<ServiceType>,
    pub storage_tags: TagsByStatus,
    pub display_tags: TagsByStatus,
}

/// Presence of a file in one file service
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileServiceEntry {
    pub name: Option<String>,
    pub service_type: Option<ServiceType>,
    pub time_imported: Option<DateTime<Utc>>,
    pub time_deleted: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileServices {
    pub current: BTreeMap<String, FileServiceEntry>,
    pub deleted: BTreeMap<String, FileServiceEntry>,
}

/// Everything the viewer shows for a single file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullFile {
    #[serde(flatten)]
    pub basic: BasicFile,
    pub known_urls: Vec<String>,
    pub file_services: FileServices,
    pub time_modified: Option<DateTime<Utc>>,
    pub notes: Option<BTreeMap<String, String>>,
    pub tags: BTreeMap<String, TagServiceState>,
    pub is_inbox: Option<bool>,
    pub is_local: Option<bool>,
    pub is_trashed: Option<bool>,
    pub is_deleted: Option<bool>,
    pub has_exif: Option<bool>,
    pub has_human_readable_embedded_metadata: Option<bool>,
    pub has_icc_profile: Option<bool>,
    pub ratings: Option<BTreeMap<String, Value>>,
    /// Earliest import time across current file services
    pub time_imported: Option<DateTime<Utc>>,
    pub ratings_array: Option<Vec<Rating>>,
    /// Fields this crate does not model, unchanged
    pub extra: BTreeMap<String, Value>,
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Normalize a raw record into a basic file.
///
/// Returns `None` for the stub records the server sends back for unknown
/// hashes.
pub fn normalize_basic<U: FileUrls + ?Sized>(raw: &RawFileRecord, urls: &U) -> Option<BasicFile> {
    let file_id = raw.file_id?;
    let mime = raw.mime.clone().unwrap_or_default();
    let file_type = filetype_for_mime(&mime);

    Some(BasicFile {
        file_id,
        hash: raw.hash.clone(),
        size: raw.size.unwrap_or(0),
        ext: raw.ext.clone().unwrap_or_default(),
        width: raw.width,
        height: raw.height,
        duration: raw.duration,
        num_frames: raw.num_frames,
        num_words: raw.num_words,
        has_audio: raw.has_audio.unwrap_or(false),
        file_url: urls.file_url(&raw.hash),
        thumbnail_url: urls.thumbnail_url(&raw.hash),
        file_type,
        file_category: category(file_type),
        file_type_string: filetype_string(&mime),
        has_thumbnail: file_type.has_thumbnail(),
        mime,
    })
}

/// Normalize a raw record into a full file.
///
/// The service directory must be the one returned alongside `raw`; rating
/// types cannot be resolved without it. Stub records yield `None`.
pub fn normalize_full<U: FileUrls + ?Sized>(
    raw: &RawFileRecord,
    services: &ServiceDirectory,
    urls: &U,
) -> Option<FullFile> {
    let basic = normalize_basic(raw, urls)?;
    let file_services = raw
        .file_services
        .as_ref()
        .map(|fs| FileServices {
            current: convert_file_services(&fs.current),
            deleted: convert_file_services(&fs.deleted),
        })
        .unwrap_or_default();

    Some(FullFile {
        basic,
        known_urls: raw.known_urls.clone().unwrap_or_default(),
        time_imported: earliest_import(raw),
        file_services,
        time_modified: raw.time_modified.and_then(timestamp),
        notes: raw.notes.clone(),
        tags: normalize_tags(raw, services),
        is_inbox: raw.is_inbox,
        is_local: raw.is_local,
        is_trashed: raw.is_trashed,
        is_deleted: raw.is_deleted,
        has_exif: raw.has_exif,
        has_human_readable_embedded_metadata: raw.has_human_readable_embedded_metadata,
        has_icc_profile: raw.has_icc_profile,
        ratings_array: raw
            .ratings
            .as_ref()
            .map(|ratings| normalize_ratings(ratings, services)),
        ratings: raw.ratings.clone(),
        extra: raw.extra.clone(),
    })
}

/// Earliest `time_imported` across the current file services
pub fn earliest_import(raw: &RawFileRecord) -> Option<DateTime<Utc>> {
    raw.file_services
        .as_ref()?
        .current
        .values()
        .filter_map(|entry| entry.time_imported)
        .min()
        .and_then(timestamp)
}

fn convert_file_services(
    entries: &BTreeMap<String, RawFileServiceEntry>,
) -> BTreeMap<String, FileServiceEntry> {
    entries
        .iter()
        .map(|(key, entry)| {
            (
                key.clone(),
                FileServiceEntry {
                    name: entry.name.clone(),
                    service_type: entry.service_type,
                    time_imported: entry.time_imported.and_then(timestamp),
                    time_deleted: entry.time_deleted.and_then(timestamp),
                },
            )
        })
        .collect()
}

fn tags_by_status(raw: &BTreeMap<String, Vec<String>>) -> TagsByStatus {
    raw.iter()
        .filter_map(|(status, tags)| TagStatus::from_wire(status).map(|s| (s, tags.clone())))
        .collect()
}

/// Per-service tag state from the modern `tags` object, or from the legacy
/// status maps when the server predates it
fn normalize_tags(
    raw: &RawFileRecord,
    services: &ServiceDirectory,
) -> BTreeMap<String, TagServiceState> {
    if let Some(tags) = &raw.tags {
        return tags
            .iter()
            .map(|(key, service)| (key.clone(), convert_tag_service(service)))
            .collect();
    }

    let mut state: BTreeMap<String, TagServiceState> = BTreeMap::new();
    let legacy: [(&Option<LegacyTagMap>, bool); 2] = [
        (&raw.service_keys_to_statuses_to_tags, false),
        (&raw.service_keys_to_statuses_to_display_tags, true),
    ];
    for (map, display) in legacy {
        let Some(map) = map else { continue };
        for (key, statuses) in map {
            let entry = state.entry(key.clone()).or_insert_with(|| {
                let info = services.get(key);
                TagServiceState {
                    name: info.map(|s| s.name.clone()),
                    service_type: info.map(|s| s.service_type),
                    ..TagServiceState::default()
                }
            });
            if display {
                entry.display_tags = tags_by_status(statuses);
            } else {
                entry.storage_tags = tags_by_status(statuses);
            }
        }
    }
    state
}

fn convert_tag_service(service: &RawTagService) -> TagServiceState {
    TagServiceState {
        name: service.name.clone(),
        service_type: service.service_type,
        storage_tags: tags_by_status(&service.storage_tags),
        display_tags: tags_by_status(&service.display_tags),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ServiceInfo;
    use serde_json::json;

    struct TestUrls;

    impl FileUrls for TestUrls {
        fn file_url(&self, hash: &str) -> String {
            format!("http://files/{}", hash)
        }

        fn thumbnail_url(&self, hash: &str) -> String {
            format!("http://thumbs/{}", hash)
        }
    }

    fn raw(value: Value) -> RawFileRecord {
        serde_json::from_value(value).unwrap()
    }

    fn rating_services() -> ServiceDirectory {
        let mut services = ServiceDirectory::new();
        services.insert(
            "fav",
            ServiceInfo {
                name: "favourites".to_string(),
                service_type: ServiceType::LocalRatingLike,
                type_pretty: None,
                star_shape: Some("heart".to_string()),
                min_stars: None,
                max_stars: None,
            },
        );
        services.insert(
            "mytags",
            ServiceInfo {
                name: "my tags".to_string(),
                service_type: ServiceType::LocalTag,
                type_pretty: None,
                star_shape: None,
                min_stars: None,
                max_stars: None,
            },
        );
        services
    }

    #[test]
    fn test_jpeg_basic_fields() {
        let file = normalize_basic(
            &raw(json!({
                "file_id": 7, "hash": "aa", "size": 100, "mime": "image/jpeg",
                "ext": ".jpg", "width": 10, "height": 20
            })),
            &TestUrls,
        )
        .unwrap();
        assert_eq!(file.file_type, Filetype::ImageJpeg);
        assert_eq!(file.file_category, FileCategory::Image);
        assert_eq!(file.file_type_string, "jpeg");
        assert!(file.has_thumbnail);
        assert_eq!(file.file_url, "http://files/aa");
        assert_eq!(file.thumbnail_url, "http://thumbs/aa");
        assert_eq!(file.size, 100);
        assert!(!file.has_audio);
    }

    #[test]
    fn test_unknown_mime() {
        let file = normalize_basic(
            &raw(json!({"file_id": 1, "hash": "aa", "mime": "application/x-totally-unknown"})),
            &TestUrls,
        )
        .unwrap();
        assert_eq!(file.file_type, Filetype::ApplicationUnknown);
        assert_eq!(file.file_type_string, "application/x-totally-unknown");
        assert_eq!(file.file_category, FileCategory::Unsupported);
        assert!(!file.has_thumbnail);
    }

    #[test]
    fn test_identifiers_only_record_normalizes() {
        let file = normalize_full(
            &raw(json!({"file_id": 3, "hash": "bb"})),
            &ServiceDirectory::new(),
            &TestUrls,
        )
        .unwrap();
        assert_eq!(file.basic.file_id, 3);
        assert_eq!(file.basic.mime, "");
        assert_eq!(file.basic.file_type, Filetype::ApplicationUnknown);
        assert!(file.time_imported.is_none());
        assert!(file.ratings_array.is_none());
        assert!(file.tags.is_empty());
        assert!(file.known_urls.is_empty());
    }

    #[test]
    fn test_unknown_hash_stub_is_not_a_file() {
        let stub = raw(json!({"file_id": null, "hash": "ff"}));
        assert!(normalize_basic(&stub, &TestUrls).is_none());
        assert!(normalize_full(&stub, &rating_services(), &TestUrls).is_none());
    }

    #[test]
    fn test_earliest_import() {
        let file = normalize_full(
            &raw(json!({
                "file_id": 1, "hash": "aa", "mime": "image/png",
                "file_services": {
                    "current": {
                        "svcA": {"time_imported": 100},
                        "svcB": {"time_imported": 50}
                    },
                    "deleted": {
                        "svcC": {"time_imported": 10, "time_deleted": 20}
                    }
                }
            })),
            &ServiceDirectory::new(),
            &TestUrls,
        )
        .unwrap();
        assert_eq!(file.time_imported, Utc.timestamp_opt(50, 0).single());
        assert_eq!(
            file.file_services.deleted["svcC"].time_deleted,
            Utc.timestamp_opt(20, 0).single()
        );
    }

    #[test]
    fn test_no_import_time() {
        let record = raw(json!({
            "file_id": 1, "hash": "aa",
            "file_services": {
                "current": {"svcA": {"name": "my files"}},
                "deleted": {"svcB": {"time_imported": 10}}
            }
        }));
        assert!(earliest_import(&record).is_none());
        let file = normalize_full(&record, &ServiceDirectory::new(), &TestUrls).unwrap();
        assert!(file.time_imported.is_none());
    }

    #[test]
    fn test_ratings_array_follows_ratings() {
        let services = rating_services();
        let with = normalize_full(
            &raw(json!({"file_id": 1, "hash": "aa", "ratings": {"fav": true, "gone": 3}})),
            &services,
            &TestUrls,
        )
        .unwrap();
        let ratings = with.ratings_array.unwrap();
        assert_eq!(ratings.len(), 1);
        assert!(matches!(&ratings[0], Rating::Like { value: Some(true), .. }));
        assert_eq!(with.ratings.unwrap().len(), 2);

        let without =
            normalize_full(&raw(json!({"file_id": 1, "hash": "aa"})), &services, &TestUrls)
                .unwrap();
        assert!(without.ratings_array.is_none());
    }

    #[test]
    fn test_modern_tags() {
        let file = normalize_full(
            &raw(json!({
                "file_id": 1, "hash": "aa",
                "tags": {
                    "mytags": {
                        "name": "my tags", "type": 5,
                        "storage_tags": {"0": ["blue eyes"], "1": ["pending tag"]},
                        "display_tags": {"0": ["blue eyes", "eyes"], "7": ["bogus"]}
                    }
                }
            })),
            &ServiceDirectory::new(),
            &TestUrls,
        )
        .unwrap();
        let state = &file.tags["mytags"];
        assert_eq!(state.name.as_deref(), Some("my tags"));
        assert_eq!(state.storage_tags[&TagStatus::Current], vec!["blue eyes"]);
        assert_eq!(state.storage_tags[&TagStatus::Pending], vec!["pending tag"]);
        assert_eq!(state.display_tags.len(), 1);
    }

    #[test]
    fn test_legacy_tags_folded_into_state() {
        let file = normalize_full(
            &raw(json!({
                "file_id": 1, "hash": "aa",
                "service_keys_to_statuses_to_tags": {
                    "mytags": {"0": ["samus aran"], "2": ["old tag"]}
                },
                "service_keys_to_statuses_to_display_tags": {
                    "mytags": {"0": ["samus aran", "metroid"]}
                }
            })),
            &rating_services(),
            &TestUrls,
        )
        .unwrap();
        let state = &file.tags["mytags"];
        assert_eq!(state.name.as_deref(), Some("my tags"));
        assert_eq!(state.service_type, Some(ServiceType::LocalTag));
        assert_eq!(state.storage_tags[&TagStatus::Deleted], vec!["old tag"]);
        assert_eq!(
            state.display_tags[&TagStatus::Current],
            vec!["samus aran", "metroid"]
        );
        assert!(file.extra.is_empty());
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let file = normalize_full(
            &raw(json!({"file_id": 1, "hash": "aa", "blurhash_v2": "xyz"})),
            &ServiceDirectory::new(),
            &TestUrls,
        )
        .unwrap();
        assert_eq!(file.extra["blurhash_v2"], json!("xyz"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let record = raw(json!({
            "file_id": 1, "hash": "aa", "mime": "video/webm",
            "file_services": {"current": {"a": {"time_imported": 5}}},
            "ratings": {"fav": false}
        }));
        let services = rating_services();
        let first = normalize_full(&record, &services, &TestUrls).unwrap();
        let second = normalize_full(&record, &services, &TestUrls).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.basic.file_category, FileCategory::Video);
    }
}
