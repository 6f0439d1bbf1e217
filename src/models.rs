//! Record shapes for the eight archive entity kinds plus the manifest row.
//!
//! Field names mirror the lowercase JSON keys used by the upstream archive's
//! `.jsonlines` files. Upstream data omits or nulls fields freely, so most
//! fields carry `#[serde(default)]` rather than failing the whole line.
//!
//! A few Subject and Person attributes are structured values in memory but
//! JSON text columns on disk (`tags_json`, `score_details_json`,
//! `favorite_json`, `career_json`). The conversion lives here, at the
//! boundary, so the storage shape never leaks into the domain shape.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Manifest metadata for the fetched bundle. One row per run.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveInfo {
    pub browser_download_url: String,
    #[serde(default)]
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub id: i64,
    #[serde(default)]
    pub label: String,
    pub name: String,
    #[serde(default)]
    pub node_id: String,
    pub size: i64,
    pub updated_at: DateTime<Utc>,
    pub url: String,
}

/// One tag on a subject: a name and how many users applied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagItem {
    pub name: String,
    pub count: i64,
}

/// A work (anime, book, game, music, ...). The source lines carry no id;
/// ingestion assigns a dense 1..N sequence per run.
#[derive(Debug, Clone, Deserialize)]
pub struct Subject {
    #[serde(skip_deserializing)]
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_cn: String,
    #[serde(default)]
    pub infobox: String,
    #[serde(default)]
    pub platform: i64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub tags: Vec<TagItem>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub score_details: BTreeMap<String, i64>,
    #[serde(default)]
    pub rank: i64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub favorite: BTreeMap<String, i64>,
    #[serde(default)]
    pub series: bool,
}

impl Subject {
    /// Storage encoding of the tag list.
    pub fn tags_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.tags)
    }

    /// Storage encoding of the per-score vote breakdown.
    pub fn score_details_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.score_details)
    }

    /// Storage encoding of the collection-status breakdown.
    pub fn favorite_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.favorite)
    }

    /// Materialize a stored tag list.
    pub fn tags_from_json(json: &str) -> serde_json::Result<Vec<TagItem>> {
        serde_json::from_str(json)
    }

    /// Materialize a stored string-keyed count map (`score_details_json`
    /// or `favorite_json`).
    pub fn counts_from_json(json: &str) -> serde_json::Result<BTreeMap<String, i64>> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Episode {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_cn: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub airdate: String,
    #[serde(default)]
    pub disc: i64,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub subject_id: i64,
    #[serde(default)]
    pub sort: f64,
    #[serde(rename = "type", default)]
    pub kind: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Character {
    pub id: i64,
    #[serde(default)]
    pub role: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub infobox: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub collects: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Person {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub career: Option<Vec<String>>,
    #[serde(default)]
    pub infobox: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub collects: i64,
}

impl Person {
    /// Storage encoding of the career-role list (`null` stays `null`).
    pub fn career_json(&self) -> serde_json::Result<Option<String>> {
        self.career.as_ref().map(serde_json::to_string).transpose()
    }

    /// Materialize a stored career list.
    pub fn career_from_json(json: &str) -> serde_json::Result<Vec<String>> {
        serde_json::from_str(json)
    }
}

/// Junction: a person voices/portrays a character within a subject.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonCharacter {
    pub person_id: i64,
    pub subject_id: i64,
    pub character_id: i64,
    #[serde(default)]
    pub summary: String,
}

/// Junction: a character appears in a subject, with display ordering.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectCharacter {
    pub character_id: i64,
    pub subject_id: i64,
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub order: i64,
}

/// Junction: a person worked on a subject in a given position.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectPerson {
    pub person_id: i64,
    pub subject_id: i64,
    #[serde(default)]
    pub position: i64,
}

/// A typed relation between two subjects. The source lines carry no relation
/// id; the store assigns one on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectRelation {
    pub subject_id: i64,
    #[serde(default)]
    pub relation_type: i64,
    pub related_subject_id: i64,
    #[serde(default)]
    pub order: i64,
}
