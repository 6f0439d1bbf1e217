//! Chunk-transactional persistence of deserialized records.
//!
//! Records are routed to per-entity append buffers by matching on the
//! [`ArchiveRecord`] sum, then flushed as one SQLite transaction per chunk.
//! One chunk is the unit of commit: a failure leaves the store exactly at
//! the last committed chunk boundary. Buffers are cleared after commit so
//! memory stays bounded by a single chunk's records.
//!
//! `subject_relation` rows deliberately omit `relation_id` on insert; the
//! source lines carry none and SQLite assigns the rowid.

use anyhow::Result;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::dispatch::ArchiveRecord;
use crate::models::{
    ArchiveInfo, Character, Episode, Person, PersonCharacter, Subject, SubjectCharacter,
    SubjectPerson, SubjectRelation,
};

/// Per-entity append buffers for one chunk's records.
#[derive(Default)]
pub struct RecordBuffer {
    subjects: Vec<Subject>,
    episodes: Vec<Episode>,
    characters: Vec<Character>,
    persons: Vec<Person>,
    person_characters: Vec<PersonCharacter>,
    subject_characters: Vec<SubjectCharacter>,
    subject_persons: Vec<SubjectPerson>,
    subject_relations: Vec<SubjectRelation>,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ArchiveRecord) {
        match record {
            ArchiveRecord::Subject(r) => self.subjects.push(r),
            ArchiveRecord::Episode(r) => self.episodes.push(r),
            ArchiveRecord::Character(r) => self.characters.push(r),
            ArchiveRecord::Person(r) => self.persons.push(r),
            ArchiveRecord::PersonCharacter(r) => self.person_characters.push(r),
            ArchiveRecord::SubjectCharacter(r) => self.subject_characters.push(r),
            ArchiveRecord::SubjectPerson(r) => self.subject_persons.push(r),
            ArchiveRecord::SubjectRelation(r) => self.subject_relations.push(r),
        }
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
            + self.episodes.len()
            + self.characters.len()
            + self.persons.len()
            + self.person_characters.len()
            + self.subject_characters.len()
            + self.subject_persons.len()
            + self.subject_relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Commit all buffered records in one transaction, then clear the
    /// buffers. A commit failure is fatal to the run; nothing from this
    /// chunk is persisted.
    pub async fn commit(&mut self, pool: &SqlitePool) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        let mut tx = pool.begin().await?;

        for s in &self.subjects {
            insert_subject(&mut tx, s).await?;
        }
        for e in &self.episodes {
            sqlx::query(
                r#"
                INSERT INTO episode (id, name, name_cn, description, airdate, disc, duration, subject_id, sort, type)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(e.id)
            .bind(&e.name)
            .bind(&e.name_cn)
            .bind(&e.description)
            .bind(&e.airdate)
            .bind(e.disc)
            .bind(&e.duration)
            .bind(e.subject_id)
            .bind(e.sort)
            .bind(e.kind)
            .execute(&mut *tx)
            .await?;
        }
        for c in &self.characters {
            sqlx::query(
                r#"
                INSERT INTO character (id, role, name, infobox, summary, comments, collects)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(c.id)
            .bind(c.role)
            .bind(&c.name)
            .bind(&c.infobox)
            .bind(&c.summary)
            .bind(c.comments)
            .bind(c.collects)
            .execute(&mut *tx)
            .await?;
        }
        for p in &self.persons {
            sqlx::query(
                r#"
                INSERT INTO person (id, name, type, career_json, infobox, summary, comments, collects)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(p.id)
            .bind(&p.name)
            .bind(p.kind)
            .bind(p.career_json()?)
            .bind(&p.infobox)
            .bind(&p.summary)
            .bind(p.comments)
            .bind(p.collects)
            .execute(&mut *tx)
            .await?;
        }
        for pc in &self.person_characters {
            sqlx::query(
                r#"
                INSERT INTO person_character (person_id, subject_id, character_id, summary)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(pc.person_id)
            .bind(pc.subject_id)
            .bind(pc.character_id)
            .bind(&pc.summary)
            .execute(&mut *tx)
            .await?;
        }
        for sc in &self.subject_characters {
            sqlx::query(
                r#"
                INSERT INTO subject_character (character_id, subject_id, type, sort_order)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(sc.character_id)
            .bind(sc.subject_id)
            .bind(sc.kind)
            .bind(sc.order)
            .execute(&mut *tx)
            .await?;
        }
        for sp in &self.subject_persons {
            sqlx::query(
                r#"
                INSERT INTO subject_person (person_id, subject_id, position)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(sp.person_id)
            .bind(sp.subject_id)
            .bind(sp.position)
            .execute(&mut *tx)
            .await?;
        }
        for sr in &self.subject_relations {
            sqlx::query(
                r#"
                INSERT INTO subject_relation (subject_id, relation_type, related_subject_id, sort_order)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(sr.subject_id)
            .bind(sr.relation_type)
            .bind(sr.related_subject_id)
            .bind(sr.order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.clear();
        Ok(())
    }

    fn clear(&mut self) {
        self.subjects.clear();
        self.episodes.clear();
        self.characters.clear();
        self.persons.clear();
        self.person_characters.clear();
        self.subject_characters.clear();
        self.subject_persons.clear();
        self.subject_relations.clear();
    }
}

async fn insert_subject(tx: &mut Transaction<'_, Sqlite>, s: &Subject) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO subject (id, type, name, name_cn, infobox, platform, summary, nsfw,
                             tags_json, score, score_details_json, rank, date, favorite_json, series)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(s.id)
    .bind(s.kind)
    .bind(&s.name)
    .bind(&s.name_cn)
    .bind(&s.infobox)
    .bind(s.platform)
    .bind(&s.summary)
    .bind(s.nsfw)
    .bind(s.tags_json()?)
    .bind(s.score)
    .bind(s.score_details_json()?)
    .bind(s.rank)
    .bind(s.date.as_deref())
    .bind(s.favorite_json()?)
    .bind(s.series)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Persist the manifest row. One per run, outside the chunk pipeline.
pub async fn insert_archive_info(pool: &SqlitePool, info: &ArchiveInfo) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO archive_info (id, browser_download_url, content_type, created_at, label,
                                  name, node_id, size, updated_at, url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(info.id)
    .bind(&info.browser_download_url)
    .bind(&info.content_type)
    .bind(info.created_at.to_rfc3339())
    .bind(&info.label)
    .bind(&info.name)
    .bind(&info.node_id)
    .bind(info.size)
    .bind(info.updated_at.to_rfc3339())
    .bind(&info.url)
    .execute(pool)
    .await?;
    Ok(())
}
