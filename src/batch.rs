//! Concurrent sub-batch deserialization of one chunk of lines.
//!
//! A chunk is partitioned into sub-batches of `max(1, chunk_len / divisor)`
//! lines. Sizing is chunk-relative: small chunks degenerate to one line per
//! task, a full 200k-line chunk to ten-line sub-batches. Each sub-batch
//! parses on its own task; join order equals spawn order, so the reassembled
//! records keep the chunk's original line order.
//!
//! Subject is the one kind whose source lines carry no id. Each successfully
//! parsed Subject claims the next value of a shared atomic counter. Claims
//! interleave across sub-batches, so a given line's id is scheduling
//! dependent, but for a fully parsed file the assigned set is exactly 1..=N.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::dispatch::{ArchiveRecord, EntityKind};
use crate::models::Subject;

/// Default divisor for chunk-relative sub-batch sizing.
pub const DEFAULT_BATCH_DIVISOR: usize = 20_000;

/// Run-scoped dense id sequence for Subject records. Shared by every
/// sub-batch task of every chunk of one file.
#[derive(Clone)]
pub struct SubjectIdCounter {
    next: Arc<AtomicI64>,
}

impl SubjectIdCounter {
    /// Start a fresh sequence at 1.
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Claim the next id.
    pub fn claim(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for SubjectIdCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialize one chunk of lines as `kind` records, concurrently across
/// sub-batches. Returns records in the chunk's original line order.
///
/// Any line that fails to parse aborts the whole chunk; the error includes
/// the raw line for diagnosis.
pub async fn deserialize_chunk(
    kind: EntityKind,
    lines: Vec<String>,
    batch_divisor: usize,
    subject_ids: &SubjectIdCounter,
) -> Result<Vec<ArchiveRecord>> {
    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = (lines.len() / batch_divisor.max(1)).max(1);

    let mut handles = Vec::with_capacity(lines.len() / batch_size + 1);
    let mut lines = lines;
    while !lines.is_empty() {
        let rest = lines.split_off(batch_size.min(lines.len()));
        let batch = std::mem::replace(&mut lines, rest);
        let ids = subject_ids.clone();
        handles.push(tokio::spawn(async move {
            let mut records = Vec::with_capacity(batch.len());
            for line in batch {
                records.push(parse_line(kind, &line, &ids)?);
            }
            Ok::<_, anyhow::Error>(records)
        }));
    }

    let mut out = Vec::new();
    for handle in handles {
        out.extend(handle.await.context("sub-batch task panicked")??);
    }
    Ok(out)
}

fn parse_line(kind: EntityKind, line: &str, ids: &SubjectIdCounter) -> Result<ArchiveRecord> {
    let record = match kind {
        EntityKind::Character => ArchiveRecord::Character(parse(line)?),
        EntityKind::Episode => ArchiveRecord::Episode(parse(line)?),
        EntityKind::Person => ArchiveRecord::Person(parse(line)?),
        EntityKind::PersonCharacter => ArchiveRecord::PersonCharacter(parse(line)?),
        EntityKind::Subject => {
            let mut subject: Subject = parse(line)?;
            subject.id = ids.claim();
            ArchiveRecord::Subject(subject)
        }
        EntityKind::SubjectCharacter => ArchiveRecord::SubjectCharacter(parse(line)?),
        EntityKind::SubjectPerson => ArchiveRecord::SubjectPerson(parse(line)?),
        EntityKind::SubjectRelation => ArchiveRecord::SubjectRelation(parse(line)?),
    };

    fn parse<'a, T: serde::Deserialize<'a>>(line: &'a str) -> Result<T> {
        serde_json::from_str(line).with_context(|| format!("offending line: {}", line))
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn episode_lines(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!(r#"{{"id":{},"name":"ep {}","subject_id":1}}"#, i + 100, i))
            .collect()
    }

    #[tokio::test]
    async fn test_order_preserved_for_keyed_kinds() {
        let lines = episode_lines(53);
        let ids = SubjectIdCounter::new();
        // divisor 10 over 53 lines gives 5-line sub-batches
        let records = deserialize_chunk(EntityKind::Episode, lines, 10, &ids)
            .await
            .unwrap();
        assert_eq!(records.len(), 53);
        for (i, record) in records.iter().enumerate() {
            match record {
                ArchiveRecord::Episode(e) => assert_eq!(e.id, i as i64 + 100),
                other => panic!("unexpected record kind: {:?}", other.kind()),
            }
        }
    }

    #[tokio::test]
    async fn test_subject_ids_dense_under_concurrency() {
        let lines: Vec<String> = (0..500)
            .map(|i| format!(r#"{{"name":"subject {}"}}"#, i))
            .collect();
        let ids = SubjectIdCounter::new();
        // one line per sub-batch: 500 concurrent tasks racing on the counter
        let records = deserialize_chunk(EntityKind::Subject, lines, 500, &ids)
            .await
            .unwrap();
        let assigned: BTreeSet<i64> = records
            .iter()
            .map(|r| match r {
                ArchiveRecord::Subject(s) => s.id,
                other => panic!("unexpected record kind: {:?}", other.kind()),
            })
            .collect();
        assert_eq!(assigned.len(), 500, "ids must be unique");
        assert_eq!(assigned.iter().next(), Some(&1));
        assert_eq!(assigned.iter().last(), Some(&500), "ids must be gap-free");
    }

    #[tokio::test]
    async fn test_counter_spans_chunks() {
        let ids = SubjectIdCounter::new();
        let first = deserialize_chunk(
            EntityKind::Subject,
            vec![r#"{"name":"a"}"#.into(), r#"{"name":"b"}"#.into()],
            DEFAULT_BATCH_DIVISOR,
            &ids,
        )
        .await
        .unwrap();
        let second = deserialize_chunk(
            EntityKind::Subject,
            vec![r#"{"name":"c"}"#.into()],
            DEFAULT_BATCH_DIVISOR,
            &ids,
        )
        .await
        .unwrap();
        let all: BTreeSet<i64> = first
            .iter()
            .chain(second.iter())
            .map(|r| match r {
                ArchiveRecord::Subject(s) => s.id,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(all, BTreeSet::from([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_malformed_line_fails_chunk_and_surfaces_line() {
        let mut lines = episode_lines(10);
        lines[7] = r#"{"id":7,"name":"truncat"#.into();
        let ids = SubjectIdCounter::new();
        let err = deserialize_chunk(EntityKind::Episode, lines, 10, &ids)
            .await
            .unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("truncat"), "error must carry the raw line: {}", msg);
    }

    #[tokio::test]
    async fn test_wrong_shape_is_an_error_not_a_skip() {
        // an episode line routed as person-characters lacks the junction keys
        let lines = vec![r#"{"id":1,"name":"ep"}"#.to_string()];
        let ids = SubjectIdCounter::new();
        let result = deserialize_chunk(EntityKind::PersonCharacter, lines, 1, &ids).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_chunk_is_empty() {
        let ids = SubjectIdCounter::new();
        let records = deserialize_chunk(EntityKind::Character, Vec::new(), 1, &ids)
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}
