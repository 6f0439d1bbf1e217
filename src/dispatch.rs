//! File-name based routing to entity-type pipelines.
//!
//! The bundle names each `.jsonlines` file after the entity it contains
//! (`subject.jsonlines`, `subject-relations.jsonlines`, ...). Matching is
//! exact on the lowercased stem; anything else is skipped by the caller with
//! a warning rather than failing the run, since the upstream archive may add
//! new files at any time.

use std::fmt;
use std::path::Path;

use crate::models::{
    Character, Episode, Person, PersonCharacter, Subject, SubjectCharacter, SubjectPerson,
    SubjectRelation,
};

/// The eight known entity kinds, tagged by file stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Character,
    Episode,
    Person,
    PersonCharacter,
    Subject,
    SubjectCharacter,
    SubjectPerson,
    SubjectRelation,
}

impl EntityKind {
    /// Map a file name (extension stripped, case-insensitive) to its kind.
    /// Returns `None` for unrecognized names.
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?.to_lowercase();
        match stem.as_str() {
            "character" => Some(EntityKind::Character),
            "episode" => Some(EntityKind::Episode),
            "person" => Some(EntityKind::Person),
            "person-characters" => Some(EntityKind::PersonCharacter),
            "subject" => Some(EntityKind::Subject),
            "subject-characters" => Some(EntityKind::SubjectCharacter),
            "subject-persons" => Some(EntityKind::SubjectPerson),
            "subject-relations" => Some(EntityKind::SubjectRelation),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Character => "character",
            EntityKind::Episode => "episode",
            EntityKind::Person => "person",
            EntityKind::PersonCharacter => "person-characters",
            EntityKind::Subject => "subject",
            EntityKind::SubjectCharacter => "subject-characters",
            EntityKind::SubjectPerson => "subject-persons",
            EntityKind::SubjectRelation => "subject-relations",
        };
        write!(f, "{}", name)
    }
}

/// A deserialized record of any entity kind. Closed sum so the persistence
/// sink can match exhaustively.
#[derive(Debug, Clone)]
pub enum ArchiveRecord {
    Character(Character),
    Episode(Episode),
    Person(Person),
    PersonCharacter(PersonCharacter),
    Subject(Subject),
    SubjectCharacter(SubjectCharacter),
    SubjectPerson(SubjectPerson),
    SubjectRelation(SubjectRelation),
}

impl ArchiveRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            ArchiveRecord::Character(_) => EntityKind::Character,
            ArchiveRecord::Episode(_) => EntityKind::Episode,
            ArchiveRecord::Person(_) => EntityKind::Person,
            ArchiveRecord::PersonCharacter(_) => EntityKind::PersonCharacter,
            ArchiveRecord::Subject(_) => EntityKind::Subject,
            ArchiveRecord::SubjectCharacter(_) => EntityKind::SubjectCharacter,
            ArchiveRecord::SubjectPerson(_) => EntityKind::SubjectPerson,
            ArchiveRecord::SubjectRelation(_) => EntityKind::SubjectRelation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_stems_map_to_kinds() {
        let cases = [
            ("character.jsonlines", EntityKind::Character),
            ("episode.jsonlines", EntityKind::Episode),
            ("person.jsonlines", EntityKind::Person),
            ("person-characters.jsonlines", EntityKind::PersonCharacter),
            ("subject.jsonlines", EntityKind::Subject),
            ("subject-characters.jsonlines", EntityKind::SubjectCharacter),
            ("subject-persons.jsonlines", EntityKind::SubjectPerson),
            ("subject-relations.jsonlines", EntityKind::SubjectRelation),
        ];
        for (name, kind) in cases {
            assert_eq!(EntityKind::from_path(Path::new(name)), Some(kind), "{}", name);
        }
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(
            EntityKind::from_path(Path::new("/tmp/extracted/Subject.JSONLINES")),
            Some(EntityKind::Subject)
        );
        assert_eq!(
            EntityKind::from_path(Path::new("SUBJECT-RELATIONS.jsonlines")),
            Some(EntityKind::SubjectRelation)
        );
    }

    #[test]
    fn test_unknown_stem_is_none() {
        assert_eq!(EntityKind::from_path(Path::new("unknown-type.jsonlines")), None);
        assert_eq!(EntityKind::from_path(Path::new("subjects.jsonlines")), None);
        assert_eq!(EntityKind::from_path(Path::new("README.md")), None);
    }

    #[test]
    fn test_display_round_trips_through_from_path() {
        let kinds = [
            EntityKind::Character,
            EntityKind::Episode,
            EntityKind::Person,
            EntityKind::PersonCharacter,
            EntityKind::Subject,
            EntityKind::SubjectCharacter,
            EntityKind::SubjectPerson,
            EntityKind::SubjectRelation,
        ];
        for kind in kinds {
            let name = format!("{}.jsonlines", kind);
            assert_eq!(EntityKind::from_path(Path::new(&name)), Some(kind));
        }
    }
}
