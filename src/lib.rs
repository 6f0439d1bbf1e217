//! # Bangumi Archive
//!
//! Rebuilds a local SQLite snapshot of the Bangumi public media-metadata
//! archive, distributed upstream as a zip bundle of `.jsonlines` files.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────────────────────────┐   ┌────────┐
//! │ Manifest │──▶│  Bundle  │──▶│ per file:                    │──▶│ SQLite │
//! │  (HTTPS) │   │ zip → dir│   │ dispatch → read → batch →    │   │ 9 tbls │
//! └──────────┘   └──────────┘   │ commit (one tx per chunk)    │   └────────┘
//!                               └──────────────────────────────┘
//! ```
//!
//! Files stream in bounded chunks (default 200k lines); each chunk is
//! deserialized concurrently across sub-batches and committed as a single
//! transaction. Subject records, which carry no id in the source data, are
//! numbered by a run-scoped atomic counter so a fully ingested subject file
//! holds exactly the ids 1..=N.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Entity record shapes and blob-column conversions |
//! | [`dispatch`] | File-name → entity-kind routing and the record sum type |
//! | [`reader`] | Bounded line-chunk streaming |
//! | [`batch`] | Concurrent sub-batch deserialization, Subject id assignment |
//! | [`sink`] | Per-entity buffering and chunk-transactional commits |
//! | [`fetch`] | Manifest and bundle acquisition |
//! | [`extract`] | Zip extraction and file discovery |
//! | [`ingest`] | End-to-end run orchestration |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod batch;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod extract;
pub mod fetch;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod reader;
pub mod sink;
