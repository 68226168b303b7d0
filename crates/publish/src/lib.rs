//! Publish pipeline for postbridge:
//! - **RepositoryHost** (`host`) - branch/commit/PR collaborator contract plus
//!   the GitHub REST implementation
//! - **Notifier** (`notifier`) - fire-and-forget follow-up messages to the
//!   request's origin
//! - **MediaStore** (`media`) - ephemeral-to-permanent media URL seam
//! - **Rendering** (`render`) - frontmatter + body markdown assembly
//! - **Orchestrator** (`orchestrator`) - the strictly ordered
//!   branch → commit → pull-request sequence with compensating rollback
//!
//! Everything here runs on the slow path, after the interaction has already
//! been acknowledged.

pub mod host;
pub mod media;
pub mod notifier;
pub mod orchestrator;
pub mod render;
