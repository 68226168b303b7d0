//! Discord interaction surface for postbridge:
//! - **Wire types** (`wire`) - interaction envelope, exhaustive type-code enums,
//!   response payloads
//! - **Signature gate** (`signature`) - Ed25519 verification of webhook requests
//! - **Command router** (`commands`) - `/post` and `/status` slash commands
//! - **Modal forms** (`modal`) - declarative per-kind field tables + extraction
//! - **Gateway** (`gateway`) - verify → decode → authorize → dispatch state machine
//!
//! Everything here runs on the fast path and must finish well inside the
//! platform's 3-second acknowledgment deadline; nothing in this crate performs
//! network I/O.

pub mod commands;
pub mod gateway;
pub mod modal;
pub mod signature;
pub mod wire;
