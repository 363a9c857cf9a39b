//! Kidcode session: the surface the presentation layer drives.
//!
//! A [`Session`] owns one program graph and exposes the editing, running,
//! saving and sharing operations. The page state that goes with a program
//! (theme, chosen character, unlocked achievements, tutorial flag) lives
//! here too.
//!
//! ```no_run
//! use kidcode_eval::RecordingHost;
//! use kidcode_session::{MemoryStore, Session, SessionConfig};
//! use kidcode_types::FieldValue;
//!
//! let mut session = Session::new(SessionConfig::default(), MemoryStore::new());
//! let walk = session
//!     .insert_block("move_character", &[("DIRECTION", FieldValue::Text("RIGHT".into()))])
//!     .unwrap();
//! let msg = session.insert_block("character_say", &[]).unwrap();
//! session.connect_statement(walk, msg).unwrap();
//!
//! let mut host = RecordingHost::new();
//! session.run(&mut host).unwrap();
//! ```

pub mod achievements;
pub mod config;
pub mod error;
pub mod session;
pub mod share;
pub mod storage;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::{Session, Theme};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
