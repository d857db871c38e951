//! Stalker Portal Client Core Library
//!
//! This crate talks to IPTV middleware implementing the Stalker (Ministra)
//! set-top box protocol.
//!
//! # Features
//! - Handshake and bearer-token session handling
//! - Capability probing for gzip support and `create_link` indirection
//! - Channel listing and playback URL resolution
//! - EPG retrieval and XMLTV export with timezone-qualified stamps
//! - Channel logo download through a pluggable sink
//!
//! There is no caching, retrying or rate limiting. Errors are returned to
//! the caller with the failing operation attached.

pub mod catalog;
pub mod client;
pub mod epg;
pub mod error;
pub mod logo;
pub mod portal;
pub mod probe;
pub mod request;
mod response;
pub mod session;
pub mod types;
pub mod xmltv;

// Re-export main types for convenience
pub use client::{ByteStream, ClientConfig};
pub use epg::resolve_timezone;
pub use error::{Operation, Result, StalkerError};
pub use logo::{FilenameTemplate, FsLogoSink, LogoSink, Placeholder};
pub use portal::StalkerClient;
pub use types::{ChannelRecord, ProgramEntry, ServerProfile, Session};
pub use xmltv::{XmltvChannel, XmltvDocument, XmltvProgramme};
