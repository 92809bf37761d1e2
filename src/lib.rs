//! # Plex Shelf
//!
//! A local mirror of selected sections of a Plex media library, browsable as a
//! poster gallery. The upstream server is read once per start; after that the
//! gallery works from files on disk.
//!
//! # Architecture
//!
//! ```text
//! 1. Fetch        upstream sections  →  in-memory sections + artwork jobs
//! 2. Materialize  artwork jobs       →  images/{id}-{hi,400,200}.jpg
//! 3. Snapshot     sections           →  data/library.json
//! ```
//!
//! The three stages run in order inside [`sync::run`]. The HTTP server
//! ([`server`]) never talks to the upstream: it serves the snapshot, the
//! image files and a gallery page rendered from the snapshot.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`upstream`] | `LibrarySource` trait and the `reqwest` client for a Plex-compatible server |
//! | [`fetch`] | Section allow-list → sections of items, dropping records without artwork |
//! | [`materialize`] | Concurrent artwork download and resize, awaited as a whole |
//! | [`imaging`] | Pure-Rust decode, resize and JPEG encode behind the `ImageBackend` trait |
//! | [`snapshot`] | Atomic JSON snapshot write and read |
//! | [`sync`] | The one-shot pipeline tying the stages together |
//! | [`server`] | `axum` router: snapshot endpoint, static files, gallery page |
//! | [`gallery`] | Gallery state and Maud rendering |
//! | [`config`] | `plex-shelf.toml` loading, overrides, validation |
//! | [`types`] | Snapshot types (`Section`, `Item`) |
//! | [`naming`] | Image file names and public paths |
//! | [`output`] | CLI summary of a sync pass |
//!
//! # Design Decisions
//!
//! ## Snapshot After Images
//!
//! The snapshot is written only after every artwork job has finished, and
//! every file is written to a `.part` sibling and renamed into place. A reader
//! therefore never sees a snapshot that names images still being written, and
//! never sees a half-written file.
//!
//! ## Server-Rendered Gallery
//!
//! The gallery is rendered with [Maud](https://maud.lambda.xyz/) on each
//! request. Section and sort selection live in the query string, so every
//! gallery state has a URL and the page works without JavaScript.

pub mod config;
pub mod fetch;
pub mod gallery;
pub mod imaging;
pub mod materialize;
pub mod naming;
pub mod output;
pub mod server;
pub mod snapshot;
pub mod sync;
pub mod types;
pub mod upstream;

#[cfg(test)]
pub(crate) mod test_helpers;
