//! Compiles note-vault markdown (wiki-links, tags, highlights, callouts,
//! diagrams and GPX/KML tracks) into an annotated hypertext tree plus the
//! metadata an external indexer needs.
//!
//! ```
//! use vaultmark_engine::{CompileOptions, compile};
//!
//! let compiled = compile("Hello [[World]] #greeting", &CompileOptions::new("/Home.md"));
//! assert!(compiled.metadata.tags.contains("greeting"));
//! ```

pub mod io;
pub mod models;
pub mod parsing;
pub mod pipeline;
pub mod placeholder;
pub mod render;
pub mod track;
pub mod transform;


// Re-export key types for easier usage
pub use io::{AssetSource, IoError, VaultDir, build_file_index, index_vault};
pub use models::*;
pub use pipeline::{CompileOptions, Compiled, Pipeline, compile};
pub use track::{
    BoundingRegion, GeoPoint, ParsedTrack, RealizedTrack, TrackError, TrackFormat, TrackSpec,
    decode, realize, realize_node,
};
