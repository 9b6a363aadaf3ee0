//! Decodes Visio VSDX packages into the draw.io `mxfile` graph model.
//!
//! The pipeline reads the zip package, expands relationship references into one tree per
//! part, builds a [`Document`] index of pages, masters, stylesheets and themes, then walks
//! each foreground page to place vertices and route edges.
//!
//! ```no_run
//! use drawio_vsdx::{ImportOptions, import_vsdx, write_mxfile};
//!
//! let bytes = std::fs::read("diagram.vsdx").unwrap();
//! let options = ImportOptions::default();
//! let file = import_vsdx(&bytes, &options).unwrap();
//! let xml = write_mxfile(&file, options.compress_output).unwrap();
//! ```

pub mod assemble;
pub mod cascade;
pub mod cells;
pub mod codec;
pub mod config;
pub mod document;
mod edges;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod import;
pub mod model;
pub mod package;
pub mod placement;
pub mod read;
pub mod sanitize;
pub mod serde_f64;
pub mod style;
pub mod tables;
pub mod text;
pub mod theme;
pub mod write;
pub mod xml;

pub use config::ImportOptions;
pub use document::Document;
pub use error::{ImportError, ImportResult};
pub use import::{import_document, import_vsdx};
pub use model::{Diagram, MxCell, MxFile, MxGeometry, MxGraphModel, MxPoint};
pub use package::{Package, PackageError};
pub use read::{ReadError, ReadResult, read_mxfile};
pub use write::{WriteError, WriteResult, write_mxfile};
