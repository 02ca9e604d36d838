//! ngx-extract - translatable string extractor for Angular projects
//!
//! ngx-extract finds the strings an Angular application passes to ngx-translate
//! (the `translate` pipe and directive, `TranslateService` calls and marker
//! functions) and writes them to JSON or gettext PO catalogs, merging with the
//! catalogs already on disk.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (argument parsing, commands, reporting)
//! - `config`: Configuration file loading and parsing
//! - `core`: Extraction engine (parsers, worker pool, collection, post-processors, compilers)
//! - `task`: Input and output resolution around one extraction run

pub mod cli;
pub mod config;
pub mod core;
pub mod task;
