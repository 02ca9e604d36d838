//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `extract`: Extract translatable strings into one or more catalogs
//! - `init`: Initialize an ngx-extract configuration file
//!
//! Every `extract` option overrides the matching field of the configuration file.

use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::core::{compilers::Format, parsers::ParserName, post_process::SortSensitivity};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct ExtractArgs {
    /// Paths, directories or glob patterns to extract strings from.
    /// Catalogs record each source file relative to the working directory
    #[arg(short, long, num_args = 1..)]
    pub input: Vec<String>,

    /// Catalog files or directories to write
    #[arg(short, long, num_args = 1..)]
    pub output: Vec<String>,

    /// File patterns matched inside input directories
    #[arg(short, long, num_args = 1..)]
    pub patterns: Vec<String>,

    /// Catalog format
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,

    /// Indentation of JSON catalogs
    #[arg(long)]
    pub format_indentation: Option<String>,

    /// Replace existing catalogs instead of merging into them
    #[arg(short, long)]
    pub replace: bool,

    /// Sort keys
    #[arg(short, long)]
    pub sort: bool,

    /// Case sensitivity of --sort
    #[arg(long, value_enum)]
    pub sort_sensitivity: Option<SortSensitivity>,

    /// Remove keys no longer found in the sources
    #[arg(short, long)]
    pub clean: bool,

    /// Use the key as the value of untranslated entries
    #[arg(short = 'k', long)]
    pub key_as_default_value: bool,

    /// Use the key as the value of keys new to the catalog
    #[arg(long)]
    pub key_as_initial_default_value: bool,

    /// Use this string as the value of untranslated entries
    #[arg(short = 'd', long)]
    pub string_as_default_value: Option<String>,

    /// Remove this prefix from every key
    #[arg(long)]
    pub strip_prefix: Option<String>,

    /// Name of a custom marker function
    #[arg(short, long)]
    pub marker: Option<String>,

    /// Parsers to run (default: all)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub parsers: Vec<ParserName>,

    /// Reuse results for unchanged files across runs
    #[arg(long)]
    pub cache_file: Option<String>,

    /// Omit source file references from PO catalogs
    #[arg(long)]
    pub no_po_source_locations: bool,

    /// Domain (msgctxt) of PO catalog entries
    #[arg(long)]
    pub po_domain: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract translatable strings from templates and scripts
    Extract(ExtractArgs),
    /// Initialize a new .ngx-extract.json configuration file
    Init,
}
