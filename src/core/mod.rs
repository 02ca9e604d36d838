//! Extraction engine.
//!
//! Files flow through four stages:
//!
//! 1. **Parse** (`extract`, `parsers`): a pool of workers runs the enabled
//!    parsers over each file and yields per-parser key maps.
//! 2. **Merge** (`collection`): the maps are aggregated into one
//!    [`TranslationCollection`] and unioned with the existing catalog.
//! 3. **Post-process** (`post_process`): the draft goes through the
//!    configured chain.
//! 4. **Compile** (`compilers`): the result is serialized to a catalog format.

pub mod cache;
pub mod collection;
pub mod compilers;
pub mod error;
pub mod extract;
pub mod parsers;
pub mod post_process;

pub use collection::{TranslationCollection, TranslationEntry, TranslationMap};
