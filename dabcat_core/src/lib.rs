//! `dabcat_core` is the engine behind [dabcat](https://github.com/dabcat/dabcat), the Dummy
//! App Builder for Code And Transforms. It turns an app connector into a dummy whose actions
//! answer from stored fixture data: a generated region is spliced into the connector's
//! `handle_action` method, the app identity is renamed, and the result is packaged as a
//! `.tgz` archive.
//!
//! ## Processing Pipeline
//!
//! ```text
//! App directory
//!   → Project discovery (connector, app json, replacerizer map)
//!   → Locator (finds `def handle_action(...)` and its indentation)
//!   → Synthesizer (missing imports + templated fragment)
//!   → Assembler (boundary markers, splice after the anchor line)
//!   → Packaging (dummy tree + gzip tar)
//! ```
//!
//! ## Modules
//!
//! - [`substitution`]: The replacerizer, with ordered literal substitution and `***KEY***`
//!   wildcard resolution.
//! - [`dispatch`]: The record selection the generated code performs at runtime,
//!   available in-process for previews and tests.
//! - [`project`]: App directory discovery and loading.
//! - [`package`]: Dummy tree copy and archive creation.
//! - [`config`]: `dabcat.toml` loading.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dabcat_core::InjectionConfig;
//! use dabcat_core::augment;
//!
//! let connector = std::fs::read_to_string("example_connector.py").unwrap();
//! let config = InjectionConfig {
//! 	fail_on_not_found: true,
//! };
//! let augmented = augment(&connector, &config).unwrap();
//! std::fs::write("example_connector.py", augmented.text).unwrap();
//! ```

pub use assembler::*;
pub use error::*;
pub use locator::*;
pub use metadata::*;
pub use payload::*;
pub use synthesizer::*;

mod assembler;
pub mod config;
pub mod dispatch;
mod error;
mod locator;
mod metadata;
pub mod package;
mod payload;
pub mod project;
pub mod substitution;
mod synthesizer;

#[cfg(test)]
mod __fixtures;
