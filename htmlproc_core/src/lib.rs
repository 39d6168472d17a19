//! `htmlproc_core` is the core library for the htmlproc build-comment processor. It rewrites HTML source for a requested environment by resolving typed build blocks written inside HTML comments: removing or keeping environment-gated sections, inlining partials and assets, wrapping conditional-IE markup, and finally interpolating `${...}` placeholders from a data mapping.
//!
//! ## Processing Pipeline
//!
//! ```text
//! HTML source
//!   -> Lexer (finds HTML comments, tokenizes the ones anchored on the marker)
//!   -> Scanner (pairs open/close markers into Directives, splits the source into Spans)
//!   -> Resolver (decides which gated directives are active for the environment)
//!   -> Handlers (render active directives; includes recurse through the pipeline)
//!   -> Interpolator (replaces `${expression}` placeholders)
//! ```
//!
//! ## Directives
//!
//! ```html
//! <!-- build:remove(dev) -->
//! <script src="debug.js"></script>
//! <!-- /build -->
//!
//! <!-- build:include partials/nav.html -->
//! <!-- /build -->
//!
//! <!-- build:ie(lt IE 9) -->
//! <script src="html5shiv.js"></script>
//! <!-- endbuild -->
//!
//! <!-- build:js:dist app.min.js -->
//! <script src="a.js"></script>
//! <script src="b.js"></script>
//! <!-- /build -->
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Processing options and configuration loading from `htmlproc.toml`, including data source mappings.
//! - [`environment`] - Target parsing and environment activation rules.
//!
//! ## Key Types
//!
//! - [`HtmlProcessor`] - Processes HTML sources for one set of options.
//! - [`Directive`] - A parsed build block with its type, targets, parameters and body.
//! - [`BlockRegistry`] - Maps block types to [`BlockHandler`]s.
//! - [`ProcessingContext`] - What a handler sees while rendering a directive.
//! - [`HtmlProcConfig`] - Configuration loaded from `htmlproc.toml`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use htmlproc_core::HtmlProcessor;
//! use htmlproc_core::ProcessOptions;
//!
//! let options = ProcessOptions::default().with_environment("dist");
//! let processor = HtmlProcessor::new(options).unwrap();
//! let html = processor.process_file("src/index.html").unwrap();
//! println!("{html}");
//! ```

pub use config::*;
pub use context::*;
pub use custom::TemplateBlock;
pub use engine::*;
pub use error::*;
pub use include::IncludeKind;
pub use interpolate::*;
pub use parser::*;
pub use position::*;
pub use registry::*;

pub mod config;
mod context;
mod custom;
mod engine;
pub mod environment;
#[allow(unused_assignments)]
mod error;
mod handlers;
mod include;
mod interpolate;
pub(crate) mod lexer;
mod parser;
mod position;
mod registry;

#[cfg(test)]
mod __fixtures;
