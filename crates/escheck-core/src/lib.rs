//! escheck-core: specification catalog extraction and sequence reconciliation
//!
//! This crate holds the two pieces the documentation checker is built on:
//!
//! - the catalog extractor, which walks the clause tree of the language
//!   specification and produces a typed [`Catalog`] of every global class,
//!   namespace, function and value, with arities and attribute flags;
//! - the edit-script engine ([`edit`]), which computes a minimal list of
//!   delete/insert/substitute operations between two ordered string
//!   sequences and is used to diff headings and member lists.
//!
//! # Example
//!
//! ```ignore
//! use escheck_core::{HtmlDocument, extract_catalog};
//!
//! let doc = HtmlDocument::parse(&std::fs::read_to_string("spec.html")?)?;
//! let catalog = extract_catalog(&doc)?;
//! println!("{}", catalog.to_json()?);
//! ```
//!
//! # Features
//!
//! - `html` (default): the [`HtmlDocument`] adapter, parsing specification
//!   sources with html5ever.

pub mod catalog;
#[cfg(feature = "html")]
pub mod document;
pub mod edit;
pub mod error;
pub mod extract;
pub mod members;
pub mod section;
pub mod source;

pub use catalog::{
    AccessorAttributes, Catalog, Class, Constructor, DataAttributes, Function, GlobalEntity,
    GlobalProperty, Method, Namespace, Parameters, Property, Usage,
};
#[cfg(feature = "html")]
pub use document::HtmlDocument;
pub use edit::{Edit, edit_script};
pub use error::StructuralError;
pub use extract::extract_catalog;
pub use section::{Container, Section};
pub use source::SpecSource;
