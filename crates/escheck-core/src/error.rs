//! Structural assertion failures raised while extracting the catalog.

use std::fmt;

/// The specification document did not have the shape the extractor relies on.
///
/// Every variant is fatal for an extraction run: a catalog is only produced
/// when no structural assumption was violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// A section that should only hold abstract operations, type definitions
    /// or a getter/setter pair has other children.
    NotBare { section: String },
    /// A section with a fixed title was not found.
    MissingSection { parent: String, title: String },
    /// A section appeared where a different one was expected.
    UnexpectedSection { expected: String, found: String },
    /// The global object section does not have its four fixed children.
    GlobalObjectShape { titles: Vec<String> },
    /// A constructor section does not start with the constructor's signature.
    MissingConstructorSignature { section: String },
    /// More than one sentence of a single-valued kind (attributes, length).
    DuplicateSentence { section: String, kind: &'static str },
    /// A sentence was recognized but its content could not be parsed.
    UnparseableSentence { section: String, text: String },
    /// A member title does not contain a parameter list.
    UnparseableSignature { title: String },
    /// A global-object entry names an entity that is not in the catalog.
    UnknownEntity { name: String },
    /// A global-object entry resolved to an entity of the wrong kind.
    WrongEntityKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Two entities ended up with the same name.
    DuplicateEntity { name: String },
    /// A value property of the global object has no attributes sentence.
    MissingAttributes { section: String },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::NotBare { section } => {
                write!(f, "Not all children are AOs/type-defs for {section}")
            }
            StructuralError::MissingSection { parent, title } => {
                write!(f, "Expected section \"{title}\" under \"{parent}\"")
            }
            StructuralError::UnexpectedSection { expected, found } => {
                write!(f, "Expected section \"{expected}\", found \"{found}\"")
            }
            StructuralError::GlobalObjectShape { titles } => {
                write!(f, "Unexpected global object structure: [{}]", titles.join(", "))
            }
            StructuralError::MissingConstructorSignature { section } => {
                write!(f, "Constructor section {section} does not specify constructor")
            }
            StructuralError::DuplicateSentence { section, kind } => {
                write!(f, "Expected {section} to have 1 {kind} paragraph")
            }
            StructuralError::UnparseableSentence { section, text } => {
                write!(f, "Could not parse sentence in {section}: {text}")
            }
            StructuralError::UnparseableSignature { title } => {
                write!(f, "No parameter list in \"{title}\"")
            }
            StructuralError::UnknownEntity { name } => {
                write!(f, "{name} is not in the catalog")
            }
            StructuralError::WrongEntityKind {
                name,
                expected,
                found,
            } => write!(f, "{name} is not a {expected} (found {found})"),
            StructuralError::DuplicateEntity { name } => {
                write!(f, "Entity {name} is defined more than once")
            }
            StructuralError::MissingAttributes { section } => {
                write!(f, "{section} has no attributes paragraph")
            }
        }
    }
}

impl std::error::Error for StructuralError {}

pub type Result<T, E = StructuralError> = std::result::Result<T, E>;
