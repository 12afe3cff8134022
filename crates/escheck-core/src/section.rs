//! Nested document sections.
//!
//! A [`Section`] is the title/id/children skeleton of a structured document.
//! The specification is turned into one by descending its clause elements
//! ([`Section::build`]); documentation pages are turned into one from their
//! heading outline ([`Section::from_outline`]).

use crate::error::{Result, StructuralError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A titled, nested region of a document with a stable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub id: String,
    pub children: Vec<Section>,
}

/// The node surface the section builder needs from a parsed document.
///
/// Implementations are expected to be cheap handles (reference counted
/// nodes), since children are returned by value.
pub trait Container: Sized {
    /// Lowercase element name, or `None` for text and other non-elements.
    fn element_name(&self) -> Option<String>;

    /// Value of an attribute on this element.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Element children, in document order.
    fn child_elements(&self) -> Vec<Self>;

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self) -> String;
}

/// Children of a member section that do not make it a container of its own:
/// abstract operations (`Foo ( … )`), grammar-ish names, and records.
static LEAF_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z]+\s*\(|^`|Record$").expect("valid regex"));

/// Collapse runs of whitespace (including newlines) to single spaces and trim.
pub fn normalize_title(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

impl Section {
    pub fn new(title: impl Into<String>, id: impl Into<String>, children: Vec<Section>) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
            children,
        }
    }

    /// Build the section tree below `root`.
    ///
    /// Each direct child of `root` accepted by `is_section` becomes a
    /// section: its title is the normalized text of its first heading
    /// child, its id is its `id` attribute, and its children are built the
    /// same way. Document order is preserved.
    pub fn build<N: Container>(root: &N, is_section: &dyn Fn(&N) -> bool) -> Vec<Section> {
        root.child_elements()
            .into_iter()
            .filter(|child| is_section(child))
            .map(|node| {
                let title = node
                    .child_elements()
                    .into_iter()
                    .find(|c| c.element_name().as_deref().is_some_and(is_heading))
                    .map(|h| normalize_title(&h.text_content()))
                    .unwrap_or_default();
                Section {
                    title,
                    id: node.attribute("id").unwrap_or_default(),
                    children: Section::build(&node, is_section),
                }
            })
            .collect()
    }

    /// Build a section tree from a flat outline of `(depth, title, id)`
    /// entries, such as the headings of a markdown page.
    ///
    /// An entry becomes a child of the closest preceding entry with a smaller
    /// depth; entries with no such predecessor are returned at the top level.
    pub fn from_outline<I>(outline: I) -> Vec<Section>
    where
        I: IntoIterator<Item = (usize, String, String)>,
    {
        let mut roots = Vec::new();
        let mut stack: Vec<(usize, Section)> = Vec::new();

        fn close(stack: &mut Vec<(usize, Section)>, roots: &mut Vec<Section>) {
            if let Some((_, done)) = stack.pop() {
                match stack.last_mut() {
                    Some((_, parent)) => parent.children.push(done),
                    None => roots.push(done),
                }
            }
        }

        for (depth, title, id) in outline {
            while stack.last().is_some_and(|(d, _)| *d >= depth) {
                close(&mut stack, &mut roots);
            }
            stack.push((depth, Section::new(title, id, Vec::new())));
        }
        while !stack.is_empty() {
            close(&mut stack, &mut roots);
        }
        roots
    }

    /// Whether the title ends in a parameter list, i.e. names a callable.
    pub fn is_callable(&self) -> bool {
        self.title.ends_with(')')
    }

    /// Whether the title names one half of an accessor pair.
    pub fn is_accessor_half(&self) -> bool {
        self.title.starts_with("get ") || self.title.starts_with("set ")
    }

    /// Whether this section holds exactly a getter/setter pair.
    pub fn has_accessor_pair(&self) -> bool {
        self.children.iter().filter(|c| c.is_accessor_half()).count() == 2
    }

    /// Check that this member section only nests leaf-like children, and
    /// return it unchanged.
    pub fn bare(&self) -> Result<&Section> {
        let leaves = self
            .children
            .iter()
            .all(|s| LEAF_TITLE.is_match(&s.title) && s.children.is_empty());
        if leaves || self.has_accessor_pair() {
            Ok(self)
        } else {
            Err(StructuralError::NotBare {
                section: self.title.clone(),
            })
        }
    }

    /// The first child with exactly this title.
    pub fn child(&self, title: &str) -> Option<&Section> {
        self.children.iter().find(|c| c.title == title)
    }

    /// Like [`Section::child`], but a missing child is a structural error.
    pub fn expect_child(&self, title: &str) -> Result<&Section> {
        self.child(title).ok_or_else(|| StructuralError::MissingSection {
            parent: self.title.clone(),
            title: title.to_string(),
        })
    }

    /// The first child whose title matches `pattern`.
    pub fn child_matching(&self, pattern: &Regex) -> Option<&Section> {
        self.children.iter().find(|c| pattern.is_match(&c.title))
    }

    /// Index of the first child with exactly this title.
    pub fn position(&self, title: &str) -> Result<usize> {
        self.children
            .iter()
            .position(|c| c.title == title)
            .ok_or_else(|| StructuralError::MissingSection {
                parent: self.title.clone(),
                title: title.to_string(),
            })
    }

    /// Depth-first iterator over this section and all its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Section> {
        let mut pending = vec![self];
        std::iter::from_fn(move || {
            let next = pending.pop()?;
            pending.extend(next.children.iter().rev());
            Some(next)
        })
    }
}
