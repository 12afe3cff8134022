//! Query surface of a parsed specification document.

use crate::section::Section;

/// What the extractor reads from a specification document.
///
/// Ids are the anchors carried by [`Section::id`]. Queries for an unknown id
/// return nothing rather than failing: a section without extra prose is
/// common.
pub trait SpecSource {
    /// The top-level clause tree, in document order.
    fn sections(&self) -> Vec<Section>;

    /// Text of each paragraph that is a direct child of the element `id`.
    fn paragraphs(&self, id: &str) -> Vec<String>;

    /// Text of each item of the lists that are direct children of `id`.
    fn list_items(&self, id: &str) -> Vec<String>;

    /// Text of every definition (`dfn`) below the element `id`.
    fn definitions(&self, id: &str) -> Vec<String>;
}

impl<T: SpecSource + ?Sized> SpecSource for &T {
    fn sections(&self) -> Vec<Section> {
        (**self).sections()
    }
    fn paragraphs(&self, id: &str) -> Vec<String> {
        (**self).paragraphs(id)
    }
    fn list_items(&self, id: &str) -> Vec<String> {
        (**self).list_items(id)
    }
    fn definitions(&self, id: &str) -> Vec<String> {
        (**self).definitions(id)
    }
}
