//! HTML specification document adapter.
//!
//! Parses the specification source with html5ever into an `RcDom` and
//! answers the [`SpecSource`] queries the extractor needs. Clauses are
//! `emu-clause` elements directly below `<body>` or below another clause.

use crate::section::{Container, Section};
use crate::source::SpecSource;
use eyre::{Result, WrapErr};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::collections::HashMap;

/// A parsed specification document, with elements indexed by `id`.
pub struct HtmlDocument {
    dom: RcDom,
    ids: HashMap<String, Handle>,
}

/// A DOM node handle, as seen by the section builder.
#[derive(Clone)]
pub struct HtmlNode(Handle);

impl HtmlDocument {
    pub fn parse(html: &str) -> Result<Self> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .wrap_err("Failed to parse specification HTML")?;

        let mut ids = HashMap::new();
        index_ids(&dom.document, &mut ids);
        tracing::debug!("Indexed {} element ids", ids.len());

        Ok(Self { dom, ids })
    }

    /// The `<body>` element, if the parser produced one.
    pub fn body(&self) -> Option<HtmlNode> {
        let html = find_child(&self.dom.document, "html")?;
        find_child(&html, "body").map(HtmlNode)
    }

    /// The element with the given `id`.
    pub fn element(&self, id: &str) -> Option<HtmlNode> {
        self.ids.get(id).cloned().map(HtmlNode)
    }

    fn children_named(&self, id: &str, name: &str) -> Vec<HtmlNode> {
        self.element(id)
            .map(|el| {
                el.child_elements()
                    .into_iter()
                    .filter(|c| c.is(name))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn local_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn find_child(handle: &Handle, name: &str) -> Option<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .find(|c| local_name(c).as_deref() == Some(name))
        .cloned()
}

fn index_ids(handle: &Handle, ids: &mut HashMap<String, Handle>) {
    if let NodeData::Element { attrs, .. } = &handle.data {
        if let Some(id) = attrs.borrow().iter().find(|a| &*a.name.local == "id") {
            // First occurrence wins, as with getElementById.
            ids.entry(id.value.to_string())
                .or_insert_with(|| handle.clone());
        }
    }
    for child in handle.children.borrow().iter() {
        index_ids(child, ids);
    }
}

fn collect_text(handle: &Handle, out: &mut String) {
    match &handle.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

impl HtmlNode {
    fn is(&self, name: &str) -> bool {
        local_name(&self.0).as_deref() == Some(name)
    }

    fn descendants_named(&self, name: &str, out: &mut Vec<HtmlNode>) {
        for child in self.child_elements() {
            if child.is(name) {
                out.push(child.clone());
            }
            child.descendants_named(name, out);
        }
    }
}

impl Container for HtmlNode {
    fn element_name(&self) -> Option<String> {
        local_name(&self.0)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match &self.0.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|a| &*a.name.local == name)
                .map(|a| a.value.to_string()),
            _ => None,
        }
    }

    fn child_elements(&self) -> Vec<Self> {
        self.0
            .children
            .borrow()
            .iter()
            .filter(|c| matches!(c.data, NodeData::Element { .. }))
            .cloned()
            .map(HtmlNode)
            .collect()
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.0, &mut out);
        out
    }
}

fn is_clause(node: &HtmlNode) -> bool {
    node.is("emu-clause")
}

impl SpecSource for HtmlDocument {
    fn sections(&self) -> Vec<Section> {
        self.body()
            .map(|body| Section::build(&body, &is_clause))
            .unwrap_or_default()
    }

    fn paragraphs(&self, id: &str) -> Vec<String> {
        self.children_named(id, "p")
            .iter()
            .map(Container::text_content)
            .collect()
    }

    fn list_items(&self, id: &str) -> Vec<String> {
        self.children_named(id, "ul")
            .iter()
            .flat_map(|ul| ul.child_elements())
            .filter(|li| li.is("li"))
            .map(|li| li.text_content())
            .collect()
    }

    fn definitions(&self, id: &str) -> Vec<String> {
        let Some(root) = self.element(id) else {
            return Vec::new();
        };
        let mut dfns = Vec::new();
        root.descendants_named("dfn", &mut dfns);
        dfns.iter().map(Container::text_content).collect()
    }
}
