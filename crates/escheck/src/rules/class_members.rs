use super::{Rule, render_edits};
use crate::context::{Document, FileContext};
use crate::front_matter::PageType;
use crate::names::{find_entity, is_symbol_keyed, to_jsxref};
use crate::page::{Block, BlockKind};
use escheck_core::{Catalog, GlobalEntity, Property, Section, Usage, edit_script};
use regex::Regex;
use std::sync::LazyLock;

/// `String.prototype` methods that wrap the string in an HTML tag; they are
/// listed after every other method.
const STRING_HTML_METHODS: &[&str] = &[
    "anchor", "big", "blink", "bold", "fixed", "fontcolor", "fontsize", "italics", "link", "small",
    "strike", "sub", "sup",
];

static JSXREF_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{jsxref\((?:".*?", )?"(.*?)""#).expect("valid regex")
});
static CODE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.*)`").expect("valid regex"));
static STRING_METHOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"String\.prototype\.(.*)\(\)").expect("valid regex"));

const SECTIONS: [&str; 5] = [
    "Constructor",
    "Static properties",
    "Static methods",
    "Instance properties",
    "Instance methods",
];

/// One expected entry of a member section.
#[derive(Debug)]
enum Member<'a> {
    /// A member with its own page
    Page(&'a Document),
    /// A member without a page, listed with a fixed reference
    Listed(String),
}

impl Member<'_> {
    /// The member's name as written in its title or reference.
    fn name(&self) -> &str {
        match self {
            Member::Page(doc) => &doc.front_matter.title,
            Member::Listed(reference) => JSXREF_NAME
                .captures(reference)
                .or_else(|| CODE_NAME.captures(reference))
                .and_then(|c| c.get(1))
                .map_or(reference.as_str(), |m| m.as_str()),
        }
    }

    fn label(&self) -> &str {
        match self {
            Member::Page(doc) => &doc.front_matter.title,
            Member::Listed(reference) => reference,
        }
    }

    /// The definition term expected for this member.
    fn term(&self) -> String {
        match self {
            Member::Page(doc) => {
                let mut term = to_jsxref(&doc.front_matter);
                for status in &doc.front_matter.status {
                    term.push(' ');
                    term.push_str(status.badge());
                }
                if doc.front_matter.title == "Function: displayName" {
                    term.push_str(" {{optional_inline}}");
                }
                term
            }
            Member::Listed(reference) if reference.contains("WeakRef.prototype.constructor") => {
                format!("{} {{{{optional_inline}}}}", reference)
            }
            Member::Listed(reference) => reference.clone(),
        }
    }
}

fn sort_key(name: &str, owner: &str) -> (bool, bool, bool, bool, String, String) {
    let string_html = STRING_METHOD
        .captures(name)
        .is_some_and(|c| STRING_HTML_METHODS.contains(&&c[1]));
    let bare = !name.contains(['.', '[']);
    // Subclasses inherit BYTES_PER_ELEMENT, so it goes last on the base class
    let bytes_per_element = owner == "TypedArray" && name.ends_with("BYTES_PER_ELEMENT");
    (
        string_html,
        bare,
        bytes_per_element,
        is_symbol_keyed(name),
        name.to_lowercase(),
        name.to_string(),
    )
}

fn has_property(properties: &[Property], name: &str, accessor: bool) -> bool {
    properties
        .iter()
        .any(|p| p.name() == name && p.is_accessor() == accessor)
}

/// Members every object of a kind has without a page of their own.
fn listed_members(catalog: &Catalog, owner: &str, section: &str) -> Vec<String> {
    let mut listed = Vec::new();
    let inherits = |ancestor: &str| owner != ancestor && catalog.inherits_from(owner, ancestor);
    match (section, find_entity(catalog, owner)) {
        ("Instance properties", Some(GlobalEntity::Class(class))) => {
            let prototype = format!("{}.prototype", class.name);
            let properties = &class.prototype_properties;
            if owner != "Object"
                && has_property(properties, &format!("{}.constructor", prototype), false)
            {
                listed.push(format!(
                    "{{{{jsxref(\"Object/constructor\", \"{}.prototype.constructor\")}}}}",
                    owner
                ));
            }
            if has_property(properties, &format!("{}[%Symbol.toStringTag%]", prototype), false) {
                listed.push(format!("`{}.prototype[Symbol.toStringTag]`", owner));
            }
            if inherits("Error") {
                listed.push(format!(
                    "{{{{jsxref(\"Error/name\", \"{}.prototype.name\")}}}}",
                    owner
                ));
            }
            if inherits("TypedArray") {
                listed.push(format!(
                    "{{{{jsxref(\"TypedArray/BYTES_PER_ELEMENT\", \"{}.prototype.BYTES_PER_ELEMENT\")}}}}",
                    owner
                ));
            }
        }
        ("Static properties", Some(GlobalEntity::Namespace(namespace))) => {
            let tag = format!("{}[%Symbol.toStringTag%]", namespace.name);
            if has_property(&namespace.static_properties, &tag, false) {
                listed.push(format!("`{}[Symbol.toStringTag]`", owner));
            }
        }
        ("Static properties", Some(GlobalEntity::Class(_))) if inherits("TypedArray") => {
            listed.push(format!(
                "{{{{jsxref(\"TypedArray/BYTES_PER_ELEMENT\", \"{}.BYTES_PER_ELEMENT\")}}}}",
                owner
            ));
        }
        _ => {}
    }
    listed
}

/// Classes without a callable constructor never get a constructor page.
fn is_abstract(catalog: &Catalog, name: &str) -> bool {
    match find_entity(catalog, name) {
        Some(GlobalEntity::Class(class)) => class
            .constructor
            .as_ref()
            .is_none_or(|ctor| ctor.usage == Usage::None),
        _ => false,
    }
}

/// Page types listed in a member section.
fn member_types(section: &str, owner: &str) -> &'static [PageType] {
    match section {
        "Constructor" => &[PageType::JavascriptConstructor],
        "Static properties" if owner == "Intl" => &[
            PageType::JavascriptStaticDataProperty,
            PageType::JavascriptStaticAccessorProperty,
            PageType::JavascriptClass,
        ],
        "Static properties" => &[
            PageType::JavascriptStaticDataProperty,
            PageType::JavascriptStaticAccessorProperty,
        ],
        "Static methods" => &[PageType::JavascriptStaticMethod],
        "Instance properties" => &[
            PageType::JavascriptInstanceDataProperty,
            PageType::JavascriptInstanceAccessorProperty,
        ],
        "Instance methods" => &[PageType::JavascriptInstanceMethod],
        _ => &[],
    }
}

fn pages_of_types<'a>(subpages: &[&'a Document], types: &[PageType]) -> Vec<Member<'a>> {
    subpages
        .iter()
        .filter(|doc| types.contains(&doc.front_matter.page_type))
        .map(|&doc| Member::Page(doc))
        .collect()
}

/// Blocks of a section including its subsections.
fn section_tree_blocks<'a>(cx: &FileContext<'a>, section: &Section) -> Vec<&'a Block> {
    section
        .walk()
        .flat_map(|s| cx.section_blocks(s))
        .collect()
}

/// Whether a section may hold several definition lists.
fn allows_several_lists(section: &str, owner: &str) -> bool {
    section == "Instance properties"
        || (section == "Instance methods" && owner == "String")
        || (section == "Static properties" && owner == "TypedArray")
}

/// Class and namespace pages list every member page (and the implicit
/// members without pages) in their member sections.
pub struct ClassMembers;

impl ClassMembers {
    fn check_section(&self, cx: &mut FileContext<'_>, section_title: &str, mut members: Vec<Member<'_>>) {
        let owner = cx.title();
        members.extend(
            listed_members(cx.catalog(), owner, section_title)
                .into_iter()
                .map(Member::Listed),
        );
        members.sort_by_cached_key(|m| sort_key(m.name(), owner));

        let Some(section) = cx.section(section_title) else {
            if !members.is_empty() {
                let labels: Vec<&str> = members.iter().map(Member::label).collect();
                cx.report(format!(
                    "Missing {} section, needed for: {}",
                    section_title,
                    labels.join(", ")
                ));
            }
            return;
        };
        let blocks = section_tree_blocks(cx, section);

        if members.is_empty() {
            let inherits_note = format!(
                "_Inherits {} from its parent {{{{jsxref(",
                section_title.to_lowercase()
            );
            let only_inherits = blocks.len() == 1
                && blocks[0].kind == BlockKind::Paragraph
                && cx.text(blocks[0]).starts_with(&inherits_note);
            // Error's static methods are all non-standard
            let non_standard = owner == "Error" && section_title == "Static methods";
            if !only_inherits && !non_standard {
                cx.report(format!("Unexpected {} section", section_title));
            }
            return;
        }

        let lists: Vec<&Block> = blocks
            .into_iter()
            .filter(|b| b.kind == BlockKind::DescriptionList)
            .collect();
        if lists.len() != 1 && !allows_several_lists(section_title, owner) {
            cx.report(format!("{} section should have one definition list", section_title));
        }

        let actual: Vec<&str> = lists
            .iter()
            .flat_map(|dl| dl.definitions())
            .map(|(term, _)| cx.text(term).trim())
            .collect();
        let expected: Vec<String> = members.iter().map(Member::term).collect();
        let edits = edit_script(&actual, &expected);
        if !edits.is_empty() {
            cx.report(render_edits(
                &format!("Section {} has unexpected items:", section_title),
                &edits,
            ));
        }
    }
}

impl Rule for ClassMembers {
    fn name(&self) -> &'static str {
        "class-members"
    }

    fn applies_to(&self, cx: &FileContext<'_>) -> bool {
        matches!(
            cx.page_type(),
            PageType::JavascriptClass | PageType::JavascriptNamespace
        )
    }

    fn check(&self, cx: &mut FileContext<'_>) {
        let owner = cx.title();
        let subpages = cx.subpages();

        for section in SECTIONS {
            if section == "Constructor" {
                if is_abstract(cx.catalog(), owner) {
                    continue;
                }
                let constructors = pages_of_types(&subpages, member_types(section, owner)).len();
                match cx.page_type() {
                    PageType::JavascriptClass if constructors != 1 => {
                        cx.report("A class should have one constructor");
                    }
                    PageType::JavascriptNamespace if constructors > 0 => {
                        cx.report("A namespace should not have a constructor");
                    }
                    _ => {}
                }
            }
            let members = pages_of_types(&subpages, member_types(section, owner));
            self.check_section(cx, section, members);
        }
    }
}
