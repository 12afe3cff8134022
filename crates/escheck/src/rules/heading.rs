use super::{Rule, render_edits};
use crate::context::FileContext;
use crate::front_matter::PageType;
use crate::names::is_symbol_keyed;
use escheck_core::{Edit, edit_script};

const REFERENCE_TAIL: &[&str] = &["Examples", "Specifications", "Browser compatibility", "See also"];
const ERROR_TAIL: &[&str] = &["Examples", "See also"];

/// Headings that may be left out without being reported.
const OPTIONAL: &[&str] = &[
    "Description",
    "Constructor",
    "Static properties",
    "Static methods",
    "Instance properties",
    "Instance methods",
];

/// The expected H2 sequence for a page type, without the common tail.
fn template(page_type: PageType) -> Option<&'static [&'static str]> {
    let head: &[&str] = match page_type {
        PageType::JavascriptClass => &[
            "Description",
            "Constructor",
            "Static properties",
            "Static methods",
            "Instance properties",
            "Instance methods",
        ],
        PageType::JavascriptNamespace => &["Description", "Static properties", "Static methods"],
        PageType::JavascriptInstanceDataProperty
        | PageType::JavascriptStaticDataProperty
        | PageType::JavascriptGlobalProperty => &["Value", "Description"],
        PageType::JavascriptError => &["Message", "Error type", "What went wrong?"],
        PageType::JavascriptConstructor
        | PageType::JavascriptInstanceMethod
        | PageType::JavascriptInstanceAccessorProperty
        | PageType::JavascriptStaticMethod
        | PageType::JavascriptStaticAccessorProperty
        | PageType::JavascriptFunction
        | PageType::JavascriptOperator
        | PageType::JavascriptStatement
        | PageType::JavascriptLanguageFeature => &["Syntax", "Description"],
        PageType::Guide | PageType::LandingPage => return None,
    };
    Some(head)
}

pub(crate) fn expected_headings(page_type: PageType, title: &str) -> Vec<&'static str> {
    let Some(head) = template(page_type) else {
        return Vec::new();
    };
    let tail = if page_type == PageType::JavascriptError {
        ERROR_TAIL
    } else {
        REFERENCE_TAIL
    };
    let mut expected: Vec<&'static str> = head.iter().chain(tail).copied().collect();
    if title == "The arguments object" {
        let at = expected.len() - tail.len();
        expected.insert(at, "Properties");
    }
    expected
}

fn is_optional(heading: &str, cx: &FileContext<'_>) -> bool {
    OPTIONAL.contains(&heading)
        || (heading == "Syntax"
            && cx.page_type().is_accessor_property()
            && !is_symbol_keyed(cx.title()))
}

/// Top-level headings follow the template for the page type.
pub struct Heading;

impl Rule for Heading {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn applies_to(&self, cx: &FileContext<'_>) -> bool {
        cx.page_type().is_javascript()
    }

    fn check(&self, cx: &mut FileContext<'_>) {
        let actual: Vec<&str> = cx.page().sections().iter().map(|s| s.title.as_str()).collect();
        let expected = expected_headings(cx.page_type(), cx.title());
        let edits: Vec<Edit> = edit_script(&actual, &expected)
            .into_iter()
            .filter(|edit| !matches!(edit, Edit::Insert(heading) if is_optional(heading, cx)))
            .collect();
        if !edits.is_empty() {
            cx.report(render_edits("Unexpected headings:", &edits));
        }
    }
}
