//! Naming conventions shared by the documentation and the rules.

use crate::front_matter::{FrontMatter, PageType};
use escheck_core::{Catalog, GlobalEntity};
use regex::Regex;
use std::sync::LazyLock;

static LEGACY_OR_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(\$.\)$|…|@@|\[Symbol\.").expect("valid regex"));

static DUNDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__.+__").expect("valid regex"));

/// How the documentation spells a specification member name:
/// `%Symbol.iterator%` keys become `Symbol.iterator`, and the `%TypedArray%`
/// intrinsic becomes `TypedArray`.
pub fn documented_name(spec_name: &str) -> String {
    spec_name
        .replace("%TypedArray%", "TypedArray")
        .replace("%Symbol.", "Symbol.")
        .replace("%]", "]")
}

/// The catalog entity a documented object name refers to. Intrinsics that
/// are not globals, like `%TypedArray%`, are documented without the `%`.
pub fn find_entity<'a>(catalog: &'a Catalog, name: &str) -> Option<&'a GlobalEntity> {
    catalog
        .find(name)
        .or_else(|| catalog.find(&format!("%{}%", name)))
}

/// Whether a title names a symbol-keyed member.
pub fn is_symbol_keyed(title: &str) -> bool {
    title.contains("@@") || title.contains("[Symbol.")
}

fn last_segments(slug: &str, n: usize) -> String {
    let segments: Vec<&str> = slug.split('/').collect();
    segments[segments.len().saturating_sub(n)..].join("/")
}

fn in_intl_subobject(front_matter: &FrontMatter) -> bool {
    let segments = front_matter.slug_segments();
    front_matter.title.starts_with("Intl.")
        && segments.len() >= 2
        && segments[segments.len() - 2] != "Intl"
}

fn jsxref_arguments(front_matter: &FrontMatter) -> Vec<String> {
    let title = &front_matter.title;
    let slug = &front_matter.slug;
    match front_matter.page_type {
        PageType::JavascriptClass | PageType::JavascriptNamespace => vec![title.clone()],
        PageType::JavascriptConstructor => {
            let object = title.replace(" constructor", "");
            let depth = if object.starts_with("Intl.") { 3 } else { 2 };
            vec![last_segments(slug, depth), object]
        }
        PageType::JavascriptInstanceMethod | PageType::JavascriptStaticMethod => {
            if in_intl_subobject(front_matter) {
                vec![last_segments(slug, 3), title.clone()]
            } else {
                vec![title.clone()]
            }
        }
        PageType::JavascriptInstanceAccessorProperty
        | PageType::JavascriptStaticAccessorProperty
        | PageType::JavascriptStaticDataProperty
        | PageType::JavascriptInstanceDataProperty => {
            if LEGACY_OR_SYMBOL.is_match(title) {
                vec![last_segments(slug, 2), title.clone()]
            } else if in_intl_subobject(front_matter) {
                vec![last_segments(slug, 3), title.clone()]
            } else if let Some((_, property)) = title.split_once(": ") {
                vec![last_segments(slug, 2), property.to_string()]
            } else {
                vec![title.clone()]
            }
        }
        PageType::JavascriptLanguageFeature if title == "The arguments object" => {
            vec!["Functions/arguments".to_string(), "arguments".to_string()]
        }
        _ => Vec::new(),
    }
}

/// The cross-reference macro (or plain link) other pages use to link to
/// this one.
pub fn to_jsxref(front_matter: &FrontMatter) -> String {
    let title = &front_matter.title;
    if DUNDER.is_match(title)
        || title.starts_with("Segments")
        || (is_symbol_keyed(title) && front_matter.page_type.is_method())
    {
        return format!("[`{}`](/en-US/docs/{})", title, front_matter.slug);
    }
    format!(
        "{{{{jsxref(\"{}\")}}}}",
        jsxref_arguments(front_matter).join("\", \"")
    )
}

/// How prose refers to instances of a class, as a regex fragment.
pub fn to_english(class: &str) -> String {
    match class {
        "RegExp" => "(?:regex|regular expression)".to_string(),
        "ArrayBuffer" => "(?:array )?buffer".to_string(),
        "DataView" => "(?:data )?view".to_string(),
        "Intl.Locale" => "locale".to_string(),
        "SharedArrayBuffer" | "Segments" | "arguments" => format!("`{}`", class),
        _ => {
            let mut words: Vec<String> = Vec::new();
            for c in class.chars() {
                if c.is_ascii_uppercase() || words.is_empty() {
                    words.push(String::new());
                }
                if let Some(word) = words.last_mut() {
                    word.push(c.to_ascii_lowercase());
                }
            }
            words.join(" ")
        }
    }
}
