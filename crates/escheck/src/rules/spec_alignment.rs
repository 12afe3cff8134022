use super::Rule;
use crate::context::{ExitContext, FileContext, RunContext};
use crate::front_matter::PageType;
use crate::names::documented_name;
use escheck_core::{Catalog, GlobalEntity, Property};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static UNDOCUMENTED_MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\.prototype|\[%Symbol\.toStringTag%\]|\.constructor)$").expect("valid regex")
});
static TYPED_ARRAY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z0-9]+").expect("valid regex"));

/// Namespaces the specification describes as prototype objects of classes
/// that are documented as such.
const PROTOTYPE_NAMESPACES: &[(&str, &str)] = &[
    ("%IteratorPrototype%", "Iterator"),
    ("%AsyncIteratorPrototype%", "AsyncIterator"),
];

/// One `page-type: title` line.
fn entry(page_type: PageType, name: &str) -> String {
    format!("{}: {}", page_type, name)
}

/// The page title the documentation uses for a specified name, or `None`
/// for members that never get a page.
fn page_title(name: &str) -> Option<String> {
    if UNDOCUMENTED_MEMBER.is_match(name) && name != "Object.prototype.constructor" {
        return None;
    }
    let mut title = if name.ends_with("BYTES_PER_ELEMENT") {
        TYPED_ARRAY_PREFIX.replace(name, "TypedArray").into_owned()
    } else {
        documented_name(name)
    };
    // Every NativeError shares the pages of Error
    if title.ends_with("Error.prototype.message") || title.ends_with("Error.prototype.name") {
        if let Some(at) = title.rfind("Error") {
            title = title[at..].to_string();
        }
        if title.ends_with("message") {
            title = title.replace(".prototype.", ": ");
        }
    }
    Some(title)
}

#[derive(Default)]
struct Specced(BTreeSet<String>);

impl Specced {
    fn add(&mut self, page_type: PageType, name: &str) {
        if let Some(title) = page_title(name) {
            self.0.insert(entry(page_type, &title));
        }
    }

    fn add_static_properties(&mut self, properties: &[Property]) {
        for property in properties {
            let page_type = if property.is_accessor() {
                PageType::JavascriptStaticAccessorProperty
            } else {
                PageType::JavascriptStaticDataProperty
            };
            self.add(page_type, property.name());
        }
    }
}

/// Every page the catalog implies should exist.
fn specced_pages(catalog: &Catalog) -> BTreeSet<String> {
    let mut specced = Specced::default();
    for entity in catalog.iter() {
        match entity {
            GlobalEntity::Namespace(namespace) => {
                if let Some((prefix, class)) = PROTOTYPE_NAMESPACES
                    .iter()
                    .find(|(prefix, _)| *prefix == namespace.name)
                {
                    specced.add(PageType::JavascriptClass, class);
                    let prototype = format!("{}.prototype", class);
                    for method in &namespace.static_methods {
                        specced.add(
                            PageType::JavascriptInstanceMethod,
                            &method.name.replace(prefix, &prototype),
                        );
                    }
                    continue;
                }
                specced.add(PageType::JavascriptNamespace, &namespace.name);
                for method in &namespace.static_methods {
                    specced.add(PageType::JavascriptStaticMethod, &method.name);
                }
                specced.add_static_properties(&namespace.static_properties);
            }
            GlobalEntity::Class(class) => {
                specced.add(PageType::JavascriptClass, &class.name);
                if let Some(constructor) = &class.constructor {
                    specced.add(
                        PageType::JavascriptConstructor,
                        &format!("{} constructor", constructor.name),
                    );
                }
                for method in &class.instance_methods {
                    specced.add(PageType::JavascriptInstanceMethod, &method.name);
                }
                for property in &class.prototype_properties {
                    let page_type = if property.is_accessor() {
                        PageType::JavascriptInstanceAccessorProperty
                    } else {
                        PageType::JavascriptInstanceDataProperty
                    };
                    specced.add(page_type, property.name());
                }
                for method in &class.static_methods {
                    specced.add(PageType::JavascriptStaticMethod, &method.name);
                }
                specced.add_static_properties(&class.static_properties);
                for property in &class.instance_properties {
                    specced.add(
                        PageType::JavascriptInstanceDataProperty,
                        &format!("{}: {}", class.name, property.name()),
                    );
                }
            }
            GlobalEntity::Function(function) => {
                specced.add(PageType::JavascriptFunction, &function.name);
            }
            GlobalEntity::GlobalProperty(property) => {
                specced.add(PageType::JavascriptGlobalProperty, &property.name);
            }
        }
    }
    specced.0
}

/// Built-in object pages outside `Intl`; `Intl` is specified separately.
fn is_builtin_page(path: &str, title: &str, page_type: PageType) -> bool {
    page_type.is_javascript()
        && !title.contains("handler.")
        && path
            .match_indices("global_objects/")
            .any(|(at, m)| !path[at + m.len()..].starts_with("intl"))
}

fn documented_pages(run: &RunContext) -> BTreeSet<String> {
    run.documents()
        .iter()
        .filter(|(path, doc)| {
            is_builtin_page(
                &run.display_path(path),
                &doc.front_matter.title,
                doc.front_matter.page_type,
            )
        })
        .map(|(_, doc)| entry(doc.front_matter.page_type, &doc.front_matter.title))
        .collect()
}

/// Documented built-ins and specified built-ins are the same set.
pub struct SpecAlignment;

impl Rule for SpecAlignment {
    fn name(&self) -> &'static str {
        "spec-alignment"
    }

    // Works on the whole page set once every page was loaded
    fn applies_to(&self, _cx: &FileContext<'_>) -> bool {
        false
    }

    fn check(&self, _cx: &mut FileContext<'_>) {}

    fn on_exit(&self, cx: &mut ExitContext<'_>) {
        let specced = specced_pages(cx.run().catalog());
        let documented = documented_pages(cx.run());

        let unrecognized: Vec<&str> = documented.difference(&specced).map(String::as_str).collect();
        if !unrecognized.is_empty() {
            cx.report(format!("Unrecognized content pages:\n{}", unrecognized.join("\n")));
        }
        let undocumented: Vec<&str> = specced.difference(&documented).map(String::as_str).collect();
        if !undocumented.is_empty() {
            cx.report(format!("Undocumented specced APIs:\n{}", undocumented.join("\n")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::*;
    use indoc::indoc;

    fn catalog() -> Catalog {
        Catalog::from_json(indoc! {r#"
            [
              {
                "type": "class",
                "name": "Array",
                "global": true,
                "constructor": {
                  "name": "Array()",
                  "parameters": { "required": 0, "optional": 0, "rest": true },
                  "usage": "equivalent"
                },
                "staticProperties": [
                  { "type": "data-property", "name": "Array.prototype", "attributes": "" },
                  { "type": "accessor-property", "name": "Array[%Symbol.species%]", "attributes": "gc" }
                ],
                "staticMethods": [
                  { "name": "Array.from()", "parameters": { "required": 1, "optional": 2, "rest": false } }
                ],
                "prototypeProperties": [
                  { "type": "data-property", "name": "Array.prototype.constructor", "attributes": "wc" }
                ],
                "instanceMethods": [
                  { "name": "Array.prototype[%Symbol.iterator%]()", "parameters": { "required": 0, "optional": 0, "rest": false } }
                ],
                "instanceProperties": [
                  { "type": "data-property", "name": "length", "attributes": "w" }
                ]
              },
              {
                "type": "class",
                "name": "RangeError",
                "global": true,
                "extends": "Error",
                "constructor": null,
                "staticProperties": [],
                "staticMethods": [],
                "prototypeProperties": [
                  { "type": "data-property", "name": "RangeError.prototype.message", "attributes": "wc" },
                  { "type": "data-property", "name": "RangeError.prototype.name", "attributes": "wc" }
                ],
                "instanceMethods": [],
                "instanceProperties": []
              },
              {
                "type": "namespace",
                "name": "%IteratorPrototype%",
                "global": false,
                "staticProperties": [],
                "staticMethods": [
                  { "name": "%IteratorPrototype%[%Symbol.iterator%]()", "parameters": { "required": 0, "optional": 0, "rest": false } }
                ]
              },
              {
                "type": "function",
                "name": "parseInt()",
                "parameters": { "required": 2, "optional": 0, "rest": false },
                "global": true
              }
            ]
        "#})
        .unwrap()
    }

    #[test]
    fn test_page_titles() {
        assert_eq!(page_title("Array.prototype"), None);
        assert_eq!(page_title("Math[%Symbol.toStringTag%]"), None);
        assert_eq!(page_title("Array.prototype.constructor"), None);
        assert_eq!(
            page_title("Object.prototype.constructor").as_deref(),
            Some("Object.prototype.constructor")
        );
        assert_eq!(
            page_title("Int8Array.prototype.BYTES_PER_ELEMENT").as_deref(),
            Some("TypedArray.prototype.BYTES_PER_ELEMENT")
        );
        assert_eq!(
            page_title("AggregateError.prototype.message").as_deref(),
            Some("Error: message")
        );
        assert_eq!(
            page_title("RangeError.prototype.name").as_deref(),
            Some("Error.prototype.name")
        );
        assert_eq!(
            page_title("%TypedArray%.prototype.at()").as_deref(),
            Some("TypedArray.prototype.at()")
        );
    }

    #[test]
    fn test_specced_pages() {
        let specced = specced_pages(&catalog());
        let expected: BTreeSet<String> = [
            "javascript-class: Array",
            "javascript-constructor: Array() constructor",
            "javascript-static-accessor-property: Array[Symbol.species]",
            "javascript-static-method: Array.from()",
            "javascript-instance-method: Array.prototype[Symbol.iterator]()",
            "javascript-instance-data-property: Array: length",
            "javascript-class: RangeError",
            "javascript-instance-data-property: Error: message",
            "javascript-instance-data-property: Error.prototype.name",
            "javascript-class: Iterator",
            "javascript-instance-method: Iterator.prototype[Symbol.iterator]()",
            "javascript-function: parseInt()",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(specced, expected);
    }

    #[test]
    fn test_reports_both_differences() {
        let run = run_context(
            catalog(),
            vec![
                page("Reference/Global_Objects/Array", "Array", "javascript-class", ""),
                page("Reference/Global_Objects/Array/from", "Array.from()", "javascript-static-method", ""),
                page("Reference/Global_Objects/Array/flat", "Array.prototype.flat()", "javascript-instance-method", ""),
                page("Reference/Global_Objects/Intl", "Intl", "javascript-namespace", ""),
                page("Reference/Global_Objects/Proxy/Proxy/get", "handler.get()", "javascript-instance-method", ""),
                page("Reference/Statements/if...else", "if...else", "javascript-statement", ""),
            ],
        );
        let rule = SpecAlignment;
        let mut cx = ExitContext::new(&run);
        rule.on_exit(&mut cx);
        let messages = cx.into_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0],
            "Unrecognized content pages:\njavascript-instance-method: Array.prototype.flat()"
        );
        assert!(messages[1].starts_with("Undocumented specced APIs:\n"));
        assert!(messages[1].contains("\njavascript-constructor: Array() constructor"));
        assert!(!messages[1].contains("javascript-class: Array\n"));
        assert!(!messages[1].contains("Array.from()"));
    }

    #[test]
    fn test_never_runs_per_page() {
        let run = run_context(
            catalog(),
            vec![page("Reference/Global_Objects/Array", "Array", "javascript-class", "")],
        );
        assert!(check(&SpecAlignment, &run, "Reference/Global_Objects/Array").is_none());
    }
}
