use super::Rule;
use crate::context::FileContext;
use crate::front_matter::PageType;
use crate::names::{documented_name, find_entity};
use crate::page::{Block, BlockKind, CalloutKind};
use escheck_core::{Catalog, GlobalEntity, Method, Parameters, Usage};
use regex::Regex;
use std::sync::LazyLock;

/// Reserved words; methods with these names are shown called on an
/// instance or value, e.g. `mapInstance.delete(key)`.
#[rustfmt::skip]
const KEYWORDS: &[&str] = &[
    "await",
    "break",
    "case", "catch", "class", "const", "continue",
    "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends",
    "false", "finally", "for", "function",
    "if", "import", "in", "instanceof",
    "new", "null",
    "return",
    "super", "switch",
    "this", "throw", "true", "try", "typeof",
    "var", "void",
    "while", "with",
    "yield",
];

const NEW_LINK: &str = "[`new`](/en-US/docs/Web/JavaScript/Reference/Operators/new)";

const TYPED_ARRAY_EXCEPTIONS: &str =
    "See [`TypedArray`](/en-US/docs/Web/JavaScript/Reference/Global_Objects/TypedArray#exceptions).";

/// Pages whose exceptions cannot be listed as a single definition list.
const FREE_FORM_EXCEPTIONS: &[&str] = &["eval()", "Generator.prototype.throw()", "await"];

static ESCAPED_META: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([\^$\\.*+?()\[\]{}|#&~-])").expect("valid regex"));
static METHOD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.prototype(?:\.(\w+)|(\[[\w.]+\]))\(\)").expect("valid regex")
});
static PROTOTYPE_OWNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\.prototype").expect("valid regex"));
static STATIC_OWNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\.\w+\(").expect("valid regex"));
static KNOWN_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\{\{jsxref\("(?:TypeError|RangeError|SyntaxError|ReferenceError|URIError)"\)\}\}$"#,
    )
    .expect("valid regex")
});
static THROWN_IF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^- : Thrown (?:in \[strict mode\]\(/en-US/docs/Web/JavaScript/Reference/Strict_mode\) )?if",
    )
    .expect("valid regex")
});
static THROWN_IN_CASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^- : Thrown (?:in \[strict mode\]\(/en-US/docs/Web/JavaScript/Reference/Strict_mode\) )?in one of the following cases:",
    )
    .expect("valid regex")
});

/// A pattern as shown to readers: escaped metacharacters unescaped.
fn print_pattern(pattern: &str) -> String {
    ESCAPED_META.replace_all(pattern, "$1").into_owned()
}

/// The syntax block a callable with these parameters should have: one line
/// per accepted argument count, `new` forms first for constructors.
pub(crate) fn expected_syntax(name: &str, parameters: &Parameters, usage: Usage) -> String {
    let callee = if name.starts_with('[') {
        format!(r"\w+{}", regex::escape(name))
    } else if KEYWORDS.contains(&name) {
        format!(r"\w+(?:Instance|Value)\.{}", name)
    } else {
        regex::escape(name)
    };

    let base = r"\w+, ".repeat(parameters.required as usize);
    let with_optional: Vec<String> = (0..=parameters.optional as usize)
        .map(|extra| format!("{}{}", base, r"\w+, ".repeat(extra)))
        .collect();
    let all_fixed = with_optional.last().cloned().unwrap_or_default();

    let mut lists = with_optional;
    if parameters.rest {
        // The Function constructor takes its rest parameters first
        let rest_first = name.contains("Function");
        for rest in [r"\w+1, ", r"\w+1, \w+2, ", r"\w+1, \w+2, /\* …, \*/ \w+N, "] {
            lists.push(if rest_first {
                format!("{}{}", rest, all_fixed)
            } else {
                format!("{}{}", all_fixed, rest)
            });
        }
    }
    let calls: Vec<String> = lists
        .iter()
        .map(|list| format!(r"{}\({}\)", callee, list.strip_suffix(", ").unwrap_or(list)))
        .collect();

    let lines: Vec<String> = match usage {
        Usage::Call => calls,
        Usage::Construct => calls.iter().map(|c| format!("new {}", c)).collect(),
        Usage::Equivalent | Usage::Different => calls
            .iter()
            .map(|c| format!("new {}", c))
            .chain(calls.iter().cloned())
            .collect(),
        Usage::None => Vec::new(),
    };
    format!("^{}$", lines.join("\n+"))
}

/// The usage note a constructor page should carry, as a pattern.
fn note_pattern(catalog: &Catalog, ctor: &str) -> Result<String, String> {
    let equivalent = || {
        regex::escape(&format!(
            "`{ctor}()` can be called with or without {NEW_LINK}. Both create a new `{ctor}` instance."
        ))
    };
    let construct = || {
        regex::escape(&format!(
            "`{ctor}()` can only be constructed with {NEW_LINK}. Attempting to call it without `new` throws a {{{{jsxref(\"TypeError\")}}}}."
        ))
    };
    let call = || {
        regex::escape(&format!(
            "`{ctor}()` can only be called without {NEW_LINK}. Attempting to construct it with `new` throws a {{{{jsxref(\"TypeError\")}}}}."
        ))
    };
    let different = || {
        format!(
            "{}(?:sometimes )?{}",
            regex::escape(&format!("`{ctor}()` can be called with or without {NEW_LINK}, but ")),
            regex::escape("with different effects. See [Return value](#return_value).")
        )
    };

    match ctor {
        "Intl.DateTimeFormat" | "Intl.NumberFormat" => Ok(regex::escape(&format!(
            "`{ctor}()` can be called with or without {NEW_LINK}. Both create a new `{ctor}` instance. However, there's a special behavior when it's called without `new` and the `this` value is another `{ctor}` instance; see [Return value](#return_value)."
        ))),
        "Intl.Collator" | "InternalError" => Ok(equivalent()),
        _ if ctor.starts_with("Intl") => Ok(construct()),
        "Iterator" => Ok(format!(
            "{}{}",
            construct(),
            regex::escape(
                " In addition, `Iterator()` cannot actually be constructed itself — it's usually implicitly constructed through [`super()`](/en-US/docs/Web/JavaScript/Reference/Operators/super) calls inside the constructor of a subclass."
            )
        )),
        _ => {
            let usage = match find_entity(catalog, ctor) {
                Some(GlobalEntity::Class(class)) => class.constructor.as_ref().map(|c| c.usage),
                _ => None,
            };
            match usage {
                Some(Usage::Equivalent) => Ok(equivalent()),
                Some(Usage::Construct) => Ok(construct()),
                Some(Usage::Call) => Ok(call()),
                Some(Usage::Different) => Ok(different()),
                Some(Usage::None) => Err("Abstract classes should not have constructor page".to_string()),
                None => Err(format!("{} is not a known global class", ctor)),
            }
        }
    }
}

/// An instance method by documented title. Iterator helpers are specified
/// on `%IteratorPrototype%` rather than on a class.
fn find_instance_method<'a>(catalog: &'a Catalog, owner: &str, title: &str) -> Option<&'a Method> {
    if let Some(GlobalEntity::Class(class)) = find_entity(catalog, owner) {
        return class
            .instance_methods
            .iter()
            .find(|m| documented_name(&m.name) == title);
    }
    let prototype = format!("%{}Prototype%", owner);
    let documented_prototype = format!("{}.prototype", owner);
    catalog
        .namespace(&prototype)?
        .static_methods
        .iter()
        .find(|m| documented_name(&m.name.replace(&prototype, &documented_prototype)) == title)
}

/// The callee name, parameters and usage the syntax block of this page
/// should be checked against.
fn callable(cx: &mut FileContext<'_>) -> Option<(String, Parameters, Usage)> {
    let catalog = cx.catalog();
    let title = cx.title();
    match cx.page_type() {
        PageType::JavascriptFunction => match catalog.function(title) {
            Some(function) => Some((
                title.trim_end_matches("()").to_string(),
                function.parameters,
                Usage::Call,
            )),
            None => {
                cx.report("Does not correlate to known intrinsic");
                None
            }
        },
        PageType::JavascriptConstructor => {
            let name = title.trim_end_matches(" constructor");
            let found = catalog.iter().find_map(|entity| match entity {
                GlobalEntity::Class(class) => class
                    .constructor
                    .as_ref()
                    .filter(|c| documented_name(&c.name) == name),
                _ => None,
            });
            match found {
                Some(ctor) => Some((
                    name.trim_end_matches("()").to_string(),
                    ctor.parameters,
                    ctor.usage,
                )),
                None => {
                    cx.report("Does not correlate to known intrinsic");
                    None
                }
            }
        }
        PageType::JavascriptInstanceMethod => {
            let Some(owner) = PROTOTYPE_OWNER.captures(title).map(|c| c[1].to_string()) else {
                cx.report("Could not find class name");
                return None;
            };
            let Some(method) = find_instance_method(catalog, &owner, title) else {
                cx.report("Does not correlate to known intrinsic");
                return None;
            };
            let name = METHOD_NAME.captures(title).and_then(|c| {
                c.get(1)
                    .or_else(|| c.get(2))
                    .map(|m| m.as_str().to_string())
            })?;
            Some((name, method.parameters, Usage::Call))
        }
        PageType::JavascriptStaticMethod => {
            let Some(owner) = STATIC_OWNER.captures(title).map(|c| c[1].to_string()) else {
                cx.report("Could not find class name");
                return None;
            };
            let method = find_entity(catalog, &owner).and_then(|entity| {
                entity
                    .static_methods()
                    .iter()
                    .find(|m| documented_name(&m.name) == title)
            });
            match method {
                Some(method) => Some((
                    title.trim_end_matches("()").to_string(),
                    method.parameters,
                    Usage::Call,
                )),
                None => {
                    cx.report("Does not correlate to known intrinsic");
                    None
                }
            }
        }
        _ => None,
    }
}

fn check_syntax(cx: &mut FileContext<'_>, code: &str) {
    // Intl is not part of the ECMAScript catalog
    if cx.title().starts_with("Intl") {
        return;
    }
    let Some((name, parameters, usage)) = callable(cx) else {
        return;
    };
    let pattern = expected_syntax(&name, &parameters, usage);
    let matches = Regex::new(&pattern).is_ok_and(|re| re.is_match(code));
    if !matches {
        cx.report(format!("Expected syntax: {}", print_pattern(&pattern)));
    }
}

fn check_constructor_note(cx: &mut FileContext<'_>, note: Option<&Block>) {
    let Some(note) = note.filter(|b| b.kind == BlockKind::Callout(CalloutKind::Note)) else {
        cx.report("Missing note about constructor");
        return;
    };
    let ctor = cx.title().trim_end_matches("() constructor");
    let pattern = match note_pattern(cx.catalog(), ctor) {
        Ok(pattern) => pattern,
        Err(message) => {
            cx.report(message);
            return;
        }
    };
    let text = cx.page().callout_text(note).unwrap_or_default();
    let matches = Regex::new(&pattern).is_ok_and(|re| re.is_match(text.trim()));
    if !matches {
        cx.report(format!(
            "Note about constructor is wrong. Should be: {}",
            print_pattern(&pattern)
        ));
    }
}

fn check_exceptions(cx: &mut FileContext<'_>, blocks: &[Block]) {
    let title = cx.title();
    let ctor = title.trim_end_matches("() constructor");
    if ctor != "TypedArray" && cx.catalog().inherits_from(ctor, "TypedArray") {
        let correct = blocks.len() == 1 && cx.text(&blocks[0]).trim() == TYPED_ARRAY_EXCEPTIONS;
        if !correct {
            cx.report("TypedArray Exceptions incorrect");
        }
        return;
    }

    let list = match blocks {
        [list] if list.kind == BlockKind::DescriptionList => list,
        _ => {
            if !FREE_FORM_EXCEPTIONS.contains(&title) {
                cx.report("Exceptions section must be a single dl");
            }
            return;
        }
    };

    for (term, details) in list.definitions() {
        if !KNOWN_ERROR.is_match(cx.text(term).trim()) {
            cx.report("Exceptions section must contain known errors");
        }
        let Some(details) = details else {
            continue;
        };
        let text = cx.text(details).trim();
        match details.children.as_slice() {
            [_] => {
                if !THROWN_IF.is_match(text) {
                    cx.report("Exception description must start with 'Thrown if'");
                }
            }
            [_, cases] if matches!(cases.kind, BlockKind::List { .. }) => {
                if !THROWN_IN_CASES.is_match(text) {
                    cx.report(
                        "Exception description must start with 'Thrown in one of the following cases:'",
                    );
                }
            }
            _ => cx.report("Unknown exception description structure"),
        }
    }
}

/// The Syntax section opens with a `js-nolint` block matching the
/// specified parameters, constructors carry their usage note, and
/// exceptions are listed in a definition list.
pub struct SyntaxSection;

impl Rule for SyntaxSection {
    fn name(&self) -> &'static str {
        "syntax-section"
    }

    fn applies_to(&self, _cx: &FileContext<'_>) -> bool {
        true
    }

    fn check(&self, cx: &mut FileContext<'_>) {
        let Some(syntax) = cx.section("Syntax") else {
            return;
        };
        let blocks: Vec<&Block> = cx
            .section_blocks(syntax)
            .iter()
            .filter(|b| !b.is_html_comment())
            .collect();

        let Some(first) = blocks.first().filter(|b| matches!(b.kind, BlockKind::Code { .. })) else {
            cx.report("Missing syntax");
            return;
        };
        let BlockKind::Code { lang } = &first.kind else {
            return;
        };
        let regex_page = cx.path().to_string_lossy().contains("reference/regular_expressions");
        if lang == "js-nolint" || (regex_page && lang == "regex") {
            check_syntax(cx, first.text.trim_end_matches('\n'));
        } else {
            cx.report("Syntax uses wrong language");
        }

        if cx.page_type() == PageType::JavascriptConstructor {
            check_constructor_note(cx, blocks.get(1).copied());
        }

        if let Some(exceptions) = syntax.child("Exceptions") {
            let blocks = cx.section_blocks(exceptions);
            check_exceptions(cx, blocks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::*;
    use indoc::{formatdoc, indoc};

    fn params(required: u32, optional: u32, rest: bool) -> Parameters {
        Parameters {
            required,
            optional,
            rest,
        }
    }

    #[test]
    fn test_expected_syntax_shapes() {
        assert_eq!(expected_syntax("at", &params(1, 0, false), Usage::Call), r"^at\(\w+\)$");
        assert_eq!(
            expected_syntax("Array.from", &params(1, 1, false), Usage::Call),
            concat!(r"^Array\.from\(\w+\)", "\n+", r"Array\.from\(\w+, \w+\)$")
        );
        assert_eq!(
            expected_syntax("[Symbol.iterator]", &params(0, 0, false), Usage::Call),
            r"^\w+\[Symbol\.iterator\]\(\)$"
        );
        assert_eq!(
            expected_syntax("delete", &params(1, 0, false), Usage::Call),
            r"^\w+(?:Instance|Value)\.delete\(\w+\)$"
        );
        assert_eq!(expected_syntax("X", &params(0, 0, false), Usage::None), "^$");
    }

    #[test]
    fn test_rest_and_constructor_forms() {
        let push = Regex::new(&expected_syntax("push", &params(0, 0, true), Usage::Call)).unwrap();
        assert!(push.is_match(indoc! {"
            push()
            push(element1)
            push(element1, element2)
            push(element1, element2, /* …, */ elementN)"}));

        let function = Regex::new(&expected_syntax("Function", &params(0, 1, true), Usage::Equivalent)).unwrap();
        let lines = [
            "Function()",
            "Function(functionBody)",
            "Function(arg1, functionBody)",
            "Function(arg1, arg2, functionBody)",
            "Function(arg1, arg2, /* …, */ argN, functionBody)",
        ];
        let code = lines
            .iter()
            .map(|l| format!("new {l}"))
            .chain(lines.iter().map(|l| l.to_string()))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(function.is_match(&code));
    }

    #[test]
    fn test_print_pattern() {
        assert_eq!(print_pattern(r"^at\(\w+\)$"), r"^at(\w+)$");
    }

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
                "staticProperties": [],
                "staticMethods": [
                  { "name": "Array.from()", "parameters": { "required": 1, "optional": 2, "rest": false } }
                ],
                "prototypeProperties": [],
                "instanceMethods": [
                  { "name": "Array.prototype.at()", "parameters": { "required": 1, "optional": 0, "rest": false } },
                  { "name": "Array.prototype[%Symbol.iterator%]()", "parameters": { "required": 0, "optional": 0, "rest": false } }
                ],
                "instanceProperties": []
              },
              {
                "type": "class",
                "name": "%TypedArray%",
                "global": false,
                "constructor": {
                  "name": "%TypedArray%()",
                  "parameters": { "required": 0, "optional": 0, "rest": true },
                  "usage": "none"
                },
                "staticProperties": [],
                "staticMethods": [],
                "prototypeProperties": [],
                "instanceMethods": [],
                "instanceProperties": []
              },
              {
                "type": "class",
                "name": "Int8Array",
                "global": true,
                "extends": "TypedArray",
                "constructor": {
                  "name": "Int8Array()",
                  "parameters": { "required": 0, "optional": 3, "rest": false },
                  "usage": "construct"
                },
                "staticProperties": [],
                "staticMethods": [],
                "prototypeProperties": [],
                "instanceMethods": [],
                "instanceProperties": []
              },
              {
                "type": "function",
                "name": "parseInt()",
                "parameters": { "required": 1, "optional": 1, "rest": false },
                "global": true
              }
            ]
        "#})
        .unwrap()
    }

    fn check_page(dir: &str, title: &str, page_type: &str, body: &str) -> Vec<String> {
        let run = run_context(catalog(), vec![page(dir, title, page_type, body)]);
        check(&SyntaxSection, &run, dir).unwrap()
    }

    #[test]
    fn test_method_syntax() {
        let ok = "## Syntax\n\n<!-- note -->\n\n```js-nolint\nat(index)\n```\n";
        assert!(check_page("Reference/Global_Objects/Array/at", "Array.prototype.at()", "javascript-instance-method", ok).is_empty());

        let wrong_lang = "## Syntax\n\n```js\nat(index)\n```\n";
        assert_eq!(
            check_page("Reference/Global_Objects/Array/at", "Array.prototype.at()", "javascript-instance-method", wrong_lang),
            vec!["Syntax uses wrong language"]
        );

        let wrong_arity = "## Syntax\n\n```js-nolint\nat()\n```\n";
        assert_eq!(
            check_page("Reference/Global_Objects/Array/at", "Array.prototype.at()", "javascript-instance-method", wrong_arity),
            vec![r"Expected syntax: ^at(\w+)$"]
        );

        let iterator = "## Syntax\n\n```js-nolint\narray[Symbol.iterator]()\n```\n";
        assert!(check_page(
            "Reference/Global_Objects/Array/Symbol.iterator",
            "Array.prototype[Symbol.iterator]()",
            "javascript-instance-method",
            iterator
        )
        .is_empty());
    }

    #[test]
    fn test_unknown_and_missing() {
        let body = "## Syntax\n\n```js-nolint\nflat()\n```\n";
        assert_eq!(
            check_page("Reference/Global_Objects/Array/flat", "Array.prototype.flat()", "javascript-instance-method", body),
            vec!["Does not correlate to known intrinsic"]
        );
        assert_eq!(
            check_page("Reference/Global_Objects/parseInt", "parseInt()", "javascript-function", "## Syntax\n\nNo code.\n"),
            vec!["Missing syntax"]
        );
    }

    #[test]
    fn test_static_method_and_function() {
        let from = indoc! {"
            ## Syntax

            ```js-nolint
            Array.from(arrayLike)
            Array.from(arrayLike, mapFn)
            Array.from(arrayLike, mapFn, thisArg)
            ```
        "};
        assert!(check_page("Reference/Global_Objects/Array/from", "Array.from()", "javascript-static-method", from).is_empty());

        let parse_int = "## Syntax\n\n```js-nolint\nparseInt(string)\nparseInt(string, radix)\n```\n";
        assert!(check_page("Reference/Global_Objects/parseInt", "parseInt()", "javascript-function", parse_int).is_empty());
    }

    #[test]
    fn test_constructor_note() {
        let syntax = indoc! {"
            ```js-nolint
            new Array()
            new Array(element1)
            new Array(element1, element2)
            new Array(element1, element2, /* …, */ elementN)
            Array()
            Array(element1)
            Array(element1, element2)
            Array(element1, element2, /* …, */ elementN)
            ```
        "};
        let good = formatdoc! {"
            ## Syntax

            {syntax}
            > [!NOTE]
            > `Array()` can be called with or without [`new`](/en-US/docs/Web/JavaScript/Reference/Operators/new). Both create a new `Array` instance.
        "};
        assert!(check_page("Reference/Global_Objects/Array/Array", "Array() constructor", "javascript-constructor", &good).is_empty());

        let missing = format!("## Syntax\n\n{syntax}");
        assert_eq!(
            check_page("Reference/Global_Objects/Array/Array", "Array() constructor", "javascript-constructor", &missing),
            vec!["Missing note about constructor"]
        );

        let wrong = format!("## Syntax\n\n{syntax}\n> **Note:** `Array()` can only be called with `new`.\n");
        let messages = check_page("Reference/Global_Objects/Array/Array", "Array() constructor", "javascript-constructor", &wrong);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Note about constructor is wrong. Should be: `Array()` can be called"));
    }

    #[test]
    fn test_abstract_constructor_page() {
        let body = "## Syntax\n\n```js-nolint\nnew TypedArray()\n```\n\n> **Note:** Anything.\n";
        let messages = check_page(
            "Reference/Global_Objects/TypedArray/TypedArray",
            "TypedArray() constructor",
            "javascript-constructor",
            body,
        );
        assert!(messages.contains(&"Abstract classes should not have constructor page".to_string()));
    }

    #[test]
    fn test_exceptions() {
        let body = indoc! {r#"
            ## Syntax

            ```js-nolint
            at(index)
            ```

            ### Exceptions

            - {{jsxref("RangeError")}}
              - : Thrown if `index` is too large.
            - {{jsxref("Error")}}
              - : Sometimes thrown.
            - {{jsxref("TypeError")}}
              - : Thrown in one of the following cases:
                - the receiver is detached.
        "#};
        assert_eq!(
            check_page("Reference/Global_Objects/Array/at", "Array.prototype.at()", "javascript-instance-method", body),
            vec![
                "Exceptions section must contain known errors",
                "Exception description must start with 'Thrown if'",
            ]
        );

        let prose = "## Syntax\n\n```js-nolint\nat(index)\n```\n\n### Exceptions\n\nIt throws.\n";
        assert_eq!(
            check_page("Reference/Global_Objects/Array/at", "Array.prototype.at()", "javascript-instance-method", prose),
            vec!["Exceptions section must be a single dl"]
        );
    }

    #[test]
    fn test_typed_array_exceptions() {
        let body = indoc! {"
            ## Syntax

            ```js-nolint
            new Int8Array()
            new Int8Array(length)
            new Int8Array(typedArray, byteOffset)
            new Int8Array(buffer, byteOffset, length)
            ```

            > [!NOTE]
            > `Int8Array()` can only be constructed with [`new`](/en-US/docs/Web/JavaScript/Reference/Operators/new). Attempting to call it without `new` throws a {{jsxref(\"TypeError\")}}.

            ### Exceptions

            See [`TypedArray`](/en-US/docs/Web/JavaScript/Reference/Global_Objects/TypedArray#exceptions).
        "};
        assert!(check_page(
            "Reference/Global_Objects/Int8Array/Int8Array",
            "Int8Array() constructor",
            "javascript-constructor",
            body
        )
        .is_empty());
    }
}
