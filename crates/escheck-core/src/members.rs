//! Parsing of member sections into properties, methods and constructors.
//!
//! Titles carry the name and the parameter list; everything else (attribute
//! flags, explicit `length`, how a constructor may be invoked, the parent
//! class) comes from fixed normative sentences directly under the member's
//! section.

use crate::catalog::{
    AccessorAttributes, Constructor, DataAttributes, Method, Parameters, Property, Usage,
};
use crate::error::{Result, StructuralError};
use crate::section::Section;
use crate::source::SpecSource;
use regex::Regex;
use std::sync::LazyLock;

static SIGNATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\((.*)\)").expect("valid regex"));

static ATTRIBUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"has the attributes \{ \[\[Writable\]\]: \*(true|false)\*, \[\[Enumerable\]\]: \*(true|false)\*, \[\[Configurable\]\]: \*(true|false)\* \}\.",
    )
    .expect("valid regex")
});

static METHOD_LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"The \*"length"\* property of this (?:method|function) is \*(\d+)\*"#)
        .expect("valid regex")
});

static CONSTRUCTOR_LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"has a \*"length"\* property whose value is \*(\d+)\*"#).expect("valid regex")
});

static FUNCTION_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"with a value of (\d+)").expect("valid regex"));

static PROTOTYPE_SLOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"has a \[\[Prototype\]\] internal slot whose value is %([^%]+)%")
        .expect("valid regex")
});

/// Drop every space that does not follow a comma.
fn squeeze(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut prev = None;
    for c in title.chars() {
        if c != ' ' || prev == Some(',') {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Split a member title such as `Array.prototype.slice ( start, end )` into
/// its callable name (`Array.prototype.slice()`) and arity.
///
/// Optional parameters are bracket-nested and a rest parameter is marked by
/// `...`. An empty parameter list has no required parameters.
pub fn parse_parameters(title: &str) -> Result<(String, Parameters)> {
    let squeezed = squeeze(title);
    let caps = SIGNATURE
        .captures(&squeezed)
        .ok_or_else(|| StructuralError::UnparseableSignature {
            title: title.to_string(),
        })?;
    let name = &caps[1];
    let list = &caps[2];

    let count = if list.is_empty() {
        0
    } else {
        list.split(',').count() as u32
    };
    let optional = list.matches('[').count() as u32;
    let rest = list.contains("...");
    let required = count.saturating_sub(optional + u32::from(rest));
    Ok((
        format!("{name}()"),
        Parameters {
            required,
            optional,
            rest,
        },
    ))
}

/// The single paragraph under `section` containing `needle`, if any.
fn unique_sentence<'a>(
    section: &Section,
    texts: &'a [String],
    needle: &str,
    kind: &'static str,
) -> Result<Option<&'a str>> {
    let mut found = texts.iter().filter(|t| t.contains(needle));
    let first = found.next();
    if found.next().is_some() {
        return Err(StructuralError::DuplicateSentence {
            section: section.title.clone(),
            kind,
        });
    }
    Ok(first.map(String::as_str))
}

fn capture_number(section: &Section, pattern: &Regex, text: &str) -> Result<u32> {
    pattern
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| StructuralError::UnparseableSentence {
            section: section.title.clone(),
            text: text.to_string(),
        })
}

/// The attribute flags stated under `section`, or `None` when the section
/// does not state them.
pub fn data_attributes(
    source: &impl SpecSource,
    section: &Section,
) -> Result<Option<DataAttributes>> {
    let paragraphs = source.paragraphs(&section.id);
    let Some(text) = unique_sentence(section, &paragraphs, "has the attributes", "attributes")?
    else {
        return Ok(None);
    };
    let caps = ATTRIBUTES
        .captures(text)
        .ok_or_else(|| StructuralError::UnparseableSentence {
            section: section.title.clone(),
            text: text.to_string(),
        })?;
    Ok(Some(DataAttributes::new(
        &caps[1] == "true",
        &caps[2] == "true",
        &caps[3] == "true",
    )))
}

/// The normative `length` of a method, when stated explicitly.
pub fn method_length(source: &impl SpecSource, section: &Section) -> Result<Option<u32>> {
    let paragraphs = source.paragraphs(&section.id);
    unique_sentence(
        section,
        &paragraphs,
        r#"The *"length"* property of this"#,
        "length",
    )?
    .map(|text| capture_number(section, &METHOD_LENGTH, text))
    .transpose()
}

/// The normative `length` of a constructor, stated in the bullet list of the
/// constructor section.
pub fn constructor_length(source: &impl SpecSource, section: &Section) -> Result<Option<u32>> {
    let items = source.list_items(&section.id);
    unique_sentence(
        section,
        &items,
        r#"has a *"length"* property whose"#,
        "length",
    )?
    .map(|text| capture_number(section, &CONSTRUCTOR_LENGTH, text))
    .transpose()
}

/// The constructor length carried by a `Foo.length` static property section
/// (`… with a value of N`).
pub fn function_length(source: &impl SpecSource, section: &Section) -> Result<u32> {
    let paragraphs = source.paragraphs(&section.id);
    match paragraphs.as_slice() {
        [text] => capture_number(section, &FUNCTION_LENGTH, text),
        _ => Err(StructuralError::DuplicateSentence {
            section: section.title.clone(),
            kind: "length",
        }),
    }
}

/// Classify how a constructor may be invoked from the prose of its section.
///
/// Checks run in order and the first hit wins; a constructor with no such
/// sentence is only meant for `new`.
pub fn classify_usage<S: AsRef<str>>(texts: &[S]) -> Usage {
    const PATTERNS: &[(&str, Usage)] = &[
        ("abstract class constructor", Usage::None),
        ("abstract superclass", Usage::None),
        ("is equivalent to the object creation expression", Usage::Equivalent),
        ("not intended to be used with the `new` operator", Usage::Call),
        ("not intended to be called as a function", Usage::Construct),
        (
            "when called as a function rather than as a constructor",
            Usage::Different,
        ),
    ];
    PATTERNS
        .iter()
        .find(|(needle, _)| texts.iter().any(|t| t.as_ref().contains(needle)))
        .map_or(Usage::Construct, |(_, usage)| *usage)
}

/// The parent class named by a `[[Prototype]]` sentence under `section`.
///
/// `Function.prototype` is the default and yields `None`.
pub fn parent_class(source: &impl SpecSource, section: &Section) -> Option<String> {
    source
        .paragraphs(&section.id)
        .into_iter()
        .chain(source.list_items(&section.id))
        .find_map(|text| {
            PROTOTYPE_SLOT
                .captures(&text)
                .map(|c| c[1].to_string())
        })
        .filter(|parent| parent != "Function.prototype")
}

/// Build a method from its section.
pub fn make_method(source: &impl SpecSource, section: &Section) -> Result<Method> {
    let attributes = data_attributes(source, section)?;
    let (name, parameters) = parse_parameters(&section.title)?;
    let length = method_length(source, section)?;
    Ok(Method {
        name,
        parameters,
        length,
        attributes,
    })
}

/// Build a property from its section.
///
/// A section holding a `get`/`set` pair, or titled as one half of a pair,
/// becomes an accessor; anything else is a data property, writable and
/// configurable unless stated otherwise.
pub fn make_property(source: &impl SpecSource, section: &Section) -> Result<Property> {
    let title = &section.title;
    if section.has_accessor_pair() {
        return Ok(Property::AccessorProperty {
            name: title.replace(' ', ""),
            attributes: AccessorAttributes::new(true, true, false, true),
        });
    }
    if section.is_accessor_half() {
        let get = title.starts_with("get ");
        return Ok(Property::AccessorProperty {
            name: title[4..].replace(' ', ""),
            attributes: AccessorAttributes::new(get, !get, false, true),
        });
    }
    Ok(Property::DataProperty {
        name: title.replace(' ', ""),
        attributes: data_attributes(source, section)?.unwrap_or(DataAttributes::DEFAULT_MEMBER),
    })
}

/// Build the constructor from a `The … Constructor` section.
///
/// The section's first child must be the constructor's own signature.
pub fn make_constructor(source: &impl SpecSource, section: &Section) -> Result<Constructor> {
    let signature = section
        .children
        .first()
        .filter(|c| c.is_callable())
        .ok_or_else(|| StructuralError::MissingConstructorSignature {
            section: section.title.clone(),
        })?;
    let (name, parameters) = parse_parameters(&signature.title)?;
    let length = constructor_length(source, section)?;
    let prose: Vec<String> = source
        .list_items(&section.id)
        .into_iter()
        .chain(source.paragraphs(&section.id))
        .collect();
    Ok(Constructor {
        name,
        parameters,
        length,
        usage: classify_usage(&prose),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Prose {
        paragraphs: HashMap<&'static str, Vec<String>>,
        items: HashMap<&'static str, Vec<String>>,
    }

    impl Prose {
        fn para(mut self, id: &'static str, text: &str) -> Self {
            self.paragraphs.entry(id).or_default().push(text.to_string());
            self
        }
        fn item(mut self, id: &'static str, text: &str) -> Self {
            self.items.entry(id).or_default().push(text.to_string());
            self
        }
    }

    impl SpecSource for Prose {
        fn sections(&self) -> Vec<Section> {
            Vec::new()
        }
        fn paragraphs(&self, id: &str) -> Vec<String> {
            self.paragraphs.get(id).cloned().unwrap_or_default()
        }
        fn list_items(&self, id: &str) -> Vec<String> {
            self.items.get(id).cloned().unwrap_or_default()
        }
        fn definitions(&self, _id: &str) -> Vec<String> {
            Vec::new()
        }
    }

    fn leaf(title: &str, id: &str) -> Section {
        Section::new(title, id, Vec::new())
    }

    fn params(required: u32, optional: u32, rest: bool) -> Parameters {
        Parameters {
            required,
            optional,
            rest,
        }
    }

    #[test]
    fn test_parse_parameters() {
        assert_eq!(
            parse_parameters("f ( a, b [ , c ] )").unwrap(),
            ("f()".to_string(), params(2, 1, false))
        );
        assert_eq!(
            parse_parameters("f ( ...rest )").unwrap(),
            ("f()".to_string(), params(0, 0, true))
        );
        assert_eq!(
            parse_parameters("f ( a, ...rest )").unwrap(),
            ("f()".to_string(), params(1, 0, true))
        );
        assert_eq!(
            parse_parameters("Array.prototype.splice ( start, deleteCount, ...items )").unwrap(),
            ("Array.prototype.splice()".to_string(), params(2, 0, true))
        );
        assert_eq!(
            parse_parameters("Date ( ...values )").unwrap().1,
            params(0, 0, true)
        );
    }

    #[test]
    fn test_parse_parameters_nested_optionals() {
        let (name, p) =
            parse_parameters("Array.prototype.indexOf ( searchElement [ , fromIndex [ , x ] ] )")
                .unwrap();
        assert_eq!(name, "Array.prototype.indexOf()");
        assert_eq!(p, params(1, 2, false));
        assert_eq!(p.total(), 3);
    }

    #[test]
    fn test_parse_parameters_empty_list() {
        assert_eq!(
            parse_parameters("Array.prototype.pop ( )").unwrap(),
            ("Array.prototype.pop()".to_string(), params(0, 0, false))
        );
    }

    #[test]
    fn test_parse_parameters_keeps_well_known_symbol_names() {
        let (name, p) = parse_parameters("Array.prototype [ %Symbol.iterator% ] ( )").unwrap();
        assert_eq!(name, "Array.prototype[%Symbol.iterator%]()");
        assert_eq!(p, params(0, 0, false));
    }

    #[test]
    fn test_parse_parameters_rejects_plain_names() {
        assert!(matches!(
            parse_parameters("Math.PI"),
            Err(StructuralError::UnparseableSignature { .. })
        ));
    }

    #[test]
    fn test_data_attributes() {
        let prose = Prose::default().para(
            "sec-math.pi",
            "This property has the attributes { [[Writable]]: *false*, [[Enumerable]]: *false*, [[Configurable]]: *false* }.",
        );
        let section = leaf("Math.PI", "sec-math.pi");
        assert_eq!(
            data_attributes(&prose, &section).unwrap(),
            Some(DataAttributes::new(false, false, false))
        );
        assert_eq!(data_attributes(&prose, &leaf("x", "none")).unwrap(), None);
    }

    #[test]
    fn test_duplicate_attribute_sentences_fail() {
        let text = "It has the attributes { [[Writable]]: *true*, [[Enumerable]]: *false*, [[Configurable]]: *true* }.";
        let prose = Prose::default().para("p", text).para("p", text);
        let err = data_attributes(&prose, &leaf("X.y", "p")).unwrap_err();
        assert_eq!(err.to_string(), "Expected X.y to have 1 attributes paragraph");
    }

    #[test]
    fn test_unparseable_attribute_sentence_fails() {
        let prose = Prose::default().para("p", "This has the attributes of a plain object.");
        assert!(matches!(
            data_attributes(&prose, &leaf("X.y", "p")),
            Err(StructuralError::UnparseableSentence { .. })
        ));
    }

    #[test]
    fn test_method_length_override() {
        let prose = Prose::default().para(
            "sec-array.prototype.push",
            r#"The *"length"* property of this method is *1*𝔽."#,
        );
        let section = leaf("Array.prototype.push ( ...items )", "sec-array.prototype.push");
        let method = make_method(&prose, &section).unwrap();
        assert_eq!(method.parameters, params(0, 0, true));
        assert_eq!(method.length, Some(1));
        assert_eq!(method.length(), 1);
    }

    #[test]
    fn test_make_property_kinds() {
        let prose = Prose::default();
        let pair = Section::new(
            "Object.prototype.__proto__",
            "sec-object.prototype.__proto__",
            vec![
                leaf("get Object.prototype.__proto__", "g"),
                leaf("set Object.prototype.__proto__", "s"),
            ],
        );
        assert_eq!(
            make_property(&prose, &pair).unwrap(),
            Property::AccessorProperty {
                name: "Object.prototype.__proto__".to_string(),
                attributes: AccessorAttributes::parse("gsc").unwrap(),
            }
        );

        let getter = leaf("get Map.prototype.size", "sec-get-map.prototype.size");
        assert_eq!(
            make_property(&prose, &getter).unwrap(),
            Property::AccessorProperty {
                name: "Map.prototype.size".to_string(),
                attributes: AccessorAttributes::parse("gc").unwrap(),
            }
        );

        let data = leaf("Array.prototype [ %Symbol.unscopables% ]", "u");
        assert_eq!(
            make_property(&prose, &data).unwrap(),
            Property::DataProperty {
                name: "Array.prototype[%Symbol.unscopables%]".to_string(),
                attributes: DataAttributes::DEFAULT_MEMBER,
            }
        );
    }

    #[test]
    fn test_classify_usage() {
        assert_eq!(
            classify_usage(&["is not intended to be used with the `new` operator."]),
            Usage::Call
        );
        assert_eq!(
            classify_usage(&[
                "creates and initializes a new Array when called as a constructor.",
                "also creates and initializes a new Array when called as a function rather than as a constructor. Thus the function call `Array(…)` is equivalent to the object creation expression `new Array(…)` with the same arguments.",
            ]),
            Usage::Equivalent
        );
        assert_eq!(
            classify_usage(&["returns a String when called as a function rather than as a constructor."]),
            Usage::Different
        );
        assert_eq!(
            classify_usage(&["is not intended to be called as a function and will throw an exception when called in that manner."]),
            Usage::Construct
        );
        assert_eq!(
            classify_usage(&["is an abstract class constructor."]),
            Usage::None
        );
        assert_eq!(classify_usage::<&str>(&[]), Usage::Construct);
    }

    #[test]
    fn test_make_constructor() {
        let prose = Prose::default()
            .item("sec-map-constructor", "is %Map%.")
            .item(
                "sec-map-constructor",
                "is not intended to be called as a function and will throw an exception when called in that manner.",
            );
        let section = Section::new(
            "The Map Constructor",
            "sec-map-constructor",
            vec![leaf("Map ( [ iterable ] )", "sec-map-iterable")],
        );
        let ctor = make_constructor(&prose, &section).unwrap();
        assert_eq!(ctor.name, "Map()");
        assert_eq!(ctor.parameters, params(0, 1, false));
        assert_eq!(ctor.usage, Usage::Construct);
        assert_eq!(ctor.length, None);
    }

    #[test]
    fn test_constructor_requires_signature_first() {
        let section = Section::new(
            "The Foo Constructor",
            "sec-foo",
            vec![leaf("Properties of Foo", "x")],
        );
        assert!(matches!(
            make_constructor(&Prose::default(), &section),
            Err(StructuralError::MissingConstructorSignature { .. })
        ));
    }

    #[test]
    fn test_parent_class() {
        let prose = Prose::default()
            .item(
                "sec-properties-of-the-nativeerror-constructors",
                "has a [[Prototype]] internal slot whose value is %Error%.",
            )
            .item(
                "sec-properties-of-the-array-constructor",
                "has a [[Prototype]] internal slot whose value is %Function.prototype%.",
            );
        assert_eq!(
            parent_class(&prose, &leaf("n", "sec-properties-of-the-nativeerror-constructors")),
            Some("Error".to_string())
        );
        assert_eq!(
            parent_class(&prose, &leaf("a", "sec-properties-of-the-array-constructor")),
            None
        );
    }
}
