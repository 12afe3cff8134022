//! Catalog extraction from the specification's clause tree.
//!
//! The extractor is deliberately strict: every structural assumption it makes
//! about the document is checked, and the first violation aborts the run
//! with a [`StructuralError`] instead of producing a partial catalog.

use crate::catalog::{
    Catalog, Class, Function, GlobalEntity, GlobalProperty, Method, Namespace, Property,
};
use crate::error::{Result, StructuralError};
use crate::members::{
    data_attributes, function_length, make_constructor, make_method, make_property,
    method_length, parent_class, parse_parameters,
};
use crate::section::Section;
use crate::source::SpecSource;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info};

/// First and last top-level clauses (inclusive) holding the built-in objects.
const FIRST_OBJECT_CLAUSE: &str = "Fundamental Objects";
const LAST_OBJECT_CLAUSE: &str = "Reflection";

const GLOBAL_OBJECT: &str = "The Global Object";
const GLOBAL_OBJECT_PARTS: [&str; 4] = [
    "Value Properties of the Global Object",
    "Function Properties of the Global Object",
    "Constructor Properties of the Global Object",
    "Other Properties of the Global Object",
];

const TYPED_ARRAY_TEMPLATE: &str = "_TypedArray_";
const TYPED_ARRAY_KINDS: &str = "table-the-typedarray-constructors";
const NATIVE_ERROR_TEMPLATE: &str = "_NativeError_ Object Structure";
const NATIVE_ERROR_PLACEHOLDER: &str = "_NativeError_";
const NATIVE_ERROR_KINDS: &str = "sec-native-error-types-used-in-this-standard";

const DOCUMENT: &str = "(document)";

static CONSTRUCTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"The .* (?:Constructors?|Intrinsic Object)").expect("valid regex")
});
static STATIC_PROPERTIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Properties of .* (?:Constructors?|Intrinsic Object)").expect("valid regex")
});
static INSTANCE_PROPERTIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Properties of .* Instances").expect("valid regex"));
static PROTOTYPE_PROPERTIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Properties of .* Prototype Objects?").expect("valid regex"));
static VALUE_PROPERTIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Value Properties of").expect("valid regex"));
static FUNCTION_PROPERTIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Function Properties of").expect("valid regex"));
static CLASS_NAME_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" Objects| \(.*\)").expect("valid regex"));
static NAMESPACE_NAME_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^The | Object$").expect("valid regex"));

/// Build the catalog of global entities from a specification document.
pub fn extract_catalog(source: &impl SpecSource) -> Result<Catalog> {
    let toc = source.sections();
    let top = Section::new(DOCUMENT, "", toc);

    let first = top.position(FIRST_OBJECT_CLAUSE)?;
    let last = top.position(LAST_OBJECT_CLAUSE)?;
    let range = top.children.get(first..=last).unwrap_or_default();

    let mut objects = Vec::new();
    for clause in range {
        for section in &clause.children {
            objects.extend(flatten(section)?);
        }
    }
    debug!("{} object sections after flattening", objects.len());

    let typed_arrays = kind_names(source, TYPED_ARRAY_KINDS);
    let native_errors = kind_names(source, NATIVE_ERROR_KINDS);

    let mut entities = Vec::new();
    for section in &objects {
        let entity = if section.title.ends_with("Object") {
            GlobalEntity::Namespace(make_namespace(source, section)?)
        } else {
            GlobalEntity::Class(make_class(source, section)?)
        };
        match entity {
            GlobalEntity::Class(template) if template.name == TYPED_ARRAY_TEMPLATE => {
                entities.extend(
                    typed_arrays
                        .iter()
                        .map(|kind| GlobalEntity::Class(template.expand(TYPED_ARRAY_TEMPLATE, kind))),
                );
            }
            GlobalEntity::Class(template) if template.name == NATIVE_ERROR_TEMPLATE => {
                entities.extend(native_errors.iter().map(|kind| {
                    GlobalEntity::Class(template.expand(NATIVE_ERROR_PLACEHOLDER, kind))
                }));
            }
            entity => entities.push(entity),
        }
    }

    let mut catalog = Catalog::new(entities);
    add_globals(source, &top, &mut catalog)?;
    check_unique(&catalog)?;

    info!(
        "Extracted {} entities ({} global)",
        catalog.len(),
        catalog.iter().filter(|e| e.is_global()).count()
    );
    Ok(catalog)
}

/// Concrete names listed by the `dfn`s under `id`, without `%` delimiters.
fn kind_names(source: &impl SpecSource, id: &str) -> Vec<String> {
    source
        .definitions(id)
        .into_iter()
        .map(|name| name.replace('%', ""))
        .collect()
}

/// Turn one object clause into the sections that each describe one entity.
fn flatten(section: &Section) -> Result<Vec<Section>> {
    let with_children = |children: &[Section]| {
        Section::new(section.title.clone(), section.id.clone(), children.to_vec())
    };

    match section.title.as_str() {
        "Error Objects" => {
            let end = section.position("Properties of Error Instances")? + 1;
            let Some((trailing, rest)) = section.children[end..].split_last() else {
                return Err(StructuralError::MissingSection {
                    parent: section.title.clone(),
                    title: "Native Error Types Used in This Standard".to_string(),
                });
            };
            if !trailing.title.starts_with("Abstract Operations") {
                return Err(StructuralError::UnexpectedSection {
                    expected: "Abstract Operations for Error Objects".to_string(),
                    found: trailing.title.clone(),
                });
            }
            let [types, structure, others @ ..] = rest else {
                return Err(StructuralError::MissingSection {
                    parent: section.title.clone(),
                    title: NATIVE_ERROR_TEMPLATE.to_string(),
                });
            };
            expect_title(types, "Native Error Types Used in This Standard")?;
            expect_title(structure, NATIVE_ERROR_TEMPLATE)?;

            let mut out = vec![with_children(&section.children[..end]), structure.clone()];
            out.extend(others.iter().cloned());
            Ok(out)
        }
        "TypedArray Objects" => {
            let end = section.position("Abstract Operations for TypedArray Objects")? + 1;
            Ok(vec![
                with_children(&section.children[..end]),
                Section::new(
                    TYPED_ARRAY_TEMPLATE,
                    section.id.clone(),
                    section.children[end..].to_vec(),
                ),
            ])
        }
        "Object Objects" => {
            let at = section.position("Properties of the Object Prototype Object")?;
            let prototype = &section.children[at];
            let members = prototype
                .children
                .iter()
                .flat_map(|member| {
                    if member.title == "Legacy Object.prototype Accessor Methods" {
                        member.children.clone()
                    } else {
                        vec![member.clone()]
                    }
                })
                .collect();
            let mut children = section.children.clone();
            children[at] = Section::new(prototype.title.clone(), prototype.id.clone(), members);
            Ok(vec![Section::new(
                section.title.clone(),
                section.id.clone(),
                children,
            )])
        }
        "Iteration" => Ok(vec![
            section.expect_child("The %IteratorPrototype% Object")?.clone(),
            section
                .expect_child("The %AsyncIteratorPrototype% Object")?
                .clone(),
        ]),
        // Exotic objects with no constructor or namespace of their own.
        "Module Namespace Objects" => Ok(Vec::new()),
        _ => Ok(vec![section.clone()]),
    }
}

fn expect_title(section: &Section, title: &str) -> Result<()> {
    if section.title == title {
        Ok(())
    } else {
        Err(StructuralError::UnexpectedSection {
            expected: title.to_string(),
            found: section.title.clone(),
        })
    }
}

/// The bare member sections of the first child matching `pattern`.
fn member_sections<'a>(section: &'a Section, pattern: &Regex) -> Result<Vec<&'a Section>> {
    match section.child_matching(pattern) {
        Some(group) => group.children.iter().map(Section::bare).collect(),
        None => Ok(Vec::new()),
    }
}

fn properties(source: &impl SpecSource, sections: &[&Section]) -> Result<Vec<Property>> {
    sections
        .iter()
        .filter(|s| !s.is_callable())
        .map(|s| make_property(source, s))
        .collect()
}

fn methods(source: &impl SpecSource, sections: &[&Section]) -> Result<Vec<Method>> {
    sections
        .iter()
        .filter(|s| s.is_callable())
        .map(|s| make_method(source, s))
        .collect()
}

fn expect_uncallable(sections: &[&Section]) -> Result<()> {
    match sections.iter().find(|s| s.is_callable()) {
        Some(s) => Err(StructuralError::UnexpectedSection {
            expected: "a property".to_string(),
            found: s.title.clone(),
        }),
        None => Ok(()),
    }
}

fn make_namespace(source: &impl SpecSource, section: &Section) -> Result<Namespace> {
    let mut value_secs = member_sections(section, &VALUE_PROPERTIES)?;
    let function_secs = member_sections(section, &FUNCTION_PROPERTIES)?;
    expect_uncallable(&value_secs)?;
    if let Some(s) = function_secs.iter().find(|s| !s.is_callable()) {
        return Err(StructuralError::UnexpectedSection {
            expected: "a function".to_string(),
            found: s.title.clone(),
        });
    }

    let (static_properties, static_methods) = if value_secs.is_empty() && function_secs.is_empty()
    {
        value_secs = section
            .children
            .iter()
            .map(Section::bare)
            .collect::<Result<_>>()?;
        (
            properties(source, &value_secs)?,
            methods(source, &value_secs)?,
        )
    } else {
        (
            properties(source, &value_secs)?,
            methods(source, &function_secs)?,
        )
    };

    let name = NAMESPACE_NAME_NOISE
        .replace_all(&section.title, "")
        .into_owned();
    debug!(
        "namespace {name}: {} properties, {} methods",
        static_properties.len(),
        static_methods.len()
    );
    Ok(Namespace {
        name,
        global: false,
        static_properties,
        static_methods,
    })
}

fn make_class(source: &impl SpecSource, section: &Section) -> Result<Class> {
    let static_secs = member_sections(section, &STATIC_PROPERTIES)?;
    let instance_secs = member_sections(section, &INSTANCE_PROPERTIES)?;
    let prototype_secs = member_sections(section, &PROTOTYPE_PROPERTIES)?;
    expect_uncallable(&instance_secs)?;

    let mut constructor = section
        .child_matching(&CONSTRUCTOR)
        .map(|s| make_constructor(source, s))
        .transpose()?;
    let parent = section
        .child_matching(&STATIC_PROPERTIES)
        .and_then(|s| parent_class(source, s));

    let mut static_properties = properties(source, &static_secs)?;
    let static_methods = methods(source, &static_secs)?;
    let prototype_properties = properties(source, &prototype_secs)?;
    let instance_methods = methods(source, &prototype_secs)?;
    let instance_properties = instance_secs
        .iter()
        .map(|s| make_property(source, s))
        .collect::<Result<Vec<_>>>()?;

    // `Function.length` is the constructor's own length, not a member.
    if let Some(index) = static_properties
        .iter()
        .position(|p| p.name().ends_with("Function.length"))
    {
        static_properties.remove(index);
        let length_section = static_secs
            .iter()
            .find(|s| s.title.ends_with("Function.length"))
            .ok_or_else(|| StructuralError::MissingSection {
                parent: section.title.clone(),
                title: "Function.length".to_string(),
            })?;
        let length = function_length(source, length_section)?;
        let ctor = constructor
            .as_mut()
            .ok_or_else(|| StructuralError::MissingConstructorSignature {
                section: section.title.clone(),
            })?;
        ctor.length = Some(length);
    }

    let name = CLASS_NAME_NOISE.replace_all(&section.title, "").into_owned();
    debug!(
        "class {name}: constructor={}, {} static, {} instance methods",
        constructor.is_some(),
        static_properties.len() + static_methods.len(),
        instance_methods.len()
    );
    Ok(Class {
        name,
        global: false,
        parent,
        constructor,
        static_properties,
        static_methods,
        prototype_properties,
        instance_methods,
        instance_properties,
    })
}

/// Walk the global object clause: add global values and functions, and mark
/// the classes and namespaces it exposes as global.
fn add_globals(source: &impl SpecSource, top: &Section, catalog: &mut Catalog) -> Result<()> {
    let global = top.expect_child(GLOBAL_OBJECT)?;
    let titles: Vec<&str> = global.children.iter().map(|s| s.title.as_str()).collect();
    let [values, functions, constructors, others] = global.children.as_slice() else {
        return Err(shape_error(&titles));
    };
    if titles != GLOBAL_OBJECT_PARTS {
        return Err(shape_error(&titles));
    }

    for s in &values.children {
        let s = s.bare()?;
        let attributes =
            data_attributes(source, s)?.ok_or_else(|| StructuralError::MissingAttributes {
                section: s.title.clone(),
            })?;
        catalog
            .entities
            .push(GlobalEntity::GlobalProperty(GlobalProperty {
                name: s.title.clone(),
                attributes,
            }));
    }

    for s in &functions.children {
        let members: Vec<&Section> = if s.title == "URI Handling Functions" {
            s.children
                .iter()
                .filter(|t| !t.title.starts_with(|c: char| c.is_ascii_uppercase()))
                .collect()
        } else {
            vec![s]
        };
        for member in members {
            let member = member.bare()?;
            let (name, parameters) = parse_parameters(&member.title)?;
            catalog.entities.push(GlobalEntity::Function(Function {
                name,
                parameters,
                length: method_length(source, member)?,
                global: true,
            }));
        }
    }

    for s in &constructors.children {
        let name = s.bare()?.title.replace(" ( . . . )", "");
        match lookup(catalog, &name)? {
            GlobalEntity::Class(class) => class.global = true,
            other => return Err(wrong_kind(&name, "class", other)),
        }
    }

    for s in &others.children {
        let name = s.bare()?.title.clone();
        match lookup(catalog, &name)? {
            GlobalEntity::Namespace(namespace) => namespace.global = true,
            other => return Err(wrong_kind(&name, "namespace", other)),
        }
    }
    Ok(())
}

fn shape_error(titles: &[&str]) -> StructuralError {
    StructuralError::GlobalObjectShape {
        titles: titles.iter().map(|t| t.to_string()).collect(),
    }
}

fn lookup<'a>(catalog: &'a mut Catalog, name: &str) -> Result<&'a mut GlobalEntity> {
    catalog
        .find_mut(name)
        .ok_or_else(|| StructuralError::UnknownEntity {
            name: name.to_string(),
        })
}

fn wrong_kind(name: &str, expected: &'static str, found: &GlobalEntity) -> StructuralError {
    StructuralError::WrongEntityKind {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

fn check_unique(catalog: &Catalog) -> Result<()> {
    let mut seen = HashSet::new();
    for entity in catalog.iter() {
        if !seen.insert(entity.name()) {
            return Err(StructuralError::DuplicateEntity {
                name: entity.name().to_string(),
            });
        }
    }
    Ok(())
}
