//! The catalog of specified global entities.
//!
//! The extractor produces a [`Catalog`] once per specification snapshot; the
//! checker loads it back from JSON and only reads it (apart from explicit
//! adjustment layers applied right after loading).

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Presence flags of a data property: writable, enumerable, configurable.
///
/// Serialized as the concatenation of `w`, `e`, `c` for the flags that are
/// set, e.g. `"wc"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DataAttributes {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl DataAttributes {
    pub const fn new(writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            writable,
            enumerable,
            configurable,
        }
    }

    /// Writable and configurable, not enumerable: what a member gets when
    /// the specification does not say otherwise.
    pub const DEFAULT_MEMBER: Self = Self::new(true, false, true);

    pub fn parse(s: &str) -> Option<Self> {
        let mut rest = s;
        let mut take = |c: char| match rest.strip_prefix(c) {
            Some(r) => {
                rest = r;
                true
            }
            None => false,
        };
        let attrs = Self::new(take('w'), take('e'), take('c'));
        rest.is_empty().then_some(attrs)
    }
}

impl fmt::Display for DataAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.writable {
            f.write_str("w")?;
        }
        if self.enumerable {
            f.write_str("e")?;
        }
        if self.configurable {
            f.write_str("c")?;
        }
        Ok(())
    }
}

impl From<DataAttributes> for String {
    fn from(a: DataAttributes) -> String {
        a.to_string()
    }
}

impl TryFrom<String> for DataAttributes {
    type Error = String;
    fn try_from(s: String) -> Result<Self, String> {
        Self::parse(&s).ok_or_else(|| format!("invalid data attributes \"{s}\""))
    }
}

/// Presence flags of an accessor property: getter, setter, enumerable,
/// configurable. Serialized like [`DataAttributes`] with `g`, `s`, `e`, `c`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AccessorAttributes {
    pub get: bool,
    pub set: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl AccessorAttributes {
    pub const fn new(get: bool, set: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            get,
            set,
            enumerable,
            configurable,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let mut rest = s;
        let mut take = |c: char| match rest.strip_prefix(c) {
            Some(r) => {
                rest = r;
                true
            }
            None => false,
        };
        let attrs = Self::new(take('g'), take('s'), take('e'), take('c'));
        rest.is_empty().then_some(attrs)
    }
}

impl fmt::Display for AccessorAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (set, c) in [
            (self.get, "g"),
            (self.set, "s"),
            (self.enumerable, "e"),
            (self.configurable, "c"),
        ] {
            if set {
                f.write_str(c)?;
            }
        }
        Ok(())
    }
}

impl From<AccessorAttributes> for String {
    fn from(a: AccessorAttributes) -> String {
        a.to_string()
    }
}

impl TryFrom<String> for AccessorAttributes {
    type Error = String;
    fn try_from(s: String) -> Result<Self, String> {
        Self::parse(&s).ok_or_else(|| format!("invalid accessor attributes \"{s}\""))
    }
}

/// A property of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Property {
    DataProperty {
        name: String,
        attributes: DataAttributes,
    },
    AccessorProperty {
        name: String,
        attributes: AccessorAttributes,
    },
}

impl Property {
    pub fn name(&self) -> &str {
        match self {
            Property::DataProperty { name, .. } | Property::AccessorProperty { name, .. } => name,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, Property::AccessorProperty { .. })
    }

    fn rename(&self, from: &str, to: &str) -> Property {
        match self {
            Property::DataProperty { name, attributes } => Property::DataProperty {
                name: name.replace(from, to),
                attributes: *attributes,
            },
            Property::AccessorProperty { name, attributes } => Property::AccessorProperty {
                name: name.replace(from, to),
                attributes: *attributes,
            },
        }
    }
}

/// Arity of a callable.
///
/// `required + optional (+ 1 if rest)` is the number of documented
/// parameters; `rest` means there is no upper bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameters {
    pub required: u32,
    pub optional: u32,
    pub rest: bool,
}

impl Parameters {
    pub fn total(&self) -> u32 {
        self.required + self.optional + u32::from(self.rest)
    }
}

/// A method of an object or of its prototype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub parameters: Parameters,
    /// The normative value of `length`, when it differs from what
    /// `parameters.required` implies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<DataAttributes>,
}

impl Method {
    /// The `length` of the function object.
    pub fn length(&self) -> u32 {
        self.length.unwrap_or(self.parameters.required)
    }
}

/// How a constructor may be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Usage {
    /// Only callable without `new`
    Call,
    /// Only constructible with `new`
    Construct,
    /// `X()` and `new X()` do the same thing
    Equivalent,
    /// `X()` and `new X()` both work, with different results
    Different,
    /// Abstract: never invoked directly, and never gets a constructor page
    None,
}

impl Usage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Usage::Call => "call",
            Usage::Construct => "construct",
            Usage::Equivalent => "equivalent",
            Usage::Different => "different",
            Usage::None => "none",
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The constructor of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constructor {
    pub name: String,
    pub parameters: Parameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    pub usage: Usage,
}

impl Constructor {
    pub fn length(&self) -> u32 {
        self.length.unwrap_or(self.parameters.required)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub name: String,
    pub global: bool,
    pub static_properties: Vec<Property>,
    pub static_methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub name: String,
    pub global: bool,
    /// Parent class, when the constructor's prototype is not `Function.prototype`
    #[serde(rename = "extends", default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub constructor: Option<Constructor>,
    pub static_properties: Vec<Property>,
    pub static_methods: Vec<Method>,
    pub prototype_properties: Vec<Property>,
    pub instance_methods: Vec<Method>,
    pub instance_properties: Vec<Property>,
}

impl Class {
    /// Derive a concrete class from a template class by substituting the
    /// template's placeholder name in every member name.
    ///
    /// The template is left untouched, so one template can be expanded any
    /// number of times.
    pub fn expand(&self, placeholder: &str, name: &str) -> Class {
        let props = |ps: &[Property]| ps.iter().map(|p| p.rename(placeholder, name)).collect();
        let methods = |ms: &[Method]| {
            ms.iter()
                .map(|m| Method {
                    name: m.name.replace(placeholder, name),
                    ..m.clone()
                })
                .collect()
        };
        Class {
            name: name.to_string(),
            global: self.global,
            parent: self.parent.clone(),
            constructor: self.constructor.as_ref().map(|c| Constructor {
                name: c.name.replace(placeholder, name),
                ..c.clone()
            }),
            static_properties: props(&self.static_properties),
            static_methods: methods(&self.static_methods),
            prototype_properties: props(&self.prototype_properties),
            instance_methods: methods(&self.instance_methods),
            instance_properties: self.instance_properties.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub parameters: Parameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    pub global: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalProperty {
    pub name: String,
    pub attributes: DataAttributes,
}

/// One documented top-level object or value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GlobalEntity {
    Namespace(Namespace),
    Class(Class),
    Function(Function),
    GlobalProperty(GlobalProperty),
}

impl GlobalEntity {
    pub fn name(&self) -> &str {
        match self {
            GlobalEntity::Namespace(n) => &n.name,
            GlobalEntity::Class(c) => &c.name,
            GlobalEntity::Function(f) => &f.name,
            GlobalEntity::GlobalProperty(p) => &p.name,
        }
    }

    /// Whether the entity is reachable as a property of the global object.
    pub fn is_global(&self) -> bool {
        match self {
            GlobalEntity::Namespace(n) => n.global,
            GlobalEntity::Class(c) => c.global,
            GlobalEntity::Function(f) => f.global,
            GlobalEntity::GlobalProperty(_) => true,
        }
    }

    /// Name of the variant, as used in the serialized `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            GlobalEntity::Namespace(_) => "namespace",
            GlobalEntity::Class(_) => "class",
            GlobalEntity::Function(_) => "function",
            GlobalEntity::GlobalProperty(_) => "global-property",
        }
    }

    /// Static methods of a class or namespace; empty for other entities.
    pub fn static_methods(&self) -> &[Method] {
        match self {
            GlobalEntity::Namespace(n) => &n.static_methods,
            GlobalEntity::Class(c) => &c.static_methods,
            GlobalEntity::Function(_) | GlobalEntity::GlobalProperty(_) => &[],
        }
    }

    /// Static properties of a class or namespace; empty for other entities.
    pub fn static_properties(&self) -> &[Property] {
        match self {
            GlobalEntity::Namespace(n) => &n.static_properties,
            GlobalEntity::Class(c) => &c.static_properties,
            GlobalEntity::Function(_) | GlobalEntity::GlobalProperty(_) => &[],
        }
    }
}

/// The full list of global entities extracted from one specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    pub entities: Vec<GlobalEntity>,
}

impl Catalog {
    pub fn new(entities: Vec<GlobalEntity>) -> Self {
        Self { entities }
    }

    /// Parse a catalog from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("Failed to parse catalog JSON")
    }

    /// Load a catalog from a local file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read catalog from {}", path.display()))?;
        Self::from_json(&content)
            .wrap_err_with(|| format!("Failed to parse catalog from {}", path.display()))
    }

    /// Serialize the catalog to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).wrap_err("Failed to serialize catalog to JSON")
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlobalEntity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&GlobalEntity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut GlobalEntity> {
        self.entities.iter_mut().find(|e| e.name() == name)
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        match self.find(name)? {
            GlobalEntity::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        match self.find(name)? {
            GlobalEntity::Namespace(n) => Some(n),
            _ => None,
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        match self.find(name)? {
            GlobalEntity::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_class(&self, name: &str) -> bool {
        self.class(name).is_some()
    }

    /// The constructor of the class `name`, if it is a class with one.
    pub fn constructor_of(&self, name: &str) -> Option<&Constructor> {
        self.class(name)?.constructor.as_ref()
    }

    /// A static method of a class or namespace, looked up by full name
    /// (e.g. `Array.from()`).
    pub fn static_method(&self, owner: &str, name: &str) -> Option<&Method> {
        self.find(owner)?
            .static_methods()
            .iter()
            .find(|m| m.name == name)
    }

    /// An instance method of a class, looked up by full name
    /// (e.g. `Array.prototype.at()`).
    pub fn instance_method(&self, owner: &str, name: &str) -> Option<&Method> {
        self.class(owner)?
            .instance_methods
            .iter()
            .find(|m| m.name == name)
    }

    /// Classes whose `extends` is `name`.
    pub fn subclasses_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Class> + 'a {
        self.entities.iter().filter_map(move |e| match e {
            GlobalEntity::Class(c) if c.parent.as_deref() == Some(name) => Some(c),
            _ => None,
        })
    }

    /// Whether `name` is `ancestor` or (transitively) extends it.
    pub fn inherits_from(&self, name: &str, ancestor: &str) -> bool {
        let mut current = Some(name);
        // Bounded walk in case of an accidental cycle in hand-edited data.
        for _ in 0..=self.entities.len() {
            match current {
                Some(n) if n == ancestor => return true,
                Some(n) => current = self.class(n).and_then(|c| c.parent.as_deref()),
                None => return false,
            }
        }
        false
    }

    /// Entity names closest to `name`, best first, for "did you mean" hints.
    pub fn suggest(&self, name: &str, limit: usize) -> Vec<&str> {
        let mut scored: Vec<(f64, &str)> = self
            .entities
            .iter()
            .map(|e| (strsim::jaro_winkler(name, e.name()), e.name()))
            .filter(|(score, _)| *score > 0.8)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored.into_iter().take(limit).map(|(_, n)| n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, required: u32) -> Method {
        Method {
            name: name.to_string(),
            parameters: Parameters {
                required,
                optional: 0,
                rest: false,
            },
            length: None,
            attributes: None,
        }
    }

    fn typed_array_template() -> Class {
        Class {
            name: "%TypedArray%".to_string(),
            global: false,
            parent: None,
            constructor: None,
            static_properties: vec![Property::DataProperty {
                name: "%TypedArray%.BYTES_PER_ELEMENT".to_string(),
                attributes: DataAttributes::new(false, false, false),
            }],
            static_methods: vec![],
            prototype_properties: vec![],
            instance_methods: vec![method("%TypedArray%.prototype.set()", 1)],
            instance_properties: vec![],
        }
    }

    #[test]
    fn test_attribute_strings() {
        assert_eq!(DataAttributes::new(true, false, true).to_string(), "wc");
        assert_eq!(DataAttributes::parse("wec"), Some(DataAttributes::new(true, true, true)));
        assert_eq!(DataAttributes::parse(""), Some(DataAttributes::default()));
        assert_eq!(DataAttributes::parse("cw"), None);
        assert_eq!(
            AccessorAttributes::parse("gsc"),
            Some(AccessorAttributes::new(true, true, false, true))
        );
        assert_eq!(AccessorAttributes::new(true, false, false, true).to_string(), "gc");
    }

    #[test]
    fn test_expand_substitutes_without_touching_template() {
        let template = typed_array_template();
        let int8 = template.expand("%TypedArray%", "Int8Array");
        let uint8 = template.expand("%TypedArray%", "Uint8Array");

        assert_eq!(int8.name, "Int8Array");
        assert_eq!(int8.instance_methods[0].name, "Int8Array.prototype.set()");
        assert_eq!(int8.static_properties[0].name(), "Int8Array.BYTES_PER_ELEMENT");
        assert_eq!(uint8.instance_methods[0].name, "Uint8Array.prototype.set()");
        assert_eq!(
            template.instance_methods[0].name,
            "%TypedArray%.prototype.set()"
        );
    }

    #[test]
    fn test_entity_json_shape() {
        let catalog = Catalog::new(vec![
            GlobalEntity::Function(Function {
                name: "parseInt()".to_string(),
                parameters: Parameters {
                    required: 2,
                    optional: 0,
                    rest: false,
                },
                length: None,
                global: true,
            }),
            GlobalEntity::Class(typed_array_template()),
        ]);
        let json = catalog.to_json().unwrap();
        assert!(json.contains("\"type\": \"function\""));
        assert!(json.contains("\"type\": \"class\""));
        assert!(json.contains("\"staticProperties\""));
        assert!(json.contains("\"type\": \"data-property\""));
        assert!(json.contains("\"attributes\": \"\""));
        assert!(json.contains("\"constructor\": null"));
        assert!(!json.contains("\"extends\""));

        let back = Catalog::from_json(&json).unwrap();
        assert_eq!(back, catalog);
    }

    #[test]
    fn test_queries() {
        let mut error = typed_array_template().expand("%TypedArray%", "Error");
        error.constructor = Some(Constructor {
            name: "Error()".to_string(),
            parameters: Parameters {
                required: 1,
                optional: 1,
                rest: false,
            },
            length: None,
            usage: Usage::Equivalent,
        });
        let mut range = error.clone();
        range.name = "RangeError".to_string();
        range.parent = Some("Error".to_string());
        let catalog = Catalog::new(vec![
            GlobalEntity::Class(error),
            GlobalEntity::Class(range),
            GlobalEntity::Namespace(Namespace {
                name: "Math".to_string(),
                global: true,
                static_properties: vec![],
                static_methods: vec![method("Math.abs()", 1)],
            }),
        ]);

        assert!(catalog.is_class("Error"));
        assert!(!catalog.is_class("Math"));
        assert_eq!(catalog.constructor_of("Error").unwrap().usage, Usage::Equivalent);
        assert!(catalog.static_method("Math", "Math.abs()").is_some());
        assert!(catalog.instance_method("Error", "Error.prototype.set()").is_some());
        assert!(catalog.inherits_from("RangeError", "Error"));
        assert!(!catalog.inherits_from("Error", "RangeError"));
        let subs: Vec<&str> = catalog.subclasses_of("Error").map(|c| c.name.as_str()).collect();
        assert_eq!(subs, vec!["RangeError"]);
        assert_eq!(catalog.suggest("RangError", 1), vec!["RangeError"]);
    }
}
