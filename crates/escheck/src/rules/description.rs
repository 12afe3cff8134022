use super::Rule;
use crate::context::FileContext;
use crate::front_matter::PageType;
use crate::names::{to_english, to_jsxref};
use escheck_core::Catalog;
use regex::Regex;
use std::sync::LazyLock;

/// Classes whose instances are usually primitive values.
const PRIMITIVES: &[&str] = &["Number", "String", "Boolean", "Symbol", "BigInt"];

const WELL_KNOWN_SYMBOLS: &[&str] = &[
    "asyncIterator",
    "hasInstance",
    "isConcatSpreadable",
    "iterator",
    "match",
    "matchAll",
    "replace",
    "search",
    "species",
    "split",
    "toPrimitive",
    "toStringTag",
    "unscopables",
];

static REGEXP_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) \((\$.)\)$").expect("valid regex"));
static REGEXP_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"RegExp/(dotAll|global|hasIndices|ignoreCase|multiline|sticky|unicodeSets|unicode)")
        .expect("valid regex")
});
static SPECIES_UNUSED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:map|set)/symbol\.species/").expect("valid regex"));
static INSTANCE_PROPERTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-z]+: ([a-z]+)").expect("valid regex"));
static PROXY_TRAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"proxy/proxy/.*/index\.md").expect("valid regex"));
static PROTOTYPE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*prototype\.?").expect("valid regex"));
static CONSTRUCTED_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\(\) constructor$").expect("valid regex"));

/// What the patterns are chosen by and filled with.
struct Facts<'a> {
    catalog: &'a Catalog,
    title: &'a str,
    slug: &'a str,
    path: String,
    page_type: PageType,
    /// The class a member page belongs to, from the slug
    cls: String,
    is_primitive: bool,
    /// Regex fragment naming instances in prose
    en_cls: String,
    /// How the class page is cross-referenced
    cls_ref: String,
}

impl Facts<'_> {
    fn is(&self, page_type: PageType) -> bool {
        self.page_type == page_type
    }

    fn instances(&self) -> &'static str {
        if self.is_primitive { "values" } else { "instances" }
    }
}

/// Extra placeholders a pattern needs, as regex fragments.
type Vars = Vec<(&'static str, String)>;
type Matcher = fn(&Facts<'_>) -> Option<Vars>;

fn when(condition: bool) -> Option<Vars> {
    condition.then(Vec::new)
}

/// Description patterns, most specific first. `~name~` placeholders are
/// filled from [`Facts`] or from the matcher's variables; everything else
/// is literal text.
#[rustfmt::skip]
static PATTERNS: &[(Matcher, &str)] = &[
    // Static accessor properties
    (
        |f| when(SPECIES_UNUSED.is_match(&f.path)),
        "~^~The **`~title~`** static accessor property is an unused accessor property specifying how to copy `~cls~` objects.~$~",
    ),
    (
        |f| {
            if !f.path.contains("symbol.species") {
                return None;
            }
            let constructs = if f.cls == "RegExp" {
                regex::escape("copied regular expressions in certain `RegExp` methods")
            } else {
                format!("return values from {} methods", f.en_cls)
            };
            Some(vec![("constructs", constructs)])
        },
        "~^~The **`~title~`** static accessor property returns the constructor used to construct ~constructs~.~$~",
    ),
    (
        |f| {
            let captures = REGEXP_ALIAS.captures(f.title)?;
            let alias = match &captures[2] {
                "$_" => "`RegExp.$_`".to_string(),
                "$`" => "``RegExp[\"$`\"]``".to_string(),
                alias => format!("`RegExp[\"{}\"]`", alias),
            };
            Some(vec![
                ("base", regex::escape(&captures[1])),
                ("alias", regex::escape(&alias)),
            ])
        },
        "~^~The **`~base~`** static accessor property returns ~any~. ~alias~ is an alias for this property.~$~",
    ),
    (
        |f| when(f.path.contains("regexp/n/")),
        "~^~The **`~title~`** static accessor properties return",
    ),
    (
        |f| when(f.is(PageType::JavascriptStaticAccessorProperty)),
        "~^~The **`~title~`** static accessor property returns",
    ),
    // Static data properties
    (
        |f| {
            let mut segments = f.slug.rsplit('/');
            let symbol = segments.next()?;
            (segments.next() == Some("Symbol") && WELL_KNOWN_SYMBOLS.contains(&symbol))
                .then(|| vec![("symbol", regex::escape(symbol))])
        },
        "~^~The **`~title~`** static data property represents the [well-known symbol](/en-US/docs/Web/JavaScript/Reference/Global_Objects/Symbol#well-known_symbols) `Symbol.~symbol~`.",
    ),
    (
        |f| when(f.is(PageType::JavascriptStaticDataProperty)),
        "~^~The **`~title~`** static data property represents",
    ),
    // Static methods
    (
        |f| when(f.is(PageType::JavascriptStaticMethod)),
        "~^~The **`~title~`** static method",
    ),
    // Instance accessor properties
    (
        |f| when(f.path.contains("/buffer/")),
        "~^~The **`buffer`** accessor property of ~cls_ref~ instances returns the {{jsxref(\"ArrayBuffer\")}} or {{jsxref(\"SharedArrayBuffer\")}} referenced by this ~en_cls~ at construction time.~$~",
    ),
    (
        |f| when(f.path.contains("/bytelength/")),
        "~^~The **`byteLength`** accessor property of ~cls_ref~ instances returns the length (in bytes) of this ~en_cls~.~$~",
    ),
    (
        |f| {
            if !f.path.contains("/maxbytelength/") {
                return None;
            }
            let grown = if f.cls == "ArrayBuffer" { "resized" } else { "grown" };
            Some(vec![("grown", grown.to_string())])
        },
        "~^~The **`maxByteLength`** accessor property of ~cls_ref~ instances returns the maximum length (in bytes) that this ~en_cls~ can be ~grown~ to.~$~",
    ),
    (
        |f| when(f.path.contains("/byteoffset/")),
        "~^~The **`byteOffset`** accessor property of ~cls_ref~ instances returns the offset (in bytes) of this ~en_cls~ from the start of its {{jsxref(\"ArrayBuffer\")}} or {{jsxref(\"SharedArrayBuffer\")}}.~$~",
    ),
    (
        |f| {
            let name = REGEXP_FLAG.captures(f.slug)?.get(1)?.as_str();
            let flag = match name {
                "dotAll" => "s",
                "global" => "g",
                "hasIndices" => "d",
                "ignoreCase" => "i",
                "multiline" => "m",
                "sticky" => "y",
                "unicode" => "u",
                _ => "v",
            };
            Some(vec![("name", name.to_string()), ("flag", flag.to_string())])
        },
        "~^~The **`~name~`** accessor property of ~cls_ref~ instances returns whether or not the `~flag~` flag is used with this regular expression.~$~",
    ),
    (
        |f| when(f.path.contains("/proto/")),
        "~^~The **`__proto__`** accessor property of ~cls_ref~ instances exposes ~any~ this ~en_cls~",
    ),
    (
        |f| {
            if !f.is(PageType::JavascriptInstanceAccessorProperty) {
                return None;
            }
            let name = f.title.rsplit('.').next().unwrap_or(f.title);
            Some(vec![("name", regex::escape(name))])
        },
        "~^~The **`~name~`** accessor property of ~cls_ref~ ~instances~ returns ~any~ this ~en_cls~",
    ),
    // Instance data properties
    (
        |f| when(f.path.contains("/displayname/")),
        "~^~The optional **`displayName`** property of a ~cls_ref~ instance",
    ),
    (
        |f| {
            if !f.is(PageType::JavascriptInstanceDataProperty) {
                return None;
            }
            let property = INSTANCE_PROPERTY.captures(f.title)?.get(1)?.as_str().to_string();
            let starts_with_vowel = f
                .cls
                .chars()
                .next()
                .is_some_and(|c| "aeiouAEIOU".contains(c));
            let article = if starts_with_vowel { "an" } else { "a" };
            let instance = if f.is_primitive { "value" } else { "instance" };
            Some(vec![
                ("property", property),
                ("article", article.to_string()),
                ("instance", instance.to_string()),
            ])
        },
        "~^~The **`~property~`** data property of ~article~ ~cls_ref~ ~instance~",
    ),
    // Instance methods
    (
        |f| {
            if !f.path.contains("symbol.iterator") {
                return None;
            }
            let kind = if f.cls == "arguments" { "objects" } else { f.instances() };
            let subject = if f.cls == "Iterator" {
                "built-in iterator".to_string()
            } else {
                f.en_cls.clone()
            };
            let plural = if f.en_cls.ends_with('`') { " objects" } else { "s" };
            Some(vec![
                ("kind", kind.to_string()),
                ("subject", subject),
                ("plural", plural.to_string()),
            ])
        },
        "~^~The **`[Symbol.iterator]()`** method of ~cls_ref~ ~kind~ implements the [iterable protocol](/en-US/docs/Web/JavaScript/Reference/Iteration_protocols) and allows ~subject~~plural~ to be consumed by most syntaxes expecting iterables, such as the [spread syntax](/en-US/docs/Web/JavaScript/Reference/Operators/Spread_syntax) and {{jsxref(\"Statements/for...of\", \"for...of\")}} loops. It returns ~all~.~$~",
    ),
    (
        |f| when(PROXY_TRAP.is_match(&f.path)),
        "~^~The **`~title~`** method is a trap for the `[[~all~]]` [object internal method](/en-US/docs/Web/JavaScript/Reference/Global_Objects/Proxy#object_internal_methods), which is used by",
    ),
    (
        |f| {
            if !f.is(PageType::JavascriptInstanceMethod) {
                return None;
            }
            let method = PROTOTYPE_PREFIX.replace(f.title, "");
            Some(vec![("method", regex::escape(&method))])
        },
        "~^~The **`~method~`** method of ~cls_ref~ ~instances~",
    ),
    // Namespaces
    (
        |f| when(f.title == "Intl"),
        "~^~The **`Intl`** namespace object contains several constructors",
    ),
    (
        |f| {
            f.is(PageType::JavascriptNamespace)
                .then(|| vec![("properties", "(?:properties and )?".to_string())])
        },
        "~^~The **`~title~`** namespace object contains static ~properties~methods for",
    ),
    // Constructors
    (
        |f| when(["symbol/symbol/", "bigint/bigint/"].iter().any(|p| f.path.contains(p))),
        "~^~The **`~cls~()`** function returns primitive values of type ~cls~.~$~",
    ),
    (
        |f| when(["number/number/", "boolean/boolean/", "string/string/"].iter().any(|p| f.path.contains(p))),
        "~^~The **`~cls~()`** constructor creates {{jsxref(\"~cls~\")}} objects. When called as a function, it returns primitive values of type ~cls~.~$~",
    ),
    (
        |f| when(f.path.contains("/object/object/")),
        "~^~The **`Object()`** constructor",
    ),
    (
        |f| {
            let class = CONSTRUCTED_CLASS.captures(f.title)?.get(1)?.as_str();
            if !f.catalog.inherits_from(class, "TypedArray") {
                return None;
            }
            let suffix = if f.cls.contains("Big") { "n" } else { "" };
            Some(vec![("suffix", suffix.to_string())])
        },
        "~^~The **`~cls~()`** constructor creates {{jsxref(\"~cls~\")}} objects. The contents are initialized to `0~suffix~`.~$~",
    ),
    (
        |f| when(f.is(PageType::JavascriptConstructor)),
        "~^~The **`~cls~()`** constructor creates {{jsxref(\"~cls~\")}} objects.",
    ),
    // Functions
    (
        |f| when(f.is(PageType::JavascriptFunction)),
        "~^~The **`~title~`** function",
    ),
    // Global properties
    (
        |f| when(f.is(PageType::JavascriptGlobalProperty)),
        "~^~The **`~title~`** global property",
    ),
];

/// Fill a pattern's placeholders, escaping its literal text.
fn render(template: &str, facts: &Facts<'_>, vars: &Vars) -> String {
    let mut out = String::new();
    for (i, piece) in template.split('~').enumerate() {
        if i % 2 == 0 {
            out.push_str(&regex::escape(piece));
            continue;
        }
        let value = match piece {
            "^" => "^".to_string(),
            "$" => "$".to_string(),
            "any" => ".*?".to_string(),
            "all" => ".*".to_string(),
            "title" => regex::escape(facts.title),
            "cls" => regex::escape(&facts.cls),
            "en_cls" => facts.en_cls.clone(),
            "cls_ref" => regex::escape(&facts.cls_ref),
            "instances" => facts.instances().to_string(),
            name => vars
                .iter()
                .find(|(var, _)| *var == name)
                .map(|(_, value)| value.clone())
                .unwrap_or_else(|| regex::escape(name)),
        };
        out.push_str(&value);
    }
    out
}

/// The class a member page belongs to: the parent slug segment, qualified
/// for `Intl` classes.
fn owner_class(slug: &str) -> String {
    let segments: Vec<&str> = slug.split('/').collect();
    let at = |back: usize| segments.len().checked_sub(back).map(|i| segments[i]);
    match (at(3), at(2)) {
        (Some("Intl"), Some(class)) => format!("Intl.{}", class),
        (_, Some(class)) => class.to_string(),
        _ => String::new(),
    }
}

/// The first paragraph follows the wording conventions of its page type.
pub struct Description;

impl Rule for Description {
    fn name(&self) -> &'static str {
        "description"
    }

    fn applies_to(&self, _cx: &FileContext<'_>) -> bool {
        true
    }

    fn check(&self, cx: &mut FileContext<'_>) {
        let front_matter = cx.front_matter();
        let cls = owner_class(&front_matter.slug);
        let cls_ref = cx
            .parent_page()
            .map(|parent| to_jsxref(&parent.front_matter))
            .unwrap_or_else(|| format!("{{{{jsxref(\"{}\")}}}}", cls));
        let facts = Facts {
            catalog: cx.catalog(),
            title: &front_matter.title,
            slug: &front_matter.slug,
            path: cx.run().display_path(cx.path()),
            page_type: front_matter.page_type,
            is_primitive: PRIMITIVES.contains(&cls.as_str()),
            en_cls: to_english(&cls),
            cls_ref,
            cls,
        };

        let Some((vars, template)) = PATTERNS
            .iter()
            .find_map(|(matcher, template)| matcher(&facts).map(|vars| (vars, *template)))
        else {
            return;
        };
        let source = render(template, &facts, &vars);
        let re = match Regex::new(&source) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!("Invalid description pattern for {}: {}", facts.title, e);
                return;
            }
        };
        if !re.is_match(&cx.description()) {
            cx.report(format!("Description does not match pattern: /{}/", source));
        }
    }
}
