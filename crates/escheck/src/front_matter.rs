//! Page front matter.
//!
//! Every documentation page starts with a YAML block fenced by `---` lines
//! carrying its title, slug, page type and optional status flags.

use eyre::{Result, WrapErr};
use facet::Facet;

/// Kind of documentation page, from the `page-type` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Facet)]
#[facet(rename_all = "kebab-case")]
#[repr(u8)]
pub enum PageType {
    JavascriptLanguageFeature,
    JavascriptOperator,
    JavascriptStatement,
    JavascriptFunction,
    JavascriptGlobalProperty,
    JavascriptNamespace,
    JavascriptClass,
    JavascriptConstructor,
    JavascriptInstanceMethod,
    JavascriptInstanceDataProperty,
    JavascriptInstanceAccessorProperty,
    JavascriptStaticMethod,
    JavascriptStaticDataProperty,
    JavascriptStaticAccessorProperty,
    JavascriptError,
    Guide,
    LandingPage,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::JavascriptLanguageFeature => "javascript-language-feature",
            PageType::JavascriptOperator => "javascript-operator",
            PageType::JavascriptStatement => "javascript-statement",
            PageType::JavascriptFunction => "javascript-function",
            PageType::JavascriptGlobalProperty => "javascript-global-property",
            PageType::JavascriptNamespace => "javascript-namespace",
            PageType::JavascriptClass => "javascript-class",
            PageType::JavascriptConstructor => "javascript-constructor",
            PageType::JavascriptInstanceMethod => "javascript-instance-method",
            PageType::JavascriptInstanceDataProperty => "javascript-instance-data-property",
            PageType::JavascriptInstanceAccessorProperty => "javascript-instance-accessor-property",
            PageType::JavascriptStaticMethod => "javascript-static-method",
            PageType::JavascriptStaticDataProperty => "javascript-static-data-property",
            PageType::JavascriptStaticAccessorProperty => "javascript-static-accessor-property",
            PageType::JavascriptError => "javascript-error",
            PageType::Guide => "guide",
            PageType::LandingPage => "landing-page",
        }
    }

    /// Reference pages, including error pages.
    pub fn is_javascript(&self) -> bool {
        !matches!(self, PageType::Guide | PageType::LandingPage)
    }

    pub fn is_data_property(&self) -> bool {
        matches!(
            self,
            PageType::JavascriptInstanceDataProperty | PageType::JavascriptStaticDataProperty
        )
    }

    pub fn is_accessor_property(&self) -> bool {
        matches!(
            self,
            PageType::JavascriptInstanceAccessorProperty
                | PageType::JavascriptStaticAccessorProperty
        )
    }

    pub fn is_method(&self) -> bool {
        matches!(
            self,
            PageType::JavascriptInstanceMethod | PageType::JavascriptStaticMethod
        )
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status flags from the `status` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
#[facet(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Status {
    Experimental,
    NonStandard,
    Deprecated,
}

impl Status {
    /// The inline badge macro shown next to links to such pages.
    pub fn badge(&self) -> &'static str {
        match self {
            Status::Experimental => "{{experimental_inline}}",
            Status::NonStandard => "{{non-standard_inline}}",
            Status::Deprecated => "{{deprecated_inline}}",
        }
    }
}

#[derive(Debug, Clone, Facet)]
pub struct FrontMatter {
    pub title: String,

    pub slug: String,

    #[facet(rename = "page-type")]
    pub page_type: PageType,

    #[facet(default)]
    pub status: Vec<Status>,
}

impl FrontMatter {
    pub fn is_deprecated(&self) -> bool {
        self.status.contains(&Status::Deprecated)
    }

    /// The slug split on `/`.
    pub fn slug_segments(&self) -> Vec<&str> {
        self.slug.split('/').collect()
    }
}

/// Split a page into its YAML front matter and markdown body.
///
/// Returns `None` when the page does not start with a `---` fence or the
/// closing fence is missing.
pub fn split(source: &str) -> Option<(&str, &str)> {
    let rest = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Parse the front matter of a page. `origin` names the page in errors.
pub fn parse(yaml: &str, origin: &str) -> Result<FrontMatter> {
    facet_yaml::from_str(yaml).wrap_err_with(|| format!("Invalid front matter on {}", origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const PAGE: &str = indoc! {r#"
        ---
        title: Array.prototype.at()
        slug: Web/JavaScript/Reference/Global_Objects/Array/at
        page-type: javascript-instance-method
        browser-compat: javascript.builtins.Array.at
        status:
          - experimental
          - deprecated
        ---

        {{JSRef}}
    "#};

    #[test]
    fn test_split_and_parse() {
        let (yaml, body) = split(PAGE).unwrap();
        assert!(yaml.starts_with("title:"));
        assert_eq!(body.trim(), "{{JSRef}}");

        let fm = parse(yaml, "at/index.md").unwrap();
        assert_eq!(fm.title, "Array.prototype.at()");
        assert_eq!(fm.page_type, PageType::JavascriptInstanceMethod);
        assert_eq!(fm.status, vec![Status::Experimental, Status::Deprecated]);
        assert!(fm.is_deprecated());
        assert_eq!(fm.slug_segments().last(), Some(&"at"));
    }

    #[test]
    fn test_missing_fence() {
        assert!(split("title: x\n").is_none());
        assert!(split("---\ntitle: x\n").is_none());
    }

    #[test]
    fn test_unknown_page_type_names_file() {
        let yaml = "title: X\nslug: Web/X\npage-type: css-property\n";
        let err = parse(yaml, "css/index.md").unwrap_err();
        assert!(err.to_string().contains("css/index.md"));
    }

    #[test]
    fn test_page_type_predicates() {
        assert!(PageType::JavascriptError.is_javascript());
        assert!(!PageType::LandingPage.is_javascript());
        assert!(PageType::JavascriptStaticDataProperty.is_data_property());
        assert!(PageType::JavascriptInstanceAccessorProperty.is_accessor_property());
        assert_eq!(
            PageType::JavascriptStaticMethod.to_string(),
            "javascript-static-method"
        );
    }
}
