use super::Rule;
use crate::context::FileContext;
use crate::front_matter::PageType;
use crate::names::{documented_name, find_entity};
use crate::page::{BlockKind, CalloutKind};
use escheck_core::{Catalog, DataAttributes, GlobalEntity, Property};
use regex::Regex;
use std::sync::LazyLock;

static ATTRIBUTES_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{js_property_attributes\(([01]), 0, ([01])\)\}\}").expect("valid regex")
});

/// Pages whose Value section is free-form.
const FREE_FORM: &[&str] = &["Error.prototype.stack", "Function: displayName"];

fn data_attributes(property: &Property) -> Option<DataAttributes> {
    match property {
        Property::DataProperty { attributes, .. } => Some(*attributes),
        Property::AccessorProperty { .. } => None,
    }
}

/// The specified attributes of the data property a page documents.
fn specified_attributes(catalog: &Catalog, title: &str, page_type: PageType) -> Option<DataAttributes> {
    let by_name = |properties: &[Property]| {
        properties
            .iter()
            .find(|p| documented_name(p.name()) == title)
            .and_then(data_attributes)
    };
    match page_type {
        PageType::JavascriptInstanceDataProperty => {
            if let Some((owner, property)) = title.split_once(": ") {
                return match find_entity(catalog, owner)? {
                    GlobalEntity::Class(class) => class
                        .instance_properties
                        .iter()
                        .find(|p| p.name() == property)
                        .and_then(data_attributes),
                    _ => None,
                };
            }
            let (owner, _) = title.split_once(".prototype")?;
            match find_entity(catalog, owner)? {
                GlobalEntity::Class(class) => by_name(&class.prototype_properties),
                _ => None,
            }
        }
        PageType::JavascriptStaticDataProperty => {
            let (owner, _) = title.rsplit_once('.')?;
            by_name(find_entity(catalog, owner)?.static_properties())
        }
        _ => None,
    }
}

/// Data property pages: a Value section made of a description, the
/// attributes table and an optional note.
pub struct DataProp;

impl Rule for DataProp {
    fn name(&self) -> &'static str {
        "data-prop"
    }

    fn applies_to(&self, cx: &FileContext<'_>) -> bool {
        cx.page_type().is_data_property()
    }

    fn check(&self, cx: &mut FileContext<'_>) {
        // A missing Value section is reported by the heading rule
        let Some(section) = cx.section("Value") else {
            return;
        };
        let blocks = cx.section_blocks(section);
        let well_formed = matches!(blocks.len(), 2 | 3)
            && blocks[0].kind == BlockKind::Paragraph
            && blocks[1].kind == BlockKind::Paragraph
            && blocks
                .get(2)
                .is_none_or(|b| b.kind == BlockKind::Callout(CalloutKind::Note));
        if !well_formed {
            if !FREE_FORM.contains(&cx.title()) {
                cx.report("Unrecognized value section format");
            }
            return;
        }

        let table = cx.text(&blocks[1]);
        let Some(flags) = ATTRIBUTES_TABLE.captures(table) else {
            cx.report("Value section must end in attributes table");
            return;
        };
        let documented = DataAttributes::new(&flags[1] == "1", false, &flags[2] == "1");
        if let Some(specified) = specified_attributes(cx.catalog(), cx.title(), cx.page_type()) {
            if specified != documented {
                cx.report(format!(
                    "Attributes should be {{{{js_property_attributes({}, {}, {})}}}}",
                    u8::from(specified.writable),
                    u8::from(specified.enumerable),
                    u8::from(specified.configurable)
                ));
            }
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
                "type": "namespace",
                "name": "Math",
                "global": true,
                "staticProperties": [
                  { "type": "data-property", "name": "Math.PI", "attributes": "" }
                ],
                "staticMethods": []
              },
              {
                "type": "class",
                "name": "Array",
                "global": true,
                "constructor": null,
                "staticProperties": [],
                "staticMethods": [],
                "prototypeProperties": [],
                "instanceMethods": [],
                "instanceProperties": [
                  { "type": "data-property", "name": "length", "attributes": "w" }
                ]
              }
            ]
        "#})
        .unwrap()
    }

    fn check_value(title: &str, page_type: &str, value: &str) -> Vec<String> {
        let body = format!("Intro.\n\n## Value\n\n{value}\n## Description\n\nText.\n");
        let run = run_context(catalog(), vec![page("reference/global_objects/x/y", title, page_type, &body)]);
        check(&DataProp, &run, "reference/global_objects/x/y").unwrap()
    }

    #[test]
    fn test_matching_attributes() {
        let value = "The number π.\n\n{{js_property_attributes(0, 0, 0)}}\n";
        assert!(check_value("Math.PI", "javascript-static-data-property", value).is_empty());

        let value = indoc! {"
            A number.

            {{js_property_attributes(1, 0, 0)}}

            > [!NOTE]
            > Setting it truncates.
        "};
        assert!(check_value("Array: length", "javascript-instance-data-property", value).is_empty());
    }

    #[test]
    fn test_attributes_disagree_with_catalog() {
        let value = "The number π.\n\n{{js_property_attributes(1, 0, 1)}}\n";
        assert_eq!(
            check_value("Math.PI", "javascript-static-data-property", value),
            vec!["Attributes should be {{js_property_attributes(0, 0, 0)}}"]
        );
    }

    #[test]
    fn test_missing_table() {
        let value = "A number.\n\nNothing else.\n";
        assert_eq!(
            check_value("Array: length", "javascript-instance-data-property", value),
            vec!["Value section must end in attributes table"]
        );
    }

    #[test]
    fn test_unrecognized_format() {
        let value = "Only one paragraph.\n";
        assert_eq!(
            check_value("Array: length", "javascript-instance-data-property", value),
            vec!["Unrecognized value section format"]
        );
        assert!(check_value("Error.prototype.stack", "javascript-instance-data-property", value).is_empty());
    }

    #[test]
    fn test_unknown_property_only_checks_shape() {
        let value = "A string.\n\n{{js_property_attributes(1, 0, 1)}}\n";
        assert!(check_value("Function: displayName", "javascript-instance-data-property", value).is_empty());
    }
}
