//! Checking rules.
//!
//! Every rule looks at one page at a time through a [`FileContext`]; rules
//! that need the whole page set report from [`Rule::on_exit`] instead.

use crate::config::Config;
use crate::context::{ExitContext, FileContext, RunContext};
use crate::output::{EXIT_PATH, Reports};
use escheck_core::Edit;
use rayon::prelude::*;

mod bad_dl;
mod class_members;
mod data_prop;
mod deprecation_note;
mod description;
mod heading;
mod spec_alignment;
mod syntax_section;

pub use bad_dl::BadDl;
pub use class_members::ClassMembers;
pub use data_prop::DataProp;
pub use deprecation_note::DeprecationNote;
pub use description::Description;
pub use heading::Heading;
pub use spec_alignment::SpecAlignment;
pub use syntax_section::SyntaxSection;

pub trait Rule: Send + Sync {
    /// Name used in the config file and in reports.
    fn name(&self) -> &'static str;

    fn applies_to(&self, cx: &FileContext<'_>) -> bool;

    fn check(&self, cx: &mut FileContext<'_>);

    /// Called once after every page was checked.
    fn on_exit(&self, _cx: &mut ExitContext<'_>) {}
}

/// Every known rule, in the order they run.
pub fn all() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(BadDl),
        Box::new(ClassMembers),
        Box::new(DataProp),
        Box::new(DeprecationNote),
        Box::new(Description),
        Box::new(Heading),
        Box::new(SpecAlignment),
        Box::new(SyntaxSection),
    ]
}

/// The rules turned on in `config`.
pub fn enabled(config: &Config) -> Vec<Box<dyn Rule>> {
    all()
        .into_iter()
        .filter(|rule| config.is_enabled(rule.name()))
        .collect()
}

/// Run `rules` over every page, then their exit hooks.
pub fn run(run: &RunContext, rules: &[Box<dyn Rule>]) -> Reports {
    let per_page: Vec<_> = run
        .documents()
        .par_iter()
        .map(|(path, document)| {
            let mut found = Vec::new();
            for rule in rules {
                let mut cx = FileContext::new(run, document);
                if !rule.applies_to(&cx) {
                    continue;
                }
                rule.check(&mut cx);
                let messages = cx.into_messages();
                if !messages.is_empty() {
                    tracing::debug!(
                        "{} reported {} issues on {}",
                        rule.name(),
                        messages.len(),
                        path.display()
                    );
                    found.push((rule.name(), messages));
                }
            }
            (run.display_path(path), document.front_matter.title.clone(), found)
        })
        .collect();

    let mut reports = Reports::default();
    for (path, title, found) in per_page {
        for (rule, messages) in found {
            reports.add(&path, Some(&title), rule, messages);
        }
    }

    for rule in rules {
        let mut cx = ExitContext::new(run);
        rule.on_exit(&mut cx);
        let messages = cx.into_messages();
        if !messages.is_empty() {
            reports.add(EXIT_PATH, None, rule.name(), messages);
        }
    }
    reports
}

/// A report listing edit operations under a header line.
pub(crate) fn render_edits(header: &str, edits: &[Edit]) -> String {
    let lines: Vec<String> = edits.iter().map(ToString::to_string).collect();
    format!("{}\n- {}", header, lines.join("\n- "))
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use escheck_core::Catalog;

    #[test]
    fn test_registry_names_are_unique_and_sorted() {
        let names: Vec<&str> = all().iter().map(|r| r.name()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_enabled_follows_config() {
        let mut config = Config::default();
        config.rules.insert("heading".to_string(), true);
        config.rules.insert("bad-dl".to_string(), false);
        let names: Vec<&str> = enabled(&config).iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["heading"]);
    }

    #[test]
    fn test_render_edits() {
        let edits = vec![
            Edit::Delete("A".to_string()),
            Edit::Insert("B".to_string()),
            Edit::Substitute("C".to_string(), "D".to_string()),
        ];
        assert_eq!(
            render_edits("Unexpected headings:", &edits),
            "Unexpected headings:\n- extra \"A\"\n- missing \"B\"\n- \"C\" should be \"D\""
        );
    }

    #[test]
    fn test_run_groups_reports_by_page() {
        let context = run_context(
            Catalog::default(),
            vec![
                page(
                    "reference/global_objects/array/at",
                    "Array.prototype.at()",
                    "javascript-instance-method",
                    "## Syntax\n\n- : broken\n",
                ),
                page("reference/global_objects/array/of", "Array.of()", "javascript-static-method", "Fine.\n"),
            ],
        );
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(BadDl)];
        let reports = run(&context, &rules);
        assert_eq!(reports.len(), 1);
        let path = "files/en-us/web/javascript/reference/global_objects/array/at/index.md";
        assert_eq!(reports.messages(path, "bad-dl"), ["Bad dl".to_string()]);
    }
}
