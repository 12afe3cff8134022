use super::Rule;
use crate::context::FileContext;
use crate::page::{BlockKind, CalloutKind};
use regex::Regex;
use std::sync::LazyLock;

static DEPRECATED_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\A\s*.*\{\{Deprecated_Header\}\}").expect("valid regex")
});

/// Pages that mention the replacement in their introduction.
const NOTE_IN_INTRO: &[&str] = &["Date.prototype.getYear()", "Date.prototype.setYear()"];

/// Deprecated pages start with the deprecation banner and point to a
/// replacement in a note before the first heading.
pub struct DeprecationNote;

impl Rule for DeprecationNote {
    fn name(&self) -> &'static str {
        "deprecation-note"
    }

    fn applies_to(&self, cx: &FileContext<'_>) -> bool {
        cx.front_matter().is_deprecated() && !NOTE_IN_INTRO.contains(&cx.title())
    }

    fn check(&self, cx: &mut FileContext<'_>) {
        if !DEPRECATED_HEADER.is_match(cx.page().source()) {
            cx.report("No deprecated header");
        }

        for block in cx.page().blocks() {
            match block.kind {
                BlockKind::Heading(_) => {
                    cx.report("No replacement note");
                    break;
                }
                BlockKind::Callout(CalloutKind::Note) => break,
                _ => {}
            }
        }
    }
}
