use super::Rule;
use crate::context::FileContext;
use crate::page::BlockKind;

/// List items that look like definition details but were not recognized as
/// part of a definition list, usually because of bad indentation.
pub struct BadDl;

impl Rule for BadDl {
    fn name(&self) -> &'static str {
        "bad-dl"
    }

    fn applies_to(&self, _cx: &FileContext<'_>) -> bool {
        true
    }

    fn check(&self, cx: &mut FileContext<'_>) {
        let page = cx.page();
        let broken = page
            .walk()
            .into_iter()
            .filter(|block| block.kind == BlockKind::Item)
            .filter(|item| {
                item.children.first().is_some_and(|first| {
                    first.kind == BlockKind::Paragraph && page.text(first).starts_with(": ")
                })
            })
            .count();
        for _ in 0..broken {
            cx.report("Bad dl");
        }
    }
}
