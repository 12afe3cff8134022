//! Edit-script computation between two ordered string sequences.
//!
//! This is a plain Levenshtein alignment (unit cost delete/insert/substitute,
//! no transposition) that keeps the chosen path so the caller gets back a
//! minimal script rather than just a distance. Checks use it to diff a page's
//! observed headings or member list against what is expected.
//!
//! When several minimal scripts exist, the one produced is fixed by a
//! per-cell priority: delete, then insert, then substitute.
//!
//! ```
//! use escheck_core::edit::{Edit, edit_script};
//!
//! let edits = edit_script(&["A", "B", "C"], &["A", "C"]);
//! assert_eq!(edits, vec![Edit::Delete("B".to_string())]);
//! ```

use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::fmt;

/// One edit operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Edit {
    /// Remove an element of the source sequence
    Delete(String),
    /// Add an element of the target sequence
    Insert(String),
    /// Replace a source element by a target element
    Substitute(String, String),
}

impl Edit {
    /// The one-letter tag used in serialized output (`d`, `i`, `s`).
    pub fn tag(&self) -> &'static str {
        match self {
            Edit::Delete(_) => "d",
            Edit::Insert(_) => "i",
            Edit::Substitute(..) => "s",
        }
    }

    /// The text this edit is about: the deleted or inserted element, or the
    /// source side of a substitution.
    pub fn text(&self) -> &str {
        match self {
            Edit::Delete(s) | Edit::Insert(s) | Edit::Substitute(s, _) => s,
        }
    }
}

/// Renders the diagnostic line for an edit, e.g. `missing "Syntax"`.
impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Delete(s) => write!(f, "extra \"{s}\""),
            Edit::Insert(s) => write!(f, "missing \"{s}\""),
            Edit::Substitute(from, to) => write!(f, "\"{from}\" should be \"{to}\""),
        }
    }
}

/// Serialized as `["d", text]`, `["i", text]` or `["s", from, to]`.
impl Serialize for Edit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Edit::Delete(s) | Edit::Insert(s) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(self.tag())?;
                tuple.serialize_element(s)?;
                tuple.end()
            }
            Edit::Substitute(from, to) => {
                let mut tuple = serializer.serialize_tuple(3)?;
                tuple.serialize_element(self.tag())?;
                tuple.serialize_element(from)?;
                tuple.serialize_element(to)?;
                tuple.end()
            }
        }
    }
}

/// A step of a full alignment: either an edit, or an element kept as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Keep(String),
    Edit(Edit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Origin,
    Keep,
    Delete,
    Insert,
    Substitute,
}

/// Compute a minimal edit script turning `from` into `to`.
///
/// Returns an empty script iff the sequences are equal.
pub fn edit_script<S: AsRef<str>, T: AsRef<str>>(from: &[S], to: &[T]) -> Vec<Edit> {
    align(from, to)
        .into_iter()
        .filter_map(|step| match step {
            Step::Keep(_) => None,
            Step::Edit(edit) => Some(edit),
        })
        .collect()
}

/// Compute the full alignment between `from` and `to`, including the
/// elements that are kept.
///
/// Replaying the steps in order reproduces `to`; see [`replay`].
pub fn align<S: AsRef<str>, T: AsRef<str>>(from: &[S], to: &[T]) -> Vec<Step> {
    let n = from.len();
    let m = to.len();
    let width = m + 1;

    // cost[i * width + j] is the edit distance between from[..i] and to[..j];
    // moves[..] remembers which predecessor produced it.
    let mut cost = vec![0usize; (n + 1) * width];
    let mut moves = vec![Move::Origin; (n + 1) * width];

    for i in 1..=n {
        cost[i * width] = i;
        moves[i * width] = Move::Delete;
    }
    for j in 1..=m {
        cost[j] = j;
        moves[j] = Move::Insert;
    }

    for i in 0..n {
        for j in 0..m {
            let cell = (i + 1) * width + (j + 1);
            if from[i].as_ref() == to[j].as_ref() {
                cost[cell] = cost[i * width + j];
                moves[cell] = Move::Keep;
                continue;
            }
            let delete = cost[i * width + (j + 1)];
            let insert = cost[(i + 1) * width + j];
            let substitute = cost[i * width + j];
            let (best, mv) = if delete <= insert && delete <= substitute {
                (delete, Move::Delete)
            } else if insert <= substitute {
                (insert, Move::Insert)
            } else {
                (substitute, Move::Substitute)
            };
            cost[cell] = best + 1;
            moves[cell] = mv;
        }
    }

    let mut steps = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        match moves[i * width + j] {
            Move::Keep => {
                steps.push(Step::Keep(from[i - 1].as_ref().to_string()));
                i -= 1;
                j -= 1;
            }
            Move::Delete => {
                steps.push(Step::Edit(Edit::Delete(from[i - 1].as_ref().to_string())));
                i -= 1;
            }
            Move::Insert => {
                steps.push(Step::Edit(Edit::Insert(to[j - 1].as_ref().to_string())));
                j -= 1;
            }
            Move::Substitute => {
                steps.push(Step::Edit(Edit::Substitute(
                    from[i - 1].as_ref().to_string(),
                    to[j - 1].as_ref().to_string(),
                )));
                i -= 1;
                j -= 1;
            }
            Move::Origin => unreachable!("origin cell is only reachable at (0, 0)"),
        }
    }
    steps.reverse();
    steps
}

/// Replay an alignment, producing the target sequence.
pub fn replay(steps: &[Step]) -> Vec<String> {
    steps
        .iter()
        .filter_map(|step| match step {
            Step::Keep(s) | Step::Edit(Edit::Insert(s)) | Step::Edit(Edit::Substitute(_, s)) => {
                Some(s.clone())
            }
            Step::Edit(Edit::Delete(_)) => None,
        })
        .collect()
}

/// Plain edit distance, used to cross-check script lengths.
pub fn distance<S: AsRef<str>, T: AsRef<str>>(from: &[S], to: &[T]) -> usize {
    let mut prev: Vec<usize> = (0..=to.len()).collect();
    for (i, a) in from.iter().enumerate() {
        let mut row = vec![i + 1; to.len() + 1];
        for (j, b) in to.iter().enumerate() {
            row[j + 1] = if a.as_ref() == b.as_ref() {
                prev[j]
            } else {
                1 + prev[j].min(prev[j + 1]).min(row[j])
            };
        }
        prev = row;
    }
    prev[to.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Edit {
        Edit::Delete(s.to_string())
    }

    fn i(s: &str) -> Edit {
        Edit::Insert(s.to_string())
    }

    fn s(a: &str, b: &str) -> Edit {
        Edit::Substitute(a.to_string(), b.to_string())
    }

    fn source_of(steps: &[Step]) -> Vec<String> {
        steps
            .iter()
            .filter_map(|step| match step {
                Step::Keep(x)
                | Step::Edit(Edit::Delete(x))
                | Step::Edit(Edit::Substitute(x, _)) => Some(x.clone()),
                Step::Edit(Edit::Insert(_)) => None,
            })
            .collect()
    }

    #[test]
    fn test_identical_sequences_need_no_edits() {
        assert!(edit_script(&["A", "B", "C"], &["A", "B", "C"]).is_empty());
    }

    #[test]
    fn test_single_insert() {
        assert_eq!(edit_script(&["A", "B"], &["A", "X", "B"]), vec![i("X")]);
    }

    #[test]
    fn test_single_delete() {
        assert_eq!(edit_script(&["A", "B", "C"], &["A", "C"]), vec![d("B")]);
    }

    #[test]
    fn test_single_substitute() {
        assert_eq!(edit_script(&["A"], &["B"]), vec![s("A", "B")]);
    }

    #[test]
    fn test_empty_sides() {
        let empty: [&str; 0] = [];
        assert!(edit_script(&empty, &empty).is_empty());
        assert_eq!(edit_script(&["A", "B"], &empty), vec![d("A"), d("B")]);
        assert_eq!(edit_script(&empty, &["A", "B"]), vec![i("A"), i("B")]);
    }

    #[test]
    fn test_disjoint_sequences_substitute_pairwise() {
        // Same length, nothing in common: substitutions are the only way to
        // reach distance 2.
        assert_eq!(
            edit_script(&["A", "B"], &["X", "Y"]),
            vec![s("A", "X"), s("B", "Y")]
        );
    }

    #[test]
    fn test_tie_break_is_fixed() {
        // ["A","B"] -> ["B","A"] has several scripts of length 2; the last
        // cell prefers dropping "B", which leaves "A" to be kept.
        let edits = edit_script(&["A", "B"], &["B", "A"]);
        assert_eq!(edits, vec![i("B"), d("B")]);
    }

    #[test]
    fn test_heading_sequence_diagnostic() {
        let observed = ["Syntax", "Examples", "See also"];
        let expected = [
            "Syntax",
            "Description",
            "Examples",
            "Specifications",
            "Browser compatibility",
            "See also",
        ];
        let edits = edit_script(&observed, &expected);
        let rendered: Vec<String> = edits.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "missing \"Description\"",
                "missing \"Specifications\"",
                "missing \"Browser compatibility\"",
            ]
        );
    }

    #[test]
    fn test_alignment_replays_to_target_and_length_is_minimal() {
        let cases: Vec<(Vec<&str>, Vec<&str>)> = vec![
            (vec![], vec![]),
            (vec!["A"], vec![]),
            (vec![], vec!["A"]),
            (vec!["A", "B", "C"], vec!["A", "B", "C"]),
            (vec!["A", "B"], vec!["X", "Y", "Z"]),
            (vec!["A", "A", "B", "A"], vec!["A", "B", "B", "A", "A"]),
            (
                vec!["Description", "Constructor", "Static methods", "See also"],
                vec![
                    "Description",
                    "Constructor",
                    "Static properties",
                    "Static methods",
                    "Instance methods",
                    "Examples",
                    "See also",
                ],
            ),
            (vec!["k", "i", "t", "t", "e", "n"], vec!["s", "i", "t", "t", "i", "n", "g"]),
        ];
        for (from, to) in cases {
            let steps = align(&from, &to);
            assert_eq!(replay(&steps), to, "replay of {from:?} -> {to:?}");
            assert_eq!(source_of(&steps), from, "source side of {from:?} -> {to:?}");
            let edits = edit_script(&from, &to);
            assert_eq!(edits.len(), distance(&from, &to), "{from:?} -> {to:?}");
        }
    }

    #[test]
    fn test_known_distance() {
        let kitten = ["k", "i", "t", "t", "e", "n"];
        let sitting = ["s", "i", "t", "t", "i", "n", "g"];
        assert_eq!(distance(&kitten, &sitting), 3);
        assert_eq!(edit_script(&kitten, &sitting).len(), 3);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_string(&vec![d("A"), i("B"), s("C", "D")]).unwrap();
        assert_eq!(json, r#"[["d","A"],["i","B"],["s","C","D"]]"#);
    }
}
