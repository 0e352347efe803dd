use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffLine {
    pub tag: String, // "equal", "insert", "delete"
    pub text: String,
}

/// Line-level diff between the failing script and the proposed fix.
pub fn compute_diff(old_code: &str, new_code: &str) -> Vec<DiffLine> {
    let diff = TextDiff::from_lines(old_code, new_code);
    diff.iter_all_changes()
        .map(|change| {
            let tag = match change.tag() {
                ChangeTag::Equal => "equal",
                ChangeTag::Insert => "insert",
                ChangeTag::Delete => "delete",
            };
            DiffLine {
                tag: tag.to_string(),
                text: change.value().trim_end_matches(['\r', '\n']).to_string(),
            }
        })
        .collect()
}

pub fn diff_has_changes(diff: &[DiffLine]) -> bool {
    diff.iter().any(|line| line.tag != "equal")
}
