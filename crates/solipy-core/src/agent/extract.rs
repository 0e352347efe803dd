use regex::Regex;
use serde::Serialize;

/// Which extraction format matched the AI response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionFormat {
    /// `` ```vbs ``, `` ```vbscript `` or `` ```vb `` fence
    TaggedFence,
    /// Any other fence with a non-trivial body
    Fence,
    /// Unfenced reply split by VBScript line prefixes
    LineHeuristic,
}

/// Code pulled out of a reply plus whatever prose surrounded it.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    pub code: String,
    pub explanation: String,
    pub format: ExtractionFormat,
}

/// Bodies this short are treated as stray backticks, not code.
const MIN_BLOCK_LEN: usize = 10;

/// A fence may run to the end of the reply when the model was cut off.
fn fence_regex() -> Option<Regex> {
    Regex::new(r"```([A-Za-z0-9_+.-]*)[ \t]*\r?\n([\s\S]*?)(?:```|\z)").ok()
}

fn is_vbscript_tag(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "vbs" | "vbscript" | "vb"
    )
}

/// Extract a VBScript block from an AI response:
///
/// 1. the first fence tagged `vbs` / `vbscript` / `vb`
/// 2. the first other fence whose body is longer than a few characters
/// 3. an unfenced run of lines that look like VBScript
pub fn extract_script(response: &str) -> Option<ExtractionOutcome> {
    if let Some(outcome) = extract_fenced(response) {
        return Some(outcome);
    }
    if let Some(outcome) = try_line_heuristic(response) {
        return Some(outcome);
    }
    log::warn!(
        "No script found in AI response ({} chars)",
        response.len()
    );
    None
}

/// Fenced tiers only.
pub fn extract_fenced(response: &str) -> Option<ExtractionOutcome> {
    let re = fence_regex()?;
    let blocks: Vec<(String, String, std::ops::Range<usize>)> = re
        .captures_iter(response)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some((cap[1].to_string(), cap[2].to_string(), whole.range()))
        })
        .collect();

    let tagged = blocks
        .iter()
        .find(|(tag, body, _)| is_vbscript_tag(tag) && !body.trim().is_empty());
    let (chosen, format) = match tagged {
        Some(block) => (block, ExtractionFormat::TaggedFence),
        None => (
            blocks
                .iter()
                .find(|(_, body, _)| body.trim().len() > MIN_BLOCK_LEN)?,
            ExtractionFormat::Fence,
        ),
    };

    let explanation = collect_prose(response, blocks.iter().map(|(_, _, range)| range.clone()));
    Some(ExtractionOutcome {
        code: chosen.1.trim().to_string(),
        explanation,
        format,
    })
}

/// Text outside every fence, paragraph by paragraph, skipping fragments too
/// short to say anything.
fn collect_prose(
    response: &str,
    fences: impl Iterator<Item = std::ops::Range<usize>>,
) -> String {
    let mut parts = Vec::new();
    let mut cursor = 0;
    for range in fences {
        parts.push(&response[cursor..range.start]);
        cursor = range.end;
    }
    parts.push(&response[cursor..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| p.len() > MIN_BLOCK_LEN)
        .collect::<Vec<_>>()
        .join("\n")
}

fn starts_code(trimmed: &str) -> bool {
    trimmed.starts_with("Option Explicit")
        || trimmed.starts_with("Dim ")
        || trimmed.starts_with("Set ")
}

fn continues_code(trimmed: &str) -> bool {
    trimmed.is_empty()
        || trimmed.starts_with('\'')
        || trimmed.contains('=')
        || trimmed.starts_with("If ")
        || trimmed.starts_with("End ")
        || trimmed.starts_with("WScript.")
}

/// Tier 3: a code run opens on `Option Explicit` / `Dim ` / `Set ` and stays
/// open while lines are blank, comments, assignments, `If`/`End` or
/// `WScript.` calls. Anything else closes it and counts as explanation.
fn try_line_heuristic(response: &str) -> Option<ExtractionOutcome> {
    let mut in_code = false;
    let mut code_lines = Vec::new();
    let mut explanation_lines = Vec::new();

    for line in response.lines() {
        let trimmed = line.trim();
        if starts_code(trimmed) {
            in_code = true;
            code_lines.push(line);
        } else if in_code && continues_code(trimmed) {
            code_lines.push(line);
        } else {
            in_code = false;
            explanation_lines.push(line);
        }
    }

    let code = code_lines.join("\n").trim().to_string();
    if code.is_empty() {
        return None;
    }
    Some(ExtractionOutcome {
        code,
        explanation: explanation_lines.join("\n").trim().to_string(),
        format: ExtractionFormat::LineHeuristic,
    })
}

/// Script text for a generation reply: the fenced block if there is one,
/// otherwise the whole reply (the model was asked for bare code).
pub fn script_from_reply(response: &str) -> String {
    extract_fenced(response)
        .map(|o| o.code)
        .unwrap_or_else(|| response.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "Option Explicit\nDim swApp\nSet swApp = GetObject(, \"SldWorks.Application\")";

    #[test]
    fn test_tagged_fence() {
        let response = format!("Here you go:\n```vbs\n{}\n```\nThis connects to SolidWorks.", SCRIPT);
        let outcome = extract_script(&response).unwrap();
        assert_eq!(outcome.format, ExtractionFormat::TaggedFence);
        assert_eq!(outcome.code, SCRIPT);
        assert!(outcome.explanation.contains("This connects to SolidWorks."));
        assert!(!outcome.explanation.contains("```"));
    }

    #[test]
    fn test_unterminated_tagged_fence() {
        let response = format!("Here is the script:\n```vbs\n{}\nswApp.Visible = True", SCRIPT);
        let outcome = extract_script(&response).unwrap();
        assert_eq!(outcome.format, ExtractionFormat::TaggedFence);
        assert_eq!(outcome.code, format!("{}\nswApp.Visible = True", SCRIPT));
        assert_eq!(outcome.explanation, "Here is the script:");
        assert!(!script_from_reply(&response).contains("```"));
    }

    #[test]
    fn test_vbscript_and_vb_tags() {
        for tag in ["vbscript", "VB", "vb"] {
            let response = format!("```{}\n{}\n```", tag, SCRIPT);
            let outcome = extract_script(&response).unwrap();
            assert_eq!(outcome.format, ExtractionFormat::TaggedFence, "tag {tag}");
            assert_eq!(outcome.code, SCRIPT);
        }
    }

    #[test]
    fn test_tagged_fence_preferred_over_earlier_untagged() {
        let response = format!(
            "```\nThe error was on line 3\n```\n\n```vbscript\n{}\n```",
            SCRIPT
        );
        let outcome = extract_script(&response).unwrap();
        assert_eq!(outcome.format, ExtractionFormat::TaggedFence);
        assert_eq!(outcome.code, SCRIPT);
    }

    #[test]
    fn test_untagged_fence() {
        let response = format!("```\n{}\n```", SCRIPT);
        let outcome = extract_script(&response).unwrap();
        assert_eq!(outcome.format, ExtractionFormat::Fence);
        assert_eq!(outcome.code, SCRIPT);
    }

    #[test]
    fn test_tiny_untagged_fence_skipped() {
        let response = "Use ```\nx\n``` carefully.\nSet swApp = Nothing";
        let outcome = extract_script(response).unwrap();
        assert_eq!(outcome.format, ExtractionFormat::LineHeuristic);
        assert_eq!(outcome.code, "Set swApp = Nothing");
    }

    #[test]
    fn test_line_heuristic_splits_code_and_prose() {
        let response = "The call used parentheses on a Sub.\n\
Option Explicit\n\
Dim swApp\n\
' connect\n\
Set swApp = CreateObject(\"SldWorks.Application\")\n\
If swApp Is Nothing Then\n\
WScript.Echo \"failed\"\n\
End If\n\
That should fix it.";
        let outcome = extract_script(response).unwrap();
        assert_eq!(outcome.format, ExtractionFormat::LineHeuristic);
        assert!(outcome.code.starts_with("Option Explicit"));
        assert!(outcome.code.ends_with("End If"));
        assert_eq!(
            outcome.explanation,
            "The call used parentheses on a Sub.\nThat should fix it."
        );
    }

    #[test]
    fn test_line_heuristic_unknown_statement_ends_run() {
        let response = "Dim i\nFor i = 1 To 3\nNext\nSet x = Nothing";
        let outcome = extract_script(response).unwrap();
        // `Next` closes the run; `Set` opens a new one
        assert_eq!(outcome.code, "Dim i\nFor i = 1 To 3\nSet x = Nothing");
        assert_eq!(outcome.explanation, "Next");
    }

    #[test]
    fn test_no_code_returns_none() {
        assert!(extract_script("Sorry, I cannot help with that request.").is_none());
    }

    #[test]
    fn test_script_from_reply_uses_fence() {
        let response = format!("```vbs\n{}\n```", SCRIPT);
        assert_eq!(script_from_reply(&response), SCRIPT);
    }

    #[test]
    fn test_script_from_reply_falls_back_to_whole_reply() {
        let response = format!("\n{}\nFor i = 1 To 3\nNext\n", SCRIPT);
        assert_eq!(script_from_reply(&response), response.trim());
    }

    #[test]
    fn test_crlf_fence() {
        let response = "```vbs\r\nOption Explicit\r\nDim a\r\n```";
        let outcome = extract_script(response).unwrap();
        assert_eq!(outcome.format, ExtractionFormat::TaggedFence);
        assert!(outcome.code.starts_with("Option Explicit"));
    }
}
