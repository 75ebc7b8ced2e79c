//! Normalization of the informal statement and proof fields.
//!
//! Dataset text mixes prose, loosely delimited LaTeX and stray HTML. The
//! pipeline below rewrites it into prose plus LaTeX that a client-side math
//! renderer can typeset. Rules run strictly in order; later rules rely on the
//! output shape of earlier ones.

use crate::errors::FieldIssue;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const SHOW_PHRASE: &str = "Show that it is";

/// Characters inspected before an environment block when deciding whether it
/// already sits inside math mode.
const MATH_CONTEXT_WINDOW: usize = 10;

const BLOCK_ENVIRONMENTS: [&str; 12] = [
    "align",
    "align*",
    "cases",
    "array",
    "matrix",
    "pmatrix",
    "bmatrix",
    "Bmatrix",
    "vmatrix",
    "Vmatrix",
    "smallmatrix",
    "tabular",
];

static RE_BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)</?(?:div|p|center|section|article|ol|ul|li|table|tr|td|th|thead|tbody|tfoot)[^>]*>",
    )
    .unwrap()
});
static RE_BREAK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static RE_HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[a-zA-Z][a-zA-Z0-9]*[^<>]*>").unwrap());
static RE_DOUBLE_BRACKET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\]\n]+)\]\]").unwrap());
static RE_MATH_BEFORE_SHOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$[^$]*\$)\s*(Show that it is)").unwrap());
static RE_CASES_AFTER_OPERATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(=|:)\s*\$\$\s*(\\begin\{cases\}[\s\S]*?\\end\{cases\})\s*\$\$").unwrap()
});
static RE_EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

static ENVIRONMENT_PATTERNS: Lazy<Vec<EnvironmentPatterns>> = Lazy::new(|| {
    BLOCK_ENVIRONMENTS
        .iter()
        .map(|env| EnvironmentPatterns::new(env))
        .collect()
});

struct EnvironmentPatterns {
    /// `$ \begin{env}...\end{env} $`, block captured as group 1.
    inline: Regex,
    /// A bare `\begin{env}...\end{env}` block.
    bare: Regex,
}

impl EnvironmentPatterns {
    fn new(env: &str) -> Self {
        let name = regex::escape(env);
        let block = format!(r"\\begin\{{{name}\}}[\s\S]*?\\end\{{{name}\}}");
        Self {
            inline: Regex::new(&format!(r"\$\s*({block})\s*\$")).unwrap(),
            bare: Regex::new(&block).unwrap(),
        }
    }
}

type Rule = fn(&str) -> String;

/// Rewrite rules in application order. No rule de-escapes backslashes: JSON
/// decoding has already done that, and LaTeX line breaks (`\\`) must survive.
const PIPELINE: [(&str, Rule); 12] = [
    ("line-endings", normalize_line_endings),
    ("block-tags", block_tags_to_newlines),
    ("break-tags", break_tags_to_newlines),
    ("html-tags", strip_html_tags),
    ("double-brackets", unwrap_double_brackets),
    ("latex-commands", normalize_latex_commands),
    ("show-phrase-break", break_before_show_phrase),
    ("show-phrase-wrap", wrap_show_phrase_lines),
    ("inline-environments", upgrade_inline_environments),
    ("bare-environments", wrap_bare_environments),
    ("cases-after-operator", unwrap_cases_after_operator),
    ("blank-lines", collapse_blank_lines),
];

/// Text of a raw JSON field before normalization, remembering how it was
/// obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldText<'a> {
    Text(&'a str),
    Missing,
    Coerced { text: String, found: &'static str },
}

impl<'a> FieldText<'a> {
    pub fn from_json(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => FieldText::Missing,
            Some(Value::String(text)) => FieldText::Text(text),
            Some(other) => FieldText::Coerced {
                text: other.to_string(),
                found: json_type_name(other),
            },
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldText::Text(text) => *text,
            FieldText::Missing => "",
            FieldText::Coerced { text, .. } => text.as_str(),
        }
    }

    pub fn issue(&self) -> Option<FieldIssue> {
        match self {
            FieldText::Text(_) => None,
            FieldText::Missing => Some(FieldIssue::MissingData),
            FieldText::Coerced { found, .. } => Some(FieldIssue::TypeMismatch { found: *found }),
        }
    }

    /// Owned text without normalization; `None` when the field was missing.
    pub fn into_plain(self) -> Option<String> {
        match self {
            FieldText::Text(text) => Some(text.to_string()),
            FieldText::Missing => None,
            FieldText::Coerced { text, .. } => Some(text),
        }
    }
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalize a raw JSON field. Absent and null values become the empty
/// string; other non-strings are normalized from their JSON text.
pub fn normalize_field(field: &FieldText<'_>) -> String {
    normalize_text(field.as_str())
}

/// Run the full rewrite pipeline over one text field.
pub fn normalize_text(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }

    PIPELINE
        .iter()
        .fold(input.to_string(), |text, (name, rule)| {
            let rewritten = rule(&text);
            if rewritten != text {
                tracing::trace!(rule = *name, "Rewrite rule changed text");
            }
            rewritten
        })
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn block_tags_to_newlines(text: &str) -> String {
    RE_BLOCK_TAG.replace_all(text, "\n").into_owned()
}

fn break_tags_to_newlines(text: &str) -> String {
    RE_BREAK_TAG.replace_all(text, "\n").into_owned()
}

/// Only `<` (or `</`) directly followed by a letter starts a tag, so
/// inequalities such as `0<x` or `a < b` are kept.
fn strip_html_tags(text: &str) -> String {
    RE_HTML_TAG.replace_all(text, "").into_owned()
}

fn unwrap_double_brackets(text: &str) -> String {
    RE_DOUBLE_BRACKET.replace_all(text, "${1}").into_owned()
}

fn normalize_latex_commands(text: &str) -> String {
    text.replace(r"\hdots", r"\ldots")
}

fn break_before_show_phrase(text: &str) -> String {
    RE_MATH_BEFORE_SHOW
        .replace_all(text, "${1}\n\n${2}")
        .into_owned()
}

/// Splits on every line boundary, not only `\n`, and drops one trailing empty
/// line. Each boundary comes back as `\n`.
fn wrap_show_phrase_lines(text: &str) -> String {
    let mut lines: Vec<&str> = text.split(is_line_break).collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
        .into_iter()
        .map(wrap_show_phrase)
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Wrap the bare expression after the phrase in inline math. Lines whose tail
/// already carries a math delimiter, or has nothing left after trimming
/// trailing periods, are returned as is.
fn wrap_show_phrase(line: &str) -> String {
    let Some(start) = line.find(SHOW_PHRASE) else {
        return line.to_string();
    };
    let tail = line[start + SHOW_PHRASE.len()..].trim();
    if tail.is_empty() || has_math_delimiter(tail) {
        return line.to_string();
    }
    let expr = tail.trim_end_matches('.');
    if expr.trim().is_empty() {
        return line.to_string();
    }
    format!("{}{SHOW_PHRASE} ${expr}$", &line[..start])
}

fn has_math_delimiter(text: &str) -> bool {
    text.contains('$') || text.contains(r"\(") || text.contains(r"\[")
}

/// `$\begin{env}...\end{env}$` becomes `$$\begin{env}...\end{env}$$`. Blocks
/// already between `$$` are left alone.
fn upgrade_inline_environments(text: &str) -> String {
    ENVIRONMENT_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, patterns| {
            upgrade_inline_blocks(&acc, &patterns.inline)
        })
}

fn upgrade_inline_blocks(text: &str, pattern: &Regex) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let (Some(whole), Some(block)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        if text[..whole.start()].ends_with('$') || text[whole.end()..].starts_with('$') {
            out.push_str(whole.as_str());
        } else {
            out.push_str("$$");
            out.push_str(block.as_str());
            out.push_str("$$");
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Wrap environment blocks that are not already in math mode in `$$...$$`.
/// Each environment is scanned over the output of the previous one.
fn wrap_bare_environments(text: &str) -> String {
    ENVIRONMENT_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, patterns| {
            wrap_bare_blocks(&acc, &patterns.bare)
        })
}

fn wrap_bare_blocks(text: &str, pattern: &Regex) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for block in pattern.find_iter(text) {
        let before = &text[..block.start()];
        let after = &text[block.end()..];
        out.push_str(&text[last..block.start()]);
        let display_wrapped =
            before.trim_end().ends_with("$$") && after.trim_start().starts_with("$$");
        if display_wrapped || in_math_context(before) {
            out.push_str(block.as_str());
        } else {
            out.push_str("$$");
            out.push_str(block.as_str());
            out.push_str("$$");
        }
        last = block.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Fixed-window guess at whether `prefix` ends inside math mode: an unclosed
/// `\[` or `\(`, or an odd number of `$`, among its last ten characters.
fn in_math_context(prefix: &str) -> bool {
    let window_start = prefix
        .char_indices()
        .rev()
        .nth(MATH_CONTEXT_WINDOW - 1)
        .map_or(0, |(idx, _)| idx);
    let window = &prefix[window_start..];

    window.matches(r"\[").count() > window.matches(r"\]").count()
        || window.matches(r"\(").count() > window.matches(r"\)").count()
        || window.matches('$').count() % 2 == 1
}

/// `= $$\begin{cases}...\end{cases}$$` keeps the cases block inline after the
/// operator.
fn unwrap_cases_after_operator(text: &str) -> String {
    RE_CASES_AFTER_OPERATOR
        .replace_all(text, "${1} ${2}")
        .into_owned()
}

fn collapse_blank_lines(text: &str) -> String {
    RE_EXCESS_NEWLINES.replace_all(text, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize_json(value: Option<&Value>) -> String {
        normalize_field(&FieldText::from_json(value))
    }

    #[test]
    fn missing_null_and_blank_fields_are_empty() {
        assert_eq!(normalize_json(None), "");
        assert_eq!(normalize_json(Some(&Value::Null)), "");
        assert_eq!(normalize_json(Some(&json!("  \n\t "))), "");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn non_string_fields_are_coerced() {
        assert_eq!(normalize_json(Some(&json!(42))), "42");
        assert_eq!(normalize_json(Some(&json!(true))), "true");

        let value = json!([1, 2]);
        let field = FieldText::from_json(Some(&value));
        assert_eq!(field.as_str(), "[1,2]");
        assert_eq!(
            field.issue(),
            Some(FieldIssue::TypeMismatch { found: "array" })
        );
        assert_eq!(
            FieldText::from_json(None).issue(),
            Some(FieldIssue::MissingData)
        );
    }

    #[test]
    fn carriage_returns_become_newlines() {
        assert_eq!(normalize_text("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn block_and_inline_tags_are_removed() {
        assert_eq!(
            normalize_text("<p>Prove that <b>x&lt;y</b> implies x is rational.</p>"),
            "\nProve that x&lt;y implies x is rational."
        );
        assert_eq!(
            normalize_text("<div class=\"q\">A</div><TD>B</td>"),
            "\nA\n\nB"
        );
        assert_eq!(normalize_text("a<br>b<BR />c<br/>d"), "a\nb\nc\nd");
    }

    #[test]
    fn inequalities_are_not_mistaken_for_tags() {
        assert_eq!(normalize_text("$0<x<1$ and $a < b$"), "$0<x<1$ and $a < b$");
        assert_eq!(normalize_text("if 3 > 2 then 1<2"), "if 3 > 2 then 1<2");
    }

    #[test]
    fn second_pass_does_not_strip_more() {
        let once = normalize_text("Let <i>x</i> satisfy $x^2 \\hdots$.\n\n\n\nShow that it is 4.");
        assert_eq!(once, "Let x satisfy $x^2 \\ldots$.\n\nShow that it is $4$");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn double_brackets_are_unwrapped_on_one_line() {
        assert_eq!(normalize_text("see [[foo bar]] here"), "see foo bar here");
        assert_eq!(normalize_text("[[a\nb]]"), "[[a\nb]]");
    }

    #[test]
    fn hdots_becomes_ldots() {
        assert_eq!(
            normalize_text("$a_1, \\hdots, a_n$"),
            "$a_1, \\ldots, a_n$"
        );
        assert_eq!(normalize_text("x\\\\y"), "x\\\\y");
    }

    #[test]
    fn show_phrase_is_split_from_math_and_wrapped() {
        assert_eq!(
            normalize_text("Let $x = 2$ Show that it is 4."),
            "Let $x = 2$\n\nShow that it is $4$"
        );
        assert_eq!(
            normalize_text("Show that it is \\frac{1}{2}..."),
            "Show that it is $\\frac{1}{2}$"
        );
    }

    #[test]
    fn show_phrase_with_existing_math_is_untouched() {
        let text = "Show that it is $\\frac{1}{2}$.";
        assert_eq!(normalize_text(text), text);
        let text = "Show that it is \\(3\\).";
        assert_eq!(normalize_text(text), text);
        assert_eq!(normalize_text("Show that it is ."), "Show that it is .");
    }

    #[test]
    fn bare_environment_gets_display_math() {
        assert_eq!(
            normalize_text("\\begin{align}x &= 1\\end{align}"),
            "$$\\begin{align}x &= 1\\end{align}$$"
        );
        assert_eq!(
            normalize_text("\\begin{align*}a\\\\b\\end{align*}"),
            "$$\\begin{align*}a\\\\b\\end{align*}$$"
        );
    }

    #[test]
    fn environment_inside_math_is_left_alone() {
        let text = "\\[\\begin{align}x &= 1\\end{align}\\]";
        assert_eq!(normalize_text(text), text);
        let text = "$f(x) = \\begin{cases}1 & x>0\\\\0\\end{cases}$";
        assert_eq!(normalize_text(text), text);
    }

    #[test]
    fn inline_environment_is_upgraded_once() {
        let once = normalize_text("Consider $ \\begin{pmatrix}1 & 2\\end{pmatrix} $ here.");
        assert_eq!(once, "Consider $$\\begin{pmatrix}1 & 2\\end{pmatrix}$$ here.");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn display_math_with_inner_whitespace_is_not_rewrapped() {
        let spaced = "$$ \\begin{align}x &= 1\\end{align} $$";
        assert_eq!(normalize_text(spaced), spaced);
        let broken = "$$\n\\begin{cases}1\\\\0\\end{cases}\n$$";
        assert_eq!(normalize_text(broken), broken);
    }

    #[test]
    fn phrase_lines_split_on_unicode_line_breaks() {
        assert_eq!(
            normalize_text("Show that it is\u{2028}5."),
            "Show that it is\n5."
        );
        assert_eq!(
            normalize_text("a\x0cShow that it is 5.\u{85}b"),
            "a\nShow that it is $5$\nb"
        );
    }

    #[test]
    fn cases_after_operator_stays_inline() {
        assert_eq!(
            normalize_text("Let f(x) = \\begin{cases}1\\\\0\\end{cases} for all x."),
            "Let f(x) = \\begin{cases}1\\\\0\\end{cases} for all x."
        );
        assert_eq!(
            normalize_text("Define:\n\\begin{cases}a\\end{cases}"),
            "Define: \\begin{cases}a\\end{cases}"
        );
    }

    #[test]
    fn math_context_window_is_ten_characters() {
        assert!(in_math_context("$x = "));
        assert!(!in_math_context("$ab$ = "));
        assert!(in_math_context("\\( y + "));
        assert!(!in_math_context("\\[ 1234567890 "));
        assert!(in_math_context("é\\[ñ"));
    }

    #[test]
    fn runs_of_blank_lines_collapse_to_one() {
        assert_eq!(normalize_text("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize_text("a\n\nb"), "a\n\nb");
    }
}
