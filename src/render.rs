//! HTML rendering of the partitioned dataset for the index page.
//!
//! The page is rendered once into memory and served as is; its ETag is the
//! SHA-256 digest of the body.

use crate::dataset::{Dataset, Record};
use sha2::{Digest, Sha256};
use std::io::{self, Write};

pub(crate) const PRIMARY_LABEL: &str = "valid";
pub(crate) const SECONDARY_LABEL: &str = "test";

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en"><head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>miniF2F informal statements</title>
<script>
window.MathJax = {
  tex: {
    inlineMath: [['$', '$'], ['\\(', '\\)']],
    displayMath: [['$$', '$$'], ['\\[', '\\]']],
    processEscapes: true
  }
};
</script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
<style>
body { font-family: sans-serif; max-width: 960px; margin: 0 auto; padding: 1em; line-height: 1.5 }
nav a { margin-right: 1em }
.problem { border: 1px solid #B2B2B2; border-radius: 4px; margin: 1em 0; padding: 0.5em 1em }
.problem h3 { margin: 0.2em 0; color: #006633 }
.problem .name { color: #666; font-weight: normal; font-size: 0.85em }
.text { white-space: pre-wrap }
.proof { background: #EEFFFA; padding: 0.5em; margin-top: 0.5em }
</style>
</head>
<body>
"#;

/// The index page, rendered once from an immutable dataset.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    body: String,
    etag: String,
}

impl RenderedPage {
    pub fn new(dataset: &Dataset) -> io::Result<Self> {
        let mut buf = Vec::new();
        show_index(&mut buf, dataset)?;
        let body =
            String::from_utf8(buf).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let etag = format!("\"{:x}\"", Sha256::digest(body.as_bytes()));
        Ok(Self { body, etag })
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Strong entity tag, already quoted.
    pub fn etag(&self) -> &str {
        &self.etag
    }
}

pub fn show_index(w: &mut impl Write, dataset: &Dataset) -> io::Result<()> {
    w.write_all(PAGE_HEAD.as_bytes())?;
    writeln!(w, "<h1>miniF2F informal statements</h1>")?;
    writeln!(
        w,
        "<nav><a href=\"#{PRIMARY_LABEL}\">{PRIMARY_LABEL} ({})</a>\
        <a href=\"#{SECONDARY_LABEL}\">{SECONDARY_LABEL} ({})</a></nav>",
        dataset.primary().len(),
        dataset.secondary().len()
    )?;
    show_partition(w, PRIMARY_LABEL, dataset.primary())?;
    show_partition(w, SECONDARY_LABEL, dataset.secondary())?;
    let stats = dataset.stats();
    writeln!(
        w,
        "<footer><p>{} records loaded, {} lines skipped.</p></footer>\n</body></html>",
        stats.records, stats.skipped
    )
}

fn show_partition(w: &mut impl Write, label: &str, records: &[Record]) -> io::Result<()> {
    writeln!(w, "<section id=\"{label}\">\n<h2>{label}</h2>")?;
    if records.is_empty() {
        writeln!(w, "<p>No problems.</p>")?;
    }
    for record in records {
        let anchor = format!("{label}-{}", record.display_index);
        write!(
            w,
            "<article class=\"problem\" id=\"{anchor}\" title=\"#{}\"",
            record.index
        )?;
        if let Some(id) = &record.id {
            write!(w, " data-problem-id=\"{}\"", escape_html(id))?;
        }
        if let Some(split) = &record.split {
            write!(w, " data-split=\"{}\"", escape_html(split))?;
        }
        writeln!(w, ">")?;
        write!(w, "<h3>{anchor}")?;
        if let Some(name) = &record.name {
            write!(w, " <span class=\"name\">{}</span>", escape_html(name))?;
        }
        writeln!(w, "</h3>")?;
        writeln!(
            w,
            "<div class=\"text statement\">{}</div>",
            escape_html(&record.informal_stmt)
        )?;
        if !record.informal_proof.is_empty() {
            writeln!(
                w,
                "<div class=\"text proof\"><b>Proof.</b> {}</div>",
                escape_html(&record.informal_proof)
            )?;
        }
        writeln!(w, "</article>")?;
    }
    writeln!(w, "</section>")
}

/// Field text is embedded as text, never as markup. MathJax reads the
/// unescaped characters back from the DOM.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{LoadStats, Record};

    fn sample(count: usize) -> Dataset {
        let records = (1..=count)
            .map(|index| Record {
                id: Some(index.to_string()),
                split: None,
                name: Some(format!("mathd_{index}")),
                informal_stmt: format!("Show that $0<x_{index}$ & more"),
                informal_proof: if index % 2 == 0 {
                    String::new()
                } else {
                    "Trivial.".to_string()
                },
                index,
                display_index: index,
            })
            .collect();
        Dataset::from_records(
            records,
            LoadStats {
                lines_read: count + 1,
                records: count,
                skipped: 1,
            },
        )
    }

    #[test]
    fn page_lists_both_partitions_with_display_indices() {
        let page = RenderedPage::new(&sample(246)).expect("render");
        let body = page.body();
        assert!(body.contains("id=\"valid-244\""));
        assert!(!body.contains("id=\"valid-245\""));
        assert!(body.contains("id=\"test-1\""));
        assert!(body.contains("id=\"test-2\""));
        assert!(body.contains("<span class=\"name\">mathd_245</span>"));
        assert!(body.contains("valid (244)"));
        assert!(body.contains("246 records loaded, 1 lines skipped."));
    }

    #[test]
    fn field_text_is_escaped() {
        let page = RenderedPage::new(&sample(1)).expect("render");
        assert!(
            page.body()
                .contains("<div class=\"text statement\">Show that $0&lt;x_1$ &amp; more</div>")
        );
        assert!(page.body().contains("<b>Proof.</b> Trivial."));
    }

    #[test]
    fn etag_tracks_content() {
        let a = RenderedPage::new(&sample(2)).expect("render");
        let b = RenderedPage::new(&sample(2)).expect("render");
        let c = RenderedPage::new(&sample(3)).expect("render");
        assert_eq!(a.etag(), b.etag());
        assert_ne!(a.etag(), c.etag());
        assert!(a.etag().starts_with('"') && a.etag().ends_with('"'));
    }

    #[test]
    fn empty_secondary_is_noted() {
        let page = RenderedPage::new(&sample(3)).expect("render");
        assert!(page.body().contains("<h2>test</h2>\n<p>No problems.</p>"));
    }
}
