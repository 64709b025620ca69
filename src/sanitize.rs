//! `<sup>`/`<sub>` handling for unit labels.
//!
//! The source writes units like `мг/м<sup>3</sup>`. `strip_markup` removes
//! the tags and keeps their content; `segments` splits a label into runs the
//! report writer can render as superscript or subscript rich text.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(su[pb])>(.*?)</su[pb]>").expect("script tag pattern is valid")
});

/// Vertical placement of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Normal,
    Superscript,
    Subscript,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub script: Script,
}

/// Removes every `<sup>…</sup>` and `<sub>…</sub>` pair, keeping the inner
/// text and everything around it exactly.
///
/// Applied until nothing changes, so the result never contains a tag pair
/// and `strip_markup(strip_markup(x)) == strip_markup(x)`.
pub fn strip_markup(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = SCRIPT_TAG.replace_all(&current, "$2").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Splits a label into normal, superscript and subscript runs.
/// Empty runs are omitted. Inner text is itself stripped of markup.
pub fn segments(text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut last = 0;

    for caps in SCRIPT_TAG.captures_iter(text) {
        let (Some(whole), Some(tag), Some(inner)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        push_segment(&mut out, &text[last..whole.start()], Script::Normal);
        let script = if tag.as_str() == "sup" {
            Script::Superscript
        } else {
            Script::Subscript
        };
        push_segment(&mut out, &strip_markup(inner.as_str()), script);
        last = whole.end();
    }
    push_segment(&mut out, &text[last..], Script::Normal);

    out
}

/// True if the label has at least one tag pair.
pub fn has_markup(text: &str) -> bool {
    SCRIPT_TAG.is_match(text)
}

fn push_segment(out: &mut Vec<Segment>, text: &str, script: Script) {
    if !text.is_empty() {
        out.push(Segment {
            text: text.to_string(),
            script,
        });
    }
}
