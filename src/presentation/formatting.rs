use std::sync::LazyLock;

use html2text::from_read;
use regex::Regex;

pub const NO_MISSING_SKILLS: &str = "None! All skills seem to match.";
pub const NO_DESCRIPTION: &str = "No description available.";

const SECTION_KEYWORDS: &[&str] = &[
    "job description",
    "key responsibilities",
    "qualifications and skills",
    "education",
    "industry type",
    "department",
    "employment type",
    "role category",
];

// Wide enough that html2text never re-wraps a paragraph.
const TEXT_WIDTH: usize = 10_000;

static SECTION_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!("(?i)({})", SECTION_KEYWORDS.join("|"))).ok()
});

// html2text renders <b> as `**`, which can leave emphasis markers hugging a header.
static LEADING_COLONS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[:\s*]+").ok());

/// Strips markup from a stored description and lays it out as
/// `**Header:**` blocks, with any text before the first header as the overview.
pub fn format_job_description(raw: &str) -> String {
    let text = strip_html(raw);
    if text.trim().is_empty() {
        return NO_DESCRIPTION.to_string();
    }
    let Some(sections) = SECTION_PATTERN.as_ref() else {
        return text;
    };

    let mut formatted = String::new();
    let mut cursor = 0;
    let mut header: Option<&str> = None;
    for found in sections.find_iter(&text) {
        push_section(&mut formatted, header, &text[cursor..found.start()]);
        header = Some(found.as_str());
        cursor = found.end();
    }
    push_section(&mut formatted, header, &text[cursor..]);

    let formatted = formatted.trim();
    if formatted.is_empty() {
        text
    } else {
        formatted.to_string()
    }
}

fn push_section(out: &mut String, header: Option<&str>, body: &str) {
    match header {
        None => {
            let body = trim_body(body);
            if !body.is_empty() {
                out.push_str("**Overview:**\n");
                out.push_str(body);
                out.push_str("\n\n");
            }
        }
        Some(header) => {
            let body = match LEADING_COLONS.as_ref() {
                Some(colons) => colons.replace(body, ""),
                None => body.into(),
            };
            out.push_str(&format!(
                "**{}:**\n{}\n\n",
                title_case(header.trim()),
                trim_body(&body)
            ));
        }
    }
}

fn trim_body(body: &str) -> &str {
    body.trim_end_matches(|c: char| c.is_whitespace() || c == '*')
        .trim_start()
}

fn strip_html(raw: &str) -> String {
    if !(raw.contains('<') && raw.contains('>')) {
        return raw.to_string();
    }
    from_read(raw.as_bytes(), TEXT_WIDTH).unwrap_or_else(|_| raw.to_string())
}

/// Upper-cases the first letter of each word and lower-cases the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = c != '\'';
        }
    }
    out
}

pub fn missing_skills_line<'a>(missing: impl IntoIterator<Item = &'a str>) -> String {
    let line = missing.into_iter().collect::<Vec<_>>().join(", ");
    if line.is_empty() {
        NO_MISSING_SKILLS.to_string()
    } else {
        line
    }
}
