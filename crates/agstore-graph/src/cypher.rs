//! Cypher text helpers
//!
//! AGE takes the Cypher statement as a string constant, so values end up
//! embedded in the statement text. Everything that is spliced in goes
//! through one of the quoting helpers here.

use agstore_core::{GraphError, Result};

/// Quote a value as a single-quoted Cypher string literal
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Quote a label or relation type as a backtick-delimited identifier
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Render a list literal, e.g. `['a', 'b']`
pub fn literal_list<S: AsRef<str>>(values: &[S]) -> String {
    let items: Vec<String> = values.iter().map(|v| quote_literal(v.as_ref())).collect();
    format!("[{}]", items.join(", "))
}

/// Escape `%` in text spliced into a template before [`render`] runs,
/// so data never reads as a placeholder
pub fn escape_placeholders(text: &str) -> String {
    text.replace('%', "%%")
}

/// Substitute `%s` placeholders, in order, with quoted literals.
///
/// `%%` emits a single `%`; any other `%` is left alone.
pub fn render(query: &str, params: &[&str]) -> Result<String> {
    let mut out = String::with_capacity(query.len());
    let mut params_iter = params.iter();
    let mut used = 0usize;
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                let value = params_iter.next().ok_or_else(|| {
                    GraphError::InvalidQuery(format!(
                        "query has more placeholders than the {} parameters given",
                        params.len()
                    ))
                })?;
                out.push_str(&quote_literal(value));
                used += 1;
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }

    if used != params.len() {
        return Err(GraphError::InvalidQuery(format!(
            "{} parameters given for {} placeholders",
            params.len(),
            used
        )));
    }

    Ok(out)
}

/// Quote a value as a SQL string literal
pub(crate) fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote a SQL identifier
pub(crate) fn sql_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Pick a dollar-quote tag that does not occur in `body`
pub(crate) fn dollar_tag(body: &str) -> String {
    let mut tag = "$cypher$".to_string();
    let mut n = 0u32;
    while body.contains(&tag) {
        n += 1;
        tag = format!("$cypher{n}$");
    }
    tag
}
