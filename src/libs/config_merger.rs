// This module merges a single `key = "value"` pair into a project's
// `.cargo/config.toml` without disturbing anything else in it.
//
// The document is never re-serialized. It is treated as a sequence of lines
// with section headers recognized, so comments, ordering, spacing and line
// endings of every unrelated line survive byte for byte. The TOML parser is
// only used as a gate: the file must parse before it is touched and the merged
// text must parse before it is written.

// Creates `.cargo/` when the project does not have one yet.
use crate::libs::directory::ensure_dir;
// Writes go to a sibling temp file first so a failure never leaves half a file behind.
use crate::libs::utilities::file_operations::write_atomically;
// `ConfigError` is what this stage reports to the pipeline.
use crate::schemas::errors::ConfigError;
// Our custom logging macros for colored, level-tagged output.
use crate::{log_debug, log_info};
// For coloring paths in log messages.
use colored::Colorize;
// `fmt` for the human readable `MergeOutcome`.
use std::fmt;
// For reading the existing configuration file.
use std::fs;
// `io::ErrorKind::NotFound` tells "no file yet" apart from real read failures.
use std::io;
// For the configuration file location.
use std::path::Path;

// Byte order mark some Windows editors put at the start of a file. It is not
// part of the TOML text and is carried over untouched.
const BOM: char = '\u{feff}';

/// One `key = "value"` pair inside a `[section]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFragment {
    pub section: String,
    pub key: String,
    pub value: String,
}

impl ConfigFragment {
    pub fn new(
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            section: section.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// `[build] rustc-wrapper = "sccache"`, which routes every rustc invocation
    /// of the project through the cache.
    pub fn rustc_wrapper(wrapper: impl Into<String>) -> Self {
        Self::new("build", "rustc-wrapper", wrapper)
    }
}

impl Default for ConfigFragment {
    fn default() -> Self {
        Self::rustc_wrapper("sccache")
    }
}

/// What [`merge_fragment`] did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The file did not exist and was created with just the fragment.
    Created,
    /// The key existed in the section and its value was replaced in place.
    Replaced,
    /// The section was missing and was appended at the end.
    AppendedSection,
    /// The section existed without the key; the key was inserted after the header.
    InsertedKey,
    /// The file already contained the fragment. Nothing was written.
    Unchanged,
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MergeOutcome::Created => "created",
            MergeOutcome::Replaced => "value replaced",
            MergeOutcome::AppendedSection => "section appended",
            MergeOutcome::InsertedKey => "key inserted",
            MergeOutcome::Unchanged => "already up to date",
        };
        f.write_str(s)
    }
}

/// Merges `key = "value"` into `[section]` of the TOML file at `path`.
///
/// # Arguments
/// * `path` - The configuration file. It and its parent directory may be absent.
/// * `section` - Table name, dotted names allowed (`target.x86_64-unknown-linux-gnu`).
/// * `key` - Bare key to set.
/// * `value` - Written as a TOML basic string.
///
/// # Returns
/// * `Ok(MergeOutcome)` describing the edit.
/// * `Err(ConfigError::MalformedExistingDocument)` if the file does not parse,
///   declares `[section]` more than once, or the merge would not parse.
///   The file is left untouched.
/// * `Err(ConfigError::IoFailure)` if reading or writing fails. The original
///   file is left untouched.
pub fn merge_fragment(
    path: &Path,
    section: &str,
    key: &str,
    value: &str,
) -> Result<MergeOutcome, ConfigError> {
    let io_failure = |source: io::Error| ConfigError::IoFailure {
        path: path.to_path_buf(),
        source,
    };

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent).map_err(io_failure)?;
            }
            let fresh = format!("[{section}]\n{}\n", render_key_line(key, value));
            write_atomically(path, &fresh).map_err(io_failure)?;
            log_info!(
                "[Config] Created {} with [{}] {}",
                path.display().to_string().green(),
                section,
                key
            );
            return Ok(MergeOutcome::Created);
        }
        Err(e) => return Err(io_failure(e)),
    };

    let malformed = |reason: String| ConfigError::MalformedExistingDocument {
        path: path.to_path_buf(),
        reason,
    };

    // All checks run on the text after a leading byte order mark.
    let text = strip_bom(&contents);

    // Two `[build]` tables would make "the" section ambiguous; refuse to guess.
    let header_count = count_headers(text, section);
    if header_count > 1 {
        return Err(malformed(format!(
            "section [{section}] is declared {header_count} times"
        )));
    }
    // Never edit a file Cargo itself would refuse to read.
    toml::from_str::<toml::Table>(text)
        .map_err(|e| malformed(format!("not valid TOML: {}", e.message())))?;

    let (merged, outcome) = merge_text(&contents, section, key, value);
    if merged == contents {
        log_info!(
            "[Config] {} already sets [{}] {}",
            path.display().to_string().cyan(),
            section,
            key
        );
        return Ok(MergeOutcome::Unchanged);
    }

    // A dotted key or inline table elsewhere in the file can already define the
    // key; adding a line would then duplicate it.
    toml::from_str::<toml::Table>(strip_bom(&merged)).map_err(|e| {
        malformed(format!(
            "[{section}] {key} is defined in a form that cannot be edited line by line ({})",
            e.message()
        ))
    })?;

    write_atomically(path, &merged).map_err(io_failure)?;
    log_info!(
        "[Config] Updated {}: {}",
        path.display().to_string().green(),
        outcome
    );
    Ok(outcome)
}

/// Pure text half of [`merge_fragment`]. Assumes `[section]` appears at most once.
///
/// A leading byte order mark is kept in front of the merged text.
pub fn merge_text(contents: &str, section: &str, key: &str, value: &str) -> (String, MergeOutcome) {
    let body = strip_bom(contents);
    let bom = &contents[..contents.len() - body.len()];
    let (merged, outcome) = merge_body(body, section, key, value);
    (format!("{bom}{merged}"), outcome)
}

fn strip_bom(contents: &str) -> &str {
    contents.strip_prefix(BOM).unwrap_or(contents)
}

fn merge_body(contents: &str, section: &str, key: &str, value: &str) -> (String, MergeOutcome) {
    // Keep whatever line ending style the file already uses.
    let eol = if contents.contains("\r\n") { "\r\n" } else { "\n" };
    let lines: Vec<&str> = contents.split_inclusive('\n').collect();
    let layout = scan(&lines, section, key);

    match (layout.header, layout.key) {
        // The key is already there: swap its value and nothing else.
        (_, Some(idx)) => {
            let (body, ending) = split_line_ending(lines[idx]);
            let replaced = replace_value(body, value);
            if replaced == body {
                return (contents.to_string(), MergeOutcome::Unchanged);
            }
            let mut out = String::with_capacity(contents.len() + value.len());
            for (i, line) in lines.iter().enumerate() {
                if i == idx {
                    out.push_str(&replaced);
                    out.push_str(ending);
                } else {
                    out.push_str(line);
                }
            }
            (out, MergeOutcome::Replaced)
        }
        // No such table: add it at the end, after one blank separator line.
        (None, None) => {
            let mut out = contents.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push_str(eol);
            }
            if !out.trim().is_empty() && !ends_with_blank_line(&out) {
                out.push_str(eol);
            }
            out.push('[');
            out.push_str(section);
            out.push(']');
            out.push_str(eol);
            out.push_str(&render_key_line(key, value));
            out.push_str(eol);
            (out, MergeOutcome::AppendedSection)
        }
        // The table exists without the key: put it right under the header.
        (Some(idx), None) => {
            let mut out = String::with_capacity(contents.len() + key.len() + value.len() + 8);
            for (i, line) in lines.iter().enumerate() {
                out.push_str(line);
                if i == idx {
                    if !line.ends_with('\n') {
                        out.push_str(eol);
                    }
                    out.push_str(&render_key_line(key, value));
                    out.push_str(eol);
                }
            }
            (out, MergeOutcome::InsertedKey)
        }
    }
}

/// Where the target header and key line sit, as line indices.
#[derive(Debug, Default)]
struct Layout {
    header: Option<usize>,
    key: Option<usize>,
}

fn scan(lines: &[&str], section: &str, key: &str) -> Layout {
    let wanted = normalize_table_name(section);
    let mut layout = Layout::default();
    let mut scanner = LineScanner::default();
    let mut in_target = false;

    for (i, line) in lines.iter().enumerate() {
        let (body, _) = split_line_ending(line);
        match scanner.classify(body) {
            LineKind::Header(header) => {
                // Any header ends the previous table, whatever its name.
                in_target = !header.array && header.name == wanted;
                if in_target && layout.header.is_none() {
                    layout.header = Some(i);
                }
            }
            LineKind::Entry => {
                if in_target && layout.key.is_none() && is_key_line(body, key) {
                    layout.key = Some(i);
                }
            }
            LineKind::Continuation => {}
        }
    }
    layout
}

fn count_headers(contents: &str, section: &str) -> usize {
    let wanted = normalize_table_name(section);
    let mut scanner = LineScanner::default();
    contents
        .split_inclusive('\n')
        .filter(|line| {
            let (body, _) = split_line_ending(line);
            matches!(
                scanner.classify(body),
                LineKind::Header(header) if !header.array && header.name == wanted
            )
        })
        .count()
}

/// How a line relates to the table structure of the document.
#[derive(Debug, PartialEq, Eq)]
enum LineKind {
    /// A `[table]` or `[[array-of-tables]]` header.
    Header(Header),
    /// A key/value pair, comment or blank line directly inside a table.
    Entry,
    /// The inside of a value started on an earlier line: a multi-line string
    /// or an array spread over several lines.
    Continuation,
}

/// Follows values that span several lines so their contents are never
/// mistaken for headers or keys.
#[derive(Debug, Default)]
struct LineScanner {
    open_multiline: Option<&'static str>,
    open_brackets: usize,
}

impl LineScanner {
    fn classify(&mut self, body: &str) -> LineKind {
        // Inside a multi-line string only its closing delimiter matters.
        if let Some(delim) = self.open_multiline {
            if body.matches(delim).count() % 2 == 1 {
                self.open_multiline = None;
            }
            return LineKind::Continuation;
        }

        // Outside any value, a line opening with `[` can only be a header.
        let continuation = self.open_brackets > 0;
        if !continuation {
            if let Some(header) = parse_header(body) {
                return LineKind::Header(header);
            }
        }

        self.open_multiline = opens_multiline_string(body);
        self.open_brackets = self
            .open_brackets
            .saturating_add_signed(bracket_balance(body));
        if continuation {
            LineKind::Continuation
        } else {
            LineKind::Entry
        }
    }
}

/// A recognized `[name]` or `[[name]]` line.
#[derive(Debug, PartialEq, Eq)]
struct Header {
    name: String,
    array: bool,
}

/// Parses a header line. The name ends at the first `]` outside a quoted key,
/// so `[target.'cfg(unix)']` is one header; only whitespace or a comment may
/// follow it.
fn parse_header(body: &str) -> Option<Header> {
    let trimmed = body.trim();
    let (array, after) = match trimmed.strip_prefix("[[") {
        Some(after) => (true, after),
        None => (false, trimmed.strip_prefix('[')?),
    };

    let (end, _) = unquoted_chars(after).find(|&(_, c)| c == ']')?;
    let inner = &after[..end];
    let mut rest = &after[end + 1..];
    if array {
        rest = rest.strip_prefix(']')?;
    }

    let rest = rest.trim_start();
    if inner.trim().is_empty() || !(rest.is_empty() || rest.starts_with('#')) {
        return None;
    }
    Some(Header {
        name: normalize_table_name(inner),
        array,
    })
}

/// `[ target . "x" ]` and `[target.x]` name the same table. Dots inside quoted
/// keys do not split the name.
fn normalize_table_name(name: &str) -> String {
    let mut parts = Vec::new();
    let mut start = 0;
    for (dot, _) in unquoted_chars(name).filter(|&(_, c)| c == '.') {
        parts.push(&name[start..dot]);
        start = dot + 1;
    }
    parts.push(&name[start..]);
    parts
        .into_iter()
        .map(|part| part.trim().trim_matches('"').trim_matches('\''))
        .collect::<Vec<_>>()
        .join(".")
}

/// Characters of `s` that sit outside basic (`"..."`) and literal (`'...'`)
/// strings, with their byte offsets. The quotes themselves are skipped.
fn unquoted_chars(s: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    s.char_indices().filter(move |&(_, c)| match quote {
        Some('"') if escaped => {
            escaped = false;
            false
        }
        Some('"') if c == '\\' => {
            escaped = true;
            false
        }
        Some(q) => {
            if c == q {
                quote = None;
            }
            false
        }
        None if c == '"' || c == '\'' => {
            quote = Some(c);
            false
        }
        None => true,
    })
}

/// Brackets opened minus brackets closed on `body`, ignoring strings and the
/// trailing comment.
fn bracket_balance(body: &str) -> isize {
    let mut balance = 0;
    for (_, c) in unquoted_chars(body) {
        match c {
            '#' => break,
            '[' => balance += 1,
            ']' => balance -= 1,
            _ => {}
        }
    }
    balance
}

fn is_key_line(body: &str, key: &str) -> bool {
    let trimmed = body.trim_start();
    let rest = trimmed
        .strip_prefix(key)
        .or_else(|| {
            trimmed
                .strip_prefix('"')
                .and_then(|t| t.strip_prefix(key))
                .and_then(|t| t.strip_prefix('"'))
        })
        .or_else(|| {
            trimmed
                .strip_prefix('\'')
                .and_then(|t| t.strip_prefix(key))
                .and_then(|t| t.strip_prefix('\''))
        });
    matches!(rest, Some(rest) if rest.trim_start().starts_with('='))
}

/// The delimiter of a multi-line string left open at the end of `body`, if any.
fn opens_multiline_string(body: &str) -> Option<&'static str> {
    ["\"\"\"", "'''"]
        .into_iter()
        .find(|delim| body.matches(delim).count() % 2 == 1)
}

/// Rewrites the value after `=`, keeping the key, the spacing around `=` and any
/// trailing comment.
fn replace_value(body: &str, value: &str) -> String {
    let Some(eq) = body.find('=') else {
        return body.to_string();
    };
    let (prefix, rest) = body.split_at(eq + 1);
    let after = rest.trim_start();
    let spacing = &rest[..rest.len() - after.len()];
    let value_end = value_extent(after);
    let suffix = &after[value_end..];
    format!("{prefix}{spacing}{}{suffix}", quote(value))
}

/// Length of the value token at the start of `s`.
fn value_extent(s: &str) -> usize {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(b'"') => {
            let mut i = 1;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' => i += 2,
                    b'"' => return i + 1,
                    _ => i += 1,
                }
            }
            s.len()
        }
        Some(b'\'') => s[1..].find('\'').map(|i| i + 2).unwrap_or(s.len()),
        _ => {
            let end = s.find('#').unwrap_or(s.len());
            s[..end].trim_end().len()
        }
    }
}

fn render_key_line(key: &str, value: &str) -> String {
    format!("{key} = {}", quote(value))
}

/// TOML basic string literal for `value`.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

fn ends_with_blank_line(text: &str) -> bool {
    text.lines().last().is_some_and(|l| l.trim().is_empty())
}

/// Logs the fragment that would be merged without touching the file.
pub fn describe(path: &Path, fragment: &ConfigFragment) {
    log_debug!(
        "[Config] Target {}: [{}] {} = {}",
        path.display(),
        fragment.section,
        fragment.key,
        quote(&fragment.value)
    );
}
