//! The macro-expansion engine.
//!
//! Resolves fixture text in a fixed, auditable order of passes:
//!
//! 1. extract the `DEFAULTS: { ... }` region into a [`ReplacementSet`] and
//!    strip it from the text,
//! 2. layer caller overrides over the defaults,
//! 3. substitute `{name}` placeholders (pass 1),
//! 4. resolve `INCLUDE` directives recursively against the catalog,
//! 5. substitute placeholders again (pass 2) with the same effective set,
//!    so placeholders introduced by an include but owned by the outer
//!    caller still resolve.
//!
//! Any unresolved placeholder or missing include key aborts the expansion;
//! no partial text is ever returned. Error messages carry the surrounding
//! source text so a failing fixture can be located by reading the test log.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{FixturaError, Result};
use crate::library::Catalog;
use crate::replacement::{ReplacementSet, ReplacementValue};

/// One `name: value` pair of the literal-list grammar. A value is an
/// unquoted number (optionally decimal), a quoted string, `true`, `false`
/// or `null`.
const PROPERTY_PATTERN: &str =
    r#"\s*[A-Za-z0-9_]+\s*:\s*(?:'[^']*'|"[^"]*"|true|false|null|\d+\.\d+|\d+)\s*,?\s*"#;

lazy_static! {
    static ref PROPERTY_RE: Regex = Regex::new(
        r#"([A-Za-z0-9_]+)\s*:\s*('[^']*'|"[^"]*"|true|false|null|\d+\.\d+|\d+)"#
    )
    .unwrap();
    static ref DEFAULTS_RE: Regex =
        Regex::new(&format!(r"DEFAULTS\s*:\s*\{{\s*((?:{p})*)\}}", p = PROPERTY_PATTERN)).unwrap();
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{(\w+)\}").unwrap();
    // An include directive and its optional replacement list occupy one line.
    static ref INCLUDE_RE: Regex = Regex::new(&format!(
        r"(?i)INCLUDE[ \t]+([A-Za-z0-9_.]+)[ \t]*(?:,[ \t]*(\[?(?:[ \t]*\{{(?:{p})+\}}[ \t]*,?[ \t]*)+\]?))?",
        p = PROPERTY_PATTERN
    ))
    .unwrap();
    static ref OBJECT_RE: Regex =
        Regex::new(&format!(r"\{{((?:{p})+)\}}", p = PROPERTY_PATTERN)).unwrap();
}

/// Deepest allowed include nesting. Items legitimately nest a handful of
/// levels; anything this deep is a cycle (A includes B includes A).
const MAX_INCLUDE_DEPTH: usize = 32;

/// What a substitution pass does with a placeholder it cannot resolve.
#[derive(Clone, Copy, PartialEq)]
enum Unresolved {
    /// Fail with a syntax error. Used by the outer passes.
    Fail,
    /// Leave the placeholder in place. Used while processing included text,
    /// where the outer caller's overrides may still satisfy it in pass 2.
    Keep,
}

/// Fully resolves `text` against the catalog: defaults, overrides,
/// placeholders and recursive includes. Pure aside from catalog reads.
pub fn expand(text: &str, overrides: &ReplacementSet, catalog: &Catalog) -> Result<String> {
    let (defaults, stripped) = extract_defaults(text);
    let mut effective = defaults;
    effective.merge(overrides);
    let resolved = substitute(&stripped, &effective, Unresolved::Fail)?;
    let resolved = resolve_includes(&resolved, catalog, 0)?;
    substitute(&resolved, &effective, Unresolved::Fail)
}

/// Parses a literal-list body (the inside of `{ ... }`) into a set.
fn parse_literal_list(body: &str) -> ReplacementSet {
    let mut values = ReplacementSet::new();
    for captures in PROPERTY_RE.captures_iter(body) {
        values.set(&captures[1], ReplacementValue::parse(&captures[2]));
    }
    values
}

/// Extracts the `DEFAULTS` region, if present, and strips it from the text.
/// Defaults never appear in resolved output.
fn extract_defaults(text: &str) -> (ReplacementSet, String) {
    match DEFAULTS_RE.captures(text) {
        Some(captures) => {
            let defaults = parse_literal_list(&captures[1]);
            (defaults, DEFAULTS_RE.replace_all(text, "").into_owned())
        }
        None => (ReplacementSet::new(), text.to_owned()),
    }
}

/// Replaces every `{name}` placeholder with the rendered effective value.
fn substitute(text: &str, values: &ReplacementSet, on_missing: Unresolved) -> Result<String> {
    let mut resolved = String::with_capacity(text.len());
    let mut last = 0;
    for captures in PLACEHOLDER_RE.captures_iter(text) {
        let whole = captures.get(0).unwrap();
        let name = &captures[1];
        resolved.push_str(&text[last..whole.start()]);
        last = whole.end();
        let rendered = values.get(name).and_then(ReplacementValue::render);
        match rendered {
            Some(value) => resolved.push_str(&value),
            None if on_missing == Unresolved::Keep => resolved.push_str(whole.as_str()),
            None => {
                let message = match values.get(name) {
                    // The name is known but its value has no textual form.
                    Some(_) => format!(
                        "Replacement value \"{name}\" could not be converted into a string.\n\n{text}"
                    ),
                    None => format!("A replacement value was not specified for {name}.\n\n{text}"),
                };
                return Err(FixturaError::Syntax { message });
            }
        }
    }
    resolved.push_str(&text[last..]);
    Ok(resolved)
}

/// Runs the defaults/override/substitution passes on included text. The
/// include's own defaults apply, the supplied object overrides them, and
/// anything still unresolved is kept for the outer caller's second pass.
fn apply_values(text: &str, overrides: &ReplacementSet) -> Result<String> {
    let (defaults, stripped) = extract_defaults(text);
    let mut effective = defaults;
    effective.merge(overrides);
    substitute(&stripped, &effective, Unresolved::Keep)
}

/// Replaces every `INCLUDE` directive with the resolved text of the included
/// item, fanning out once per override object when a list was supplied.
/// Recurses into the substituted text, so includes may nest; recursion ends
/// when no `INCLUDE` token remains or the depth cap is hit.
fn resolve_includes(text: &str, catalog: &Catalog, depth: usize) -> Result<String> {
    let mut resolved = String::with_capacity(text.len());
    let mut last = 0;
    for captures in INCLUDE_RE.captures_iter(text) {
        let whole = captures.get(0).unwrap();
        let key = &captures[1];
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(FixturaError::Syntax {
                message: format!(
                    "Include nesting exceeded {MAX_INCLUDE_DEPTH} levels at \"{key}\"; \
                     includes may not form a cycle.\n\n{text}"
                ),
            });
        }
        // The include grammar stopped short, yet the same line goes on as if
        // a replacement list follows (or continues). That list is malformed.
        let remainder = text[whole.end()..].trim_start_matches([' ', '\t']);
        let malformed_list = remainder.starts_with(['{', '['])
            || (captures.get(2).is_none() && remainder.starts_with(','));
        if malformed_list {
            return Err(FixturaError::Syntax {
                message: format!(
                    "The include of \"{key}\" is followed by a malformed replacement list.\n\n{text}"
                ),
            });
        }
        resolved.push_str(&text[last..whole.start()]);
        last = whole.end();
        let included = match catalog.get(key) {
            Ok(included) => included,
            Err(FixturaError::ItemNotFound { .. }) => {
                return Err(FixturaError::IncludeNotFound {
                    key: key.to_owned(),
                    context: text.to_owned(),
                });
            }
            Err(other) => return Err(other),
        };
        let substituted = match captures.get(2) {
            Some(objects) => {
                // One fan-out per override object, in the order they appear.
                let mut pieces = Vec::new();
                for object in OBJECT_RE.captures_iter(objects.as_str()) {
                    pieces.push(apply_values(included, &parse_literal_list(&object[1]))?);
                }
                pieces.join("\n")
            }
            None => apply_values(included, &ReplacementSet::new())?,
        };
        resolved.push_str(&resolve_includes(&substituted, catalog, depth + 1)?);
    }
    resolved.push_str(&text[last..]);
    Ok(resolved)
}
