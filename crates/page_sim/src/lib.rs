//! Stand-in for the page realm, for tests and the demo binary.
//!
//! The real receiving side lives in the page's own script context. This
//! crate plays it against a [`html::LiveDom`]: it decodes boundary JSON,
//! walks matcher chains and inserts placeholders.

mod fixture;
mod realm;

pub use fixture::{PageFixture, fixtures_dir, load_fixture};
pub use realm::{PageRealm, RealmError, find_anchor, matcher_matches};

/// Readable report of the first difference between two outlines.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let missing = "<missing>";
    let len = expected.len().max(actual.len());
    let first = (0..len).find(|&i| expected.get(i) != actual.get(i));
    if let Some(i) = first {
        let _ = writeln!(out, "first mismatch at line {}:", i + 1);
        for line in i.saturating_sub(2)..(i + 3).min(len) {
            let marker = if line == i { ">" } else { " " };
            let left = expected.get(line).map_or(missing, String::as_str);
            let right = actual.get(line).map_or(missing, String::as_str);
            let _ = writeln!(out, "{marker} {:>4}  expected: {left}", line + 1);
            let _ = writeln!(out, "{marker} {:>4}    actual: {right}", line + 1);
        }
    }
    let _ = writeln!(
        out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}
