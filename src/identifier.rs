//! Identifier quoting and normalization helpers.

use std::collections::BTreeSet;

use crate::error::{ShareError, ShareResult};

/// Separator the warehouse uses between grantees in the `to` column.
pub const GRANTEE_SEPARATOR: &str = ", ";

/// Quote an identifier with double quotes, doubling any embedded quote.
pub fn quote_identifier(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Whether a segment can appear in a statement without quoting.
fn is_plain_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Render one account identifier for an `ACCOUNTS=` list.
///
/// Accounts may be organization-qualified (`org.account`). Each segment is
/// emitted as-is when it is a plain identifier and quoted otherwise, so no
/// account can inject a delimiter or terminate the statement.
pub fn render_account(account: &str) -> ShareResult<String> {
    if account.is_empty() {
        return Err(ShareError::invalid_identifier(
            account,
            "account identifier is empty",
        ));
    }

    let mut rendered = Vec::new();
    for segment in account.split('.') {
        if segment.is_empty() {
            return Err(ShareError::invalid_identifier(
                account,
                "account identifier has an empty segment",
            ));
        }
        if is_plain_segment(segment) {
            rendered.push(segment.to_string());
        } else {
            rendered.push(quote_identifier(segment));
        }
    }
    Ok(rendered.join("."))
}

/// Render a set of accounts as the comma-joined list used by `SET ACCOUNTS=`.
pub fn render_account_list(accounts: &BTreeSet<String>) -> ShareResult<String> {
    let rendered = accounts
        .iter()
        .map(|a| render_account(a))
        .collect::<ShareResult<Vec<_>>>()?;
    Ok(rendered.join(","))
}

/// Remove the account prefix the warehouse puts in front of share names.
///
/// `yt12345.my_share` becomes `my_share`. Only the first `.` is consumed, and
/// a name without any `.` is returned unchanged.
pub fn strip_account_from_name(s: &str) -> &str {
    match s.find('.') {
        Some(idx) => &s[idx + 1..],
        None => s,
    }
}

/// Escape character for `LIKE` patterns built from literal names.
pub const LIKE_ESCAPE: char = '\\';

/// Escape `LIKE` wildcards so the pattern only matches `s` itself.
pub fn escape_like_pattern(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if c == LIKE_ESCAPE || c == '_' || c == '%' {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Split the warehouse grantee list into a set of accounts.
///
/// An empty list yields an empty set rather than a set holding `""`.
pub fn split_grantee_list(s: &str) -> BTreeSet<String> {
    s.split(GRANTEE_SEPARATOR)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
