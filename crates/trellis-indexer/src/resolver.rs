//! Reference cleanup and resolution
//!
//! Frontmatter references arrive in whatever shape the author typed:
//! `Note`, `[[Note]]`, `"[[Note|display name]]"`, `Folder/Note.md`. This
//! module reduces them to candidate strings and asks the host to resolve
//! those to a document.

use trellis_core::DocId;

/// Host-side resolution the index depends on. The vault supplies both
/// strategies; tests use trivial fakes. Matching policy (case handling,
/// relative-vs-absolute precedence) belongs to the implementor.
pub trait ResolverBackend {
    /// First match by name, preferring candidates near `from`.
    fn resolve_name(&self, name: &str, from: &DocId) -> Option<DocId>;

    /// Direct vault-relative path lookup.
    fn resolve_path(&self, path: &str) -> Option<DocId>;
}

/// Strip the decoration a reference may carry: surrounding whitespace and
/// quotes, `[[ ]]` brackets, a `|alias` suffix, then quotes nested inside
/// the brackets. Returns the trimmed candidate plus the pre-trim variant
/// when the two differ, or `None` when nothing usable remains.
pub fn clean_reference(raw: &str) -> Option<(String, Option<String>)> {
    let mut cleaned = strip_quotes(raw.trim()).trim();
    if let Some(inner) = cleaned
        .strip_prefix("[[")
        .and_then(|rest| rest.strip_suffix("]]"))
    {
        cleaned = inner;
    }
    let cleaned = match cleaned.split_once('|') {
        Some((target, _alias)) => target,
        None => cleaned,
    };
    let unquoted: String = cleaned
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect();
    let trimmed = unquoted.trim();
    if trimmed.is_empty() {
        return None;
    }
    let untrimmed = (trimmed != unquoted).then(|| unquoted.clone());
    Some((trimmed.to_string(), untrimmed))
}

/// Resolve one raw reference declared by `declaring`. Name resolution is
/// tried before path resolution; both are retried with the pre-trim variant
/// before giving up. Self-reference rejection is the caller's job.
pub fn resolve_reference(
    backend: &dyn ResolverBackend,
    raw: &str,
    declaring: &DocId,
) -> Option<DocId> {
    let (trimmed, untrimmed) = clean_reference(raw)?;
    if let Some(id) = resolve_once(backend, &trimmed, declaring) {
        return Some(id);
    }
    untrimmed.and_then(|variant| resolve_once(backend, &variant, declaring))
}

fn resolve_once(backend: &dyn ResolverBackend, candidate: &str, declaring: &DocId) -> Option<DocId> {
    backend
        .resolve_name(candidate, declaring)
        .or_else(|| backend.resolve_path(candidate))
}

fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    s
}
