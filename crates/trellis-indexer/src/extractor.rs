//! Frontmatter → relationship declaration

use tracing::{debug, warn};

use trellis_core::{Declaration, DocId};

use crate::config::IndexConfig;
use crate::metadata::MetadataSnapshot;
use crate::resolver::{self, ResolverBackend};

/// Parent-property token that opts a document out of normal visibility.
/// Matched on the raw property value, trimmed and case-insensitive; a
/// `[[hidden]]` link is a reference to a document called "hidden", not
/// this token.
pub const HIDDEN_TOKEN: &str = "hidden";

/// Produce the declaration a document's metadata currently makes.
///
/// Unresolvable references and self-references are dropped here, never
/// propagated: authoring is ongoing and imperfect, and a half-written link
/// must not poison the rest of the document's declarations.
pub fn extract(
    doc: &DocId,
    metadata: &MetadataSnapshot,
    config: &IndexConfig,
    backend: &dyn ResolverBackend,
) -> Declaration {
    let mut declaration = Declaration::default();

    let parent_values = metadata.strings(&config.parent_property);
    if parent_values.iter().any(|raw| is_hidden_token(raw)) {
        // The hidden token wins over every other parent value.
        declaration.parents.insert(DocId::hidden_root());
    } else {
        for raw in &parent_values {
            match resolver::resolve_reference(backend, raw, doc) {
                Some(parent) if parent == *doc => {
                    warn!("{} declares itself as its own parent; entry dropped", doc);
                }
                Some(parent) => {
                    declaration.parents.insert(parent);
                }
                None => debug!("unresolvable parent reference {:?} in {}", raw, doc),
            }
        }
    }

    for raw in metadata.strings(&config.children_property) {
        if is_hidden_token(&raw) {
            debug!("{} lists the hidden token as a child; entry dropped", doc);
            continue;
        }
        match resolver::resolve_reference(backend, &raw, doc) {
            Some(child) if child == *doc => {
                warn!("{} declares itself as its own child; entry dropped", doc);
            }
            Some(child) => {
                declaration.children.insert(child);
            }
            None => debug!("unresolvable child reference {:?} in {}", raw, doc),
        }
    }

    declaration
}

fn is_hidden_token(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case(HIDDEN_TOKEN)
}
