//! Turns raw backend results into item pages.

use serde_json::Value;
use tracing::warn;

use crate::types::{BackendPageResult, RawHit};
use item_search_shared::{ItemDocument, Page, PageRequest};

/// Present a raw backend result as a page of items.
///
/// Highlighted fragments replace the value of the field they were produced
/// for, and `show_time` is filled in. Hits whose source cannot be read as an
/// item are skipped.
pub fn paginate(raw: BackendPageResult, request: PageRequest) -> Page<ItemDocument> {
    let content = raw.hits.into_iter().filter_map(parse_hit).collect();

    Page::new(content, request, raw.total_elements)
}

/// Parse a single hit into an item.
pub(crate) fn parse_hit(hit: RawHit) -> Option<ItemDocument> {
    let RawHit {
        id,
        source,
        highlight,
        ..
    } = hit;

    let mut source = source;
    if let Value::Object(map) = &mut source {
        for (field, fragments) in highlight {
            if fragments.is_empty() {
                continue;
            }
            match map.get_mut(&field) {
                Some(value) if value.is_string() => *value = Value::String(fragments.concat()),
                _ => {}
            }
        }
    }

    match serde_json::from_value::<ItemDocument>(source) {
        Ok(document) => Some(document.with_show_time()),
        Err(e) => {
            warn!(id = %id, error = %e, "Skipping hit that is not an item");
            None
        }
    }
}
