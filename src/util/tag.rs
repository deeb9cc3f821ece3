//! Scannable resource tag encoding.
//!
//! Resources are identified in the physical world by a printed code whose
//! text payload is `GYMQ:<resource-id>`. Rendering the code is out of scope;
//! this module only converts between the tag text and the resource id.

/// Text prefix for resource tags.
pub const TAG_PREFIX: &str = "GYMQ:";

/// Encode a resource id into its tag text form.
pub fn encode_tag(resource_id: &str) -> String {
    format!("{TAG_PREFIX}{resource_id}")
}

/// Decode tag text back into a resource id.
///
/// Returns `None` if the prefix is missing or the id part is empty.
/// Surrounding whitespace (common in hand-pasted scan input) is ignored.
pub fn decode_tag(text: &str) -> Option<&str> {
    let id = text.trim().strip_prefix(TAG_PREFIX)?;
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
