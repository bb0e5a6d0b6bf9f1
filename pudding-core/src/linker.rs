//! Library placeholder resolution for bytecode templates.
//!
//! Compilers leave a 40 character field wherever a contract calls into an
//! external library: two underscores, the library name (truncated to 36
//! characters), then underscores up to the field width. Linking replaces the
//! whole field with the library's address in hex.

use std::collections::BTreeSet;

use crate::utils::{address_to_hex, strip_0x_prefix};
use crate::{Address, BindingResult, Bytes, LinkTable};

/// Marker every placeholder starts with.
pub const PLACEHOLDER_PREFIX: &str = "__";

/// Width of a placeholder field: a 20-byte address in hex.
pub const PLACEHOLDER_WIDTH: usize = 40;

/// Longest library name that fits a placeholder with its padding.
pub const MAX_LIBRARY_NAME_LEN: usize = PLACEHOLDER_WIDTH - 2 * PLACEHOLDER_PREFIX.len();

/// A placeholder field located in a bytecode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Byte offset of the leading marker
    pub start: usize,
    /// Byte offset one past the field
    pub end: usize,
    /// Library name with the padding removed
    pub name: &'a str,
}

impl Placeholder<'_> {
    /// Width of the field in the bytecode.
    pub fn width(&self) -> usize {
        self.end - self.start
    }

    /// Whether this field stands for `library`. Names longer than the field
    /// allows were truncated by the compiler, so only their prefix is there.
    pub fn refers_to(&self, library: &str) -> bool {
        self.name == library
            || (self.name.len() == MAX_LIBRARY_NAME_LEN && library.starts_with(self.name))
    }
}

/// Every placeholder field in `bytecode`, in order of appearance.
pub fn placeholders(bytecode: &str) -> Vec<Placeholder<'_>> {
    let mut found = vec![];
    let mut offset = 0;
    while let Some(pos) = bytecode[offset..].find(PLACEHOLDER_PREFIX) {
        let start = offset + pos;
        let mut end = (start + PLACEHOLDER_WIDTH).min(bytecode.len());
        while !bytecode.is_char_boundary(end) {
            end -= 1;
        }
        let name = bytecode[start + PLACEHOLDER_PREFIX.len()..end].trim_end_matches('_');
        if name.is_empty() {
            // a run of padding, not a field start
            offset = start + 1;
            continue;
        }
        found.push(Placeholder { start, end, name });
        offset = end;
    }
    found
}

/// Address hex fitted to a field: left padded with zeros, or keeping the
/// rightmost characters when the field is narrower.
fn fit_address(address: &Address, width: usize) -> String {
    let hex = address_to_hex(address);
    if hex.len() >= width {
        hex[hex.len() - width..].to_owned()
    } else {
        format!("{}{hex}", "0".repeat(width - hex.len()))
    }
}

fn lookup<'t>(links: &'t LinkTable, placeholder: &Placeholder<'_>) -> Option<&'t Address> {
    links.get(placeholder.name).or_else(|| {
        links
            .iter()
            .find(|(name, _)| placeholder.refers_to(name))
            .map(|(_, address)| address)
    })
}

/// Substitute every placeholder that names a library in `links` with that
/// library's address. Placeholders of unknown libraries are left in place.
///
/// Substitution consumes the placeholders it resolves, so resolving an
/// already resolved template again is a no-op.
pub fn resolve(template: &str, links: &LinkTable) -> String {
    let mut linked = String::with_capacity(template.len());
    let mut last = 0;
    for placeholder in placeholders(template) {
        if let Some(address) = lookup(links, &placeholder) {
            linked.push_str(&template[last..placeholder.start]);
            linked.push_str(&fit_address(address, placeholder.width()));
            last = placeholder.end;
        }
    }
    linked.push_str(&template[last..]);
    linked
}

/// Names of the libraries still referenced by `bytecode`, each once, sorted.
pub fn detect_unresolved(bytecode: &str) -> Vec<String> {
    placeholders(bytecode)
        .into_iter()
        .map(|p| p.name.to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Decode fully linked hex bytecode.
pub fn decode_bytecode(bytecode: &str) -> BindingResult<Bytes> {
    Ok(hex::decode(strip_0x_prefix(bytecode))?.into())
}
