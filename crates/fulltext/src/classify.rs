//! Content classification and charset decoding

use crate::types::{ClassifiedDocument, FetchResult, MimeCategory};
use encoding_rs::{DecoderResult, Encoding, UTF_8};
use tracing::debug;

/// Bytes scanned for a `<meta charset>` declaration
const META_PRESCAN_BYTES: usize = 1024;

/// Bytes scanned for leading comments and markup markers when sniffing
const SNIFF_BYTES: usize = 1024;

/// Prefixes that mark a body as HTML or XML when the header is not helpful
const MARKUP_MARKERS: &[&[u8]] = &[b"<!doctype html", b"<html", b"<head", b"<body", b"<?xml"];

/// Split a Content-Type value into its lowercased essence and charset
pub fn parse_content_type(value: &str) -> (String, Option<String>) {
    let mut parts = value.split(';');
    let essence = parts.next().unwrap_or("").trim().to_ascii_lowercase();
    let charset = parts.find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_string())
    });
    (essence, charset)
}

/// Classify a fetched document and decode its text
///
/// Never fails: content that cannot be decoded or is not text comes back
/// as [`MimeCategory::Unsupported`] with a reason.
pub fn classify(result: FetchResult) -> ClassifiedDocument {
    let category = category_for(&result);
    if category == MimeCategory::Unsupported {
        let reason = match result.content_type.as_deref() {
            Some(ct) => format!("content type {ct} is not text"),
            None => "content is not recognizable text".to_string(),
        };
        return unsupported(result, reason);
    }

    let bytes = &result.body[..];
    let declared = result
        .charset
        .as_deref()
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| match category {
            MimeCategory::Html => sniff_meta_charset(bytes),
            _ => None,
        })
        .or_else(|| Encoding::for_bom(bytes).map(|(encoding, _)| encoding));

    let (encoding, text) = match declared {
        Some(encoding) => {
            let start = match Encoding::for_bom(bytes) {
                Some((bom_encoding, len)) if bom_encoding == encoding => len,
                _ => 0,
            };
            match decode_strict(encoding, &bytes[start..], !result.truncated) {
                Some(text) => (encoding, text),
                None => {
                    let reason = format!("content is not valid {}", encoding.name());
                    return unsupported(result, reason);
                }
            }
        }
        None => {
            let start = if bytes.starts_with(b"\xEF\xBB\xBF") { 3 } else { 0 };
            let (text, had_errors) = UTF_8.decode_without_bom_handling(&bytes[start..]);
            if had_errors {
                debug!(url = %result.final_url, "Replaced invalid UTF-8 sequences");
            }
            (UTF_8, text.into_owned())
        }
    };

    ClassifiedDocument {
        result,
        category,
        encoding: encoding.name(),
        text,
        reason: None,
    }
}

fn unsupported(result: FetchResult, reason: String) -> ClassifiedDocument {
    ClassifiedDocument {
        result,
        category: MimeCategory::Unsupported,
        encoding: UTF_8.name(),
        text: String::new(),
        reason: Some(reason),
    }
}

/// Decide the category from the header, sniffing when it is missing or generic
fn category_for(result: &FetchResult) -> MimeCategory {
    let essence = result
        .content_type
        .as_deref()
        .map(|ct| parse_content_type(ct).0)
        .unwrap_or_default();

    match essence.as_str() {
        "" | "application/octet-stream" => sniff_category(&result.body),
        "text/html" | "application/xhtml+xml" | "text/xml" | "application/xml" => {
            MimeCategory::Html
        }
        "text/plain" if starts_with_markup(&result.body) => MimeCategory::Html,
        ct if ct.ends_with("+xml") => MimeCategory::Html,
        ct if ct.starts_with("text/") => MimeCategory::PlainText,
        _ => MimeCategory::Unsupported,
    }
}

/// Sniff the category from the leading bytes
fn sniff_category(bytes: &[u8]) -> MimeCategory {
    if starts_with_markup(bytes) {
        MimeCategory::Html
    } else if Encoding::for_bom(bytes).is_some() {
        MimeCategory::PlainText
    } else {
        MimeCategory::Unsupported
    }
}

/// True if the body opens with an HTML/XML marker
///
/// A BOM, whitespace and complete `<!-- -->` comments may precede the marker.
fn starts_with_markup(bytes: &[u8]) -> bool {
    let bytes = match Encoding::for_bom(bytes) {
        Some((_, len)) => &bytes[len..],
        None => bytes,
    };
    let head = bytes[..bytes.len().min(SNIFF_BYTES)].to_ascii_lowercase();
    let mut rest = head.as_slice();

    loop {
        rest = skip_ascii_whitespace(rest);
        if !rest.starts_with(b"<!--") {
            break;
        }
        match find(&rest[4..], b"-->") {
            Some(end) => rest = &rest[4 + end + 3..],
            None => return false,
        }
    }

    MARKUP_MARKERS.iter().any(|marker| rest.starts_with(marker))
}

fn skip_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Find a charset declared in a `<meta>` tag near the start of the document
fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = bytes[..bytes.len().min(META_PRESCAN_BYTES)].to_ascii_lowercase();
    let mut pos = 0;

    while let Some(offset) = find(&head[pos..], b"<meta") {
        let start = pos + offset;
        let end = head[start..]
            .iter()
            .position(|&b| b == b'>')
            .map_or(head.len(), |e| start + e);
        let tag = &head[start..end];

        if let Some(encoding) = meta_charset_value(tag).and_then(Encoding::for_label) {
            // A meta tag cannot truthfully declare UTF-16: the bytes it
            // was read from are ASCII-compatible.
            return Some(encoding.output_encoding());
        }
        pos = end;
    }
    None
}

/// Value of the first `charset = value` pair in a lowercased meta tag
///
/// Whitespace may surround `=`; the value may be quoted.
fn meta_charset_value(tag: &[u8]) -> Option<&[u8]> {
    let mut pos = 0;
    while let Some(offset) = find(&tag[pos..], b"charset") {
        pos += offset + b"charset".len();
        let Some(value) = skip_ascii_whitespace(&tag[pos..]).strip_prefix(b"=") else {
            continue;
        };
        let value = skip_ascii_whitespace(value);
        let value = value
            .strip_prefix(b"\"")
            .or_else(|| value.strip_prefix(b"'"))
            .unwrap_or(value);
        let end = value
            .iter()
            .position(|&b| b.is_ascii_whitespace() || matches!(b, b'"' | b'\'' | b';' | b'/' | b'>'))
            .unwrap_or(value.len());
        if end > 0 {
            return Some(&value[..end]);
        }
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Decode without replacement; `None` on the first malformed sequence
///
/// With `last == false` an incomplete sequence at the very end is dropped
/// instead of being reported, which is what a truncated body needs.
fn decode_strict(encoding: &'static Encoding, bytes: &[u8], last: bool) -> Option<String> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .unwrap_or(bytes.len().saturating_mul(3));
    let mut out = String::with_capacity(capacity);
    let mut src = bytes;

    loop {
        let (result, read) = decoder.decode_to_string_without_replacement(src, &mut out, last);
        src = &src[read..];
        match result {
            DecoderResult::InputEmpty => return Some(out),
            DecoderResult::OutputFull => {
                let more = decoder
                    .max_utf8_buffer_length_without_replacement(src.len())
                    .unwrap_or(src.len().saturating_mul(3))
                    .max(4);
                out.reserve(more);
            }
            DecoderResult::Malformed(_, _) => return None,
        }
    }
}
