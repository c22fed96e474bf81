//! Request signing for the alidns RPC API.
//!
//! Every request carries a `Signature` parameter computed over the rest of
//! the query: parameters are RFC 3986 percent-encoded, sorted by key and
//! joined into a canonicalized query string, wrapped into
//! `GET&%2F&percentEncode(query)`, then HMAC-SHA1 signed with the access
//! key secret plus a trailing `&`, base64-encoded.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::collections::BTreeMap;

/// Percent-encode one parameter key or value.
///
/// RFC 3986 unreserved characters stay bare; everything else, space and
/// `*` included, is `%XX`-encoded byte-wise.
fn percent_encode(value: &str) -> String {
    use std::fmt::Write;
    let mut result = String::with_capacity(value.len() * 3);
    for c in value.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => result.push(c),
            _ => {
                let mut buf = [0u8; 4];
                let encoded = c.encode_utf8(&mut buf);
                for b in encoded.as_bytes() {
                    let _ = write!(result, "%{:02X}", b);
                }
            }
        }
    }
    result
}

/// Build the canonicalized query string (sorted, encoded, '&'-joined).
fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// The string the signature is computed over.
fn string_to_sign(method: &str, canonical: &str) -> String {
    format!("{}&{}&{}", method, percent_encode("/"), percent_encode(canonical))
}

fn hmac_sha1(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Produce the final query string for one GET call, `Signature` included.
pub(crate) fn signed_query(params: &BTreeMap<String, String>, access_key_secret: &str) -> String {
    let canonical = canonical_query(params);
    let digest = hmac_sha1(
        format!("{access_key_secret}&").as_bytes(),
        string_to_sign("GET", &canonical).as_bytes(),
    );
    let signature = BASE64.encode(digest);
    format!("{}&Signature={}", canonical, percent_encode(&signature))
}
