//! Request signing for the Flow API.
//!
//! Flow authenticates requests with an HMAC-SHA256 over the request parameters. The string to sign is built by
//! sorting the parameter names and concatenating each `name` immediately followed by its `value`, with no separators.
//! The signature itself travels as the `s` parameter and is never part of the signed string.
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The name of the parameter that carries the request signature.
pub const SIGNATURE_PARAM: &str = "s";

fn string_to_sign<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut sorted = params.iter().filter(|(k, _)| k.as_ref() != SIGNATURE_PARAM).collect::<Vec<_>>();
    sorted.sort_by(|(a, _), (b, _)| a.as_ref().cmp(b.as_ref()));
    sorted.iter().fold(String::new(), |mut acc, (k, v)| {
        acc.push_str(k.as_ref());
        acc.push_str(v.as_ref());
        acc
    })
}

fn mac_for(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).unwrap_or_else(|_| unreachable!("HMAC accepts keys of any size"))
}

/// Calculates the lowercase hex HMAC-SHA256 signature of `params` using `secret`.
///
/// The result depends only on the parameter names and values and the secret; the order in which parameters are
/// supplied is irrelevant.
pub fn sign_params<K, V>(params: &[(K, V)], secret: &str) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut mac = mac_for(secret);
    mac.update(string_to_sign(params).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
