use md5::{Digest, Md5};

/// Compute the node message signature for `body` under a shared `secret`.
///
/// The signature is `hex(secret || md5(body))`: the MD5 digest of the body
/// appended to the raw secret bytes, hex-encoded as a whole. Deployed hosts
/// compute and verify exactly this framing, so it is wire-visible and must
/// not change without a coordinated rollout. It is a shared-secret integrity
/// check, not protection against an attacker who can capture traffic;
/// transport confidentiality is TLS's job.
pub fn simple_signature(body: &[u8], secret: &[u8]) -> String {
    let digest = Md5::digest(body);

    let mut buf = Vec::with_capacity(secret.len() + digest.len());
    buf.extend_from_slice(secret);
    buf.extend_from_slice(&digest);

    hex::encode(buf)
}

/// Hex-encoded MD5 digest of `body`.
///
/// Used by the host client to decide whether a locally managed file
/// differs from the value served by the server.
pub fn md5_hex(body: &[u8]) -> String {
    hex::encode(Md5::digest(body))
}
