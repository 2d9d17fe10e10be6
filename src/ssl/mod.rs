//! Certificate host-name verification (RFC 2818).
//!
//! Pure functions matching a host against a reference name (with the
//! single-label wildcard rule) and against a certificate's CN/SAN fields.
//! The socket transport runs `verify_certificate` on the peer's leaf
//! certificate after the TLS handshake.

mod certificate;

use std::net::IpAddr;

pub use certificate::CertificateFields;

/// Checks that `reference` is a usable reference name.
///
/// A valid name is non-empty, has no whitespace or empty labels, and uses a
/// wildcard only as the complete first label of a name with at least three
/// labels (`*.example.com`, never `*.com` or `w*.example.com`).
pub fn verify_reference_name(reference: &str) -> bool {
    if reference.is_empty() || reference.chars().any(char::is_whitespace) {
        return false;
    }

    let labels: Vec<&str> = reference.split('.').collect();
    if labels.iter().any(|label| label.is_empty()) {
        return false;
    }

    let (first, rest) = match labels.split_first() {
        Some(split) => split,
        None => return false,
    };

    if first.contains('*') {
        // Wildcards need two non-wildcard labels to their right
        if *first != "*" || rest.len() < 2 {
            return false;
        }
    }

    !rest.iter().any(|label| label.contains('*'))
}

/// Matches `host` against a reference name from a certificate.
///
/// A wildcard reference matches exactly one extra label on the left and
/// never matches IP address literals. Comparison ignores ASCII case.
pub fn match_domain(host: &str, reference: &str) -> bool {
    if !verify_reference_name(reference) {
        return false;
    }

    let host = host.to_ascii_lowercase();
    let reference = reference.to_ascii_lowercase();
    if host == reference {
        return true;
    }

    if is_ip_literal(&host) {
        return false;
    }

    // Replace the host's first label with the wildcard
    match host.split_once('.') {
        Some((_, rest)) => format!("*.{}", rest) == reference,
        None => false,
    }
}

/// Verifies that a certificate was issued for `host`.
///
/// When the certificate carries a `subjectAltName`, only its `DNS:` entries
/// are considered: the first matching entry accepts the certificate, and a
/// SAN without any `DNS:` entry rejects it. Without a SAN the subject CN is
/// used; a missing or empty CN rejects the certificate.
pub fn verify_certificate(host: &str, certificate: &CertificateFields) -> bool {
    if let Some(san) = certificate.subject_alt_name.as_deref() {
        return san
            .split(',')
            .map(str::trim)
            .filter_map(|entry| entry.strip_prefix("DNS:"))
            .map(str::trim)
            .any(|reference| match_domain(host, reference));
    }

    match certificate.subject_cn.as_deref() {
        Some(cn) if !cn.is_empty() => match_domain(host, cn),
        _ => false,
    }
}

fn is_ip_literal(host: &str) -> bool {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok()
}
