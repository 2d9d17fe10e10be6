//! Certificate field extraction.

use x509_parser::extensions::{GeneralName, ParsedExtension};

/// The certificate fields host-name verification looks at.
///
/// `subject_alt_name` uses the textual form `DNS: a.example, IP Address: 10.0.0.1`,
/// one comma-separated entry per general name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateFields {
    /// Subject common name
    pub subject_cn: Option<String>,
    /// `subjectAltName` extension; `None` when the extension is absent
    pub subject_alt_name: Option<String>,
}

impl CertificateFields {
    /// Extracts the fields from a DER-encoded X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate cannot be parsed.
    pub fn from_der(der: &[u8]) -> anyhow::Result<Self> {
        let (_, cert) = x509_parser::parse_x509_certificate(der)?;

        let subject_cn = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(str::to_string);

        let mut subject_alt_name = None;
        for ext in cert.extensions() {
            if let ParsedExtension::SubjectAlternativeName(ref san) = ext.parsed_extension() {
                let entries: Vec<String> = san
                    .general_names
                    .iter()
                    .filter_map(format_general_name)
                    .collect();
                subject_alt_name = Some(entries.join(", "));
            }
        }

        Ok(Self {
            subject_cn,
            subject_alt_name,
        })
    }
}

fn format_general_name(name: &GeneralName<'_>) -> Option<String> {
    match name {
        GeneralName::DNSName(dns) => Some(format!("DNS:{}", dns)),
        GeneralName::IPAddress(bytes) => format_ip(bytes).map(|ip| format!("IP Address:{}", ip)),
        GeneralName::RFC822Name(email) => Some(format!("email:{}", email)),
        GeneralName::URI(uri) => Some(format!("URI:{}", uri)),
        _ => None,
    }
}

fn format_ip(bytes: &[u8]) -> Option<std::net::IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(std::net::IpAddr::from),
        16 => <[u8; 16]>::try_from(bytes).ok().map(std::net::IpAddr::from),
        _ => None,
    }
}
