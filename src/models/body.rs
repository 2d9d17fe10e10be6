//! Request bodies.

use std::path::PathBuf;

use reqwest::Method;

use crate::config::DEFAULT_FORM_CONTENT_TYPE;
use crate::error_handling::{RequestError, TransportError};
use crate::models::Headers;

/// A file uploaded as a `multipart/form-data` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFile {
    pub path: PathBuf,
    /// Part content type; `application/octet-stream` when absent
    pub content_type: Option<String>,
    /// Form field name; `file` when absent
    pub name: Option<String>,
}

impl RequestFile {
    /// Describes a file upload.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::InvalidArgument` if `path` is not a readable
    /// regular file.
    pub fn new(
        path: impl Into<PathBuf>,
        content_type: Option<String>,
        name: Option<String>,
    ) -> Result<Self, RequestError> {
        let path = path.into();
        if !path.is_file() {
            return Err(RequestError::invalid(
                "file",
                format!("{} is not a regular file", path.display()),
            ));
        }
        std::fs::File::open(&path).map_err(|e| {
            RequestError::invalid("file", format!("{} is not readable: {}", path.display(), e))
        })?;
        Ok(Self {
            path,
            content_type,
            name,
        })
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string())
    }
}

/// Request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    #[default]
    Empty,
    /// Sent verbatim
    Bytes(Vec<u8>),
    /// URL-encoded form fields
    Form(Vec<(String, String)>),
    /// Single-file multipart upload
    File(RequestFile),
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Bytes(value.as_bytes().to_vec())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Bytes(value.into_bytes())
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(value)
    }
}

/// Wire bytes of a body plus the content type it implies.
#[derive(Debug, Default)]
pub(crate) struct EncodedBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl Body {
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Bytes(bytes) => bytes.is_empty(),
            Body::Form(fields) => fields.is_empty(),
            Body::File(_) => false,
        }
    }

    /// Query-string form of the body, for methods that carry data in the URL.
    ///
    /// File bodies have no query form.
    pub(crate) fn query_string(&self) -> Option<String> {
        match self {
            Body::Empty | Body::File(_) => None,
            Body::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Body::Form(fields) => Some(encode_form(fields)),
        }
    }

    /// Produces the bytes sent on the wire.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if an upload file cannot be read.
    pub(crate) async fn encode(&self) -> Result<EncodedBody, TransportError> {
        match self {
            Body::Empty => Ok(EncodedBody::default()),
            Body::Bytes(bytes) => Ok(EncodedBody {
                bytes: bytes.clone(),
                content_type: None,
            }),
            Body::Form(fields) => Ok(EncodedBody {
                bytes: encode_form(fields).into_bytes(),
                content_type: Some(DEFAULT_FORM_CONTENT_TYPE.to_string()),
            }),
            Body::File(file) => {
                let contents = tokio::fs::read(&file.path).await?;
                Ok(encode_multipart(file, &contents))
            }
        }
    }
}

/// Whether `method` carries its data in the query string.
pub(crate) fn sends_data_in_query(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::DELETE
}

/// Adds the default `Content-Length`/`Content-Type` for a body.
///
/// Applies to non-empty bodies and to every POST, so servers that demand a
/// length on POST get one even for an empty body.
pub(crate) fn apply_body_defaults(
    method: &Method,
    headers: &mut Headers,
    body: &EncodedBody,
    with_length: bool,
) {
    if body.bytes.is_empty() && *method != Method::POST {
        return;
    }
    if with_length && !headers.contains("Content-Length") {
        headers.append("Content-Length", body.bytes.len().to_string());
    }
    if !headers.contains("Content-Type") {
        let content_type = body
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_FORM_CONTENT_TYPE);
        headers.append("Content-Type", content_type);
    }
}

fn encode_form(fields: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

fn encode_multipart(file: &RequestFile, contents: &[u8]) -> EncodedBody {
    let boundary = format!(
        "request-engine-{:x}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );
    let field = file.name.as_deref().unwrap_or("file");
    let part_type = file
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    let mut bytes = Vec::with_capacity(contents.len() + 256);
    bytes.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    bytes.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field,
            file.file_name()
        )
        .as_bytes(),
    );
    bytes.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part_type).as_bytes());
    bytes.extend_from_slice(contents);
    bytes.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    EncodedBody {
        bytes,
        content_type: Some(format!("multipart/form-data; boundary={}", boundary)),
    }
}
