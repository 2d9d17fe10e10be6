//! Request and response data types.

pub(crate) mod body;
mod headers;
mod request;
mod response;

pub use body::{Body, RequestFile};
pub(crate) use body::{apply_body_defaults, EncodedBody};
pub use headers::Headers;
pub use request::{PreparedRequest, RequestDescriptor};
pub(crate) use response::is_redirect_status;
pub use response::Response;
