pub mod auth;
pub mod response;
pub mod upload;

pub use auth::{principal_middleware, Principal};
pub use response::{MessageResponse, MessageResult};
pub use upload::{upload_context_middleware, UploadedAsset, UPLOAD_COORDS_HEADER, UPLOAD_FILENAME_HEADER};
