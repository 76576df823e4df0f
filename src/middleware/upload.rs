use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::models::GeoPoint;

/// Set by the upload proxy to the stored image's filename.
pub const UPLOAD_FILENAME_HEADER: &str = "x-upload-filename";
/// Set by the upload proxy to the image geotag as `lon,lat`.
pub const UPLOAD_COORDS_HEADER: &str = "x-upload-coords";

/// An image stored by the upload step in front of this service.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadedAsset {
    pub filename: String,
    /// Absent when the image carried no geotag
    pub coords: Option<GeoPoint>,
}

/// Reads the upload headers into an [`UploadedAsset`] request extension.
pub async fn upload_context_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    if let Some(asset) = uploaded_asset_from_headers(request.headers())? {
        tracing::debug!("Upload context: {} ({:?})", asset.filename, asset.coords);
        request.extensions_mut().insert(asset);
    }
    Ok(next.run(request).await)
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| ApiError::bad_request(format!("Header {} is not valid text", name)))
        })
        .transpose()
}

fn uploaded_asset_from_headers(headers: &HeaderMap) -> Result<Option<UploadedAsset>, ApiError> {
    let filename = match header_text(headers, UPLOAD_FILENAME_HEADER)? {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Ok(None),
    };

    let coords = header_text(headers, UPLOAD_COORDS_HEADER)?
        .map(|raw| {
            GeoPoint::parse_pair(raw)
                .map_err(|e| ApiError::bad_request(format!("Invalid upload coordinates: {}", e)))
        })
        .transpose()?;

    Ok(Some(UploadedAsset { filename, coords }))
}
