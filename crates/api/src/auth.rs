//! Identity extractors.
//!
//! Authentication is an external collaborator: an upstream gateway
//! verifies credentials and forwards the authenticated identity as a
//! header. This core trusts those headers and does no credential
//! checking itself.

use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use common::{BuyerId, SellerId};
use uuid::Uuid;

/// Header carrying the authenticated buyer id.
pub const BUYER_ID_HEADER: &str = "x-buyer-id";

/// Header carrying the authenticated seller id.
pub const SELLER_ID_HEADER: &str = "x-seller-id";

/// Rejection returned when an identity header is absent or malformed.
#[derive(Debug)]
pub enum AuthRejection {
    Missing(&'static str),
    Malformed(&'static str),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            AuthRejection::Missing(header) => format!("missing {header} header"),
            AuthRejection::Malformed(header) => format!("malformed {header} header"),
        };
        let body = serde_json::json!({ "error": message });
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

fn header_uuid(parts: &Parts, header: &'static str) -> Result<Uuid, AuthRejection> {
    let value = parts
        .headers
        .get(header)
        .ok_or(AuthRejection::Missing(header))?;
    value
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or(AuthRejection::Malformed(header))
}

/// Extractor requiring an authenticated buyer.
#[derive(Debug, Clone, Copy)]
pub struct Buyer(pub BuyerId);

impl<S> FromRequestParts<S> for Buyer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(BuyerId::from_uuid(header_uuid(
            parts,
            BUYER_ID_HEADER,
        )?)))
    }
}

/// Extractor requiring an authenticated seller.
#[derive(Debug, Clone, Copy)]
pub struct Seller(pub SellerId);

impl<S> FromRequestParts<S> for Seller
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(SellerId::from_uuid(header_uuid(
            parts,
            SELLER_ID_HEADER,
        )?)))
    }
}
