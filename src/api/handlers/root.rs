use axum::response::IntoResponse;

// Plain banner for the root path; everything real lives under /v1.
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
