use super::handlers::{admin, auth, contact, health, member, otp, posts, register};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec.
/// Routes added outside (like `/` or `OPTIONS /health`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut otp_tag = Tag::new("otp");
    otp_tag.description = Some("One-time code issuance and verification".to_string());

    let mut member_tag = Tag::new("member");
    member_tag.description =
        Some("Self-service membership actions gated by OTP verification".to_string());

    let mut admin_tag = Tag::new("admin");
    admin_tag.description = Some("Session-gated dashboard endpoints".to_string());

    let mut base = cargo_openapi();
    base.tags = Some(vec![otp_tag, member_tag, admin_tag]);

    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    let router = OpenApiRouter::with_openapi(base)
        .routes(routes!(health::health))
        .routes(routes!(register::register))
        .routes(routes!(otp::issue_otp))
        .routes(routes!(otp::verify_otp))
        .routes(routes!(member::membership_status))
        .routes(routes!(member::resign))
        .routes(routes!(member::data_request))
        .routes(routes!(posts::list_published))
        .routes(routes!(contact::contact))
        .routes(routes!(contact::volunteer))
        .routes(routes!(auth::session::login))
        .routes(routes!(auth::session::logout))
        .routes(routes!(auth::session::session))
        .routes(routes!(admin::registrations::list))
        .routes(routes!(admin::registrations::verify))
        .routes(routes!(admin::export::export))
        .routes(routes!(admin::posts::list, admin::posts::create))
        .routes(routes!(admin::posts::update, admin::posts::delete));

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );

        let contact = spec.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("PSP-K Digital Team"));
            assert_eq!(contact.email.as_deref(), Some("digital@pspk.or.ke"));
        }
    }

    #[test]
    fn openapi_covers_core_paths() {
        let spec = openapi();
        for path in [
            "/v1/otp/issue",
            "/v1/otp/verify",
            "/v1/member/status",
            "/v1/member/resign",
            "/v1/member/data-request",
            "/v1/admin/registrations/{id}/verify",
            "/v1/admin/registrations/export",
            "/v1/admin/posts",
        ] {
            assert!(
                spec.paths.paths.contains_key(path),
                "missing path {path} in OpenAPI document"
            );
        }
    }
}
