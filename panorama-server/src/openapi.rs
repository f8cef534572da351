//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::handlers::{
    DeleteResponse, HealthResponse, ListResponse, ScanEntryResponse, UploadResponse, VariantUrls,
};

/// Panorama admin API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Panorama Gallery Admin API",
        version = "0.1.0",
        description = r#"
## Upload and manifest handler for the VR panorama gallery

Photos live in an object store under `{id}/picture/{file}`:

- `1.jpg` - the VR primary
- `mobile.webp` - small preview
- `desktop.webp` - large preview

A JSON manifest (`{"photos": [...], "lastUpdated": "YYYY-MM-DD"}`) lists the
published IDs in ascending order. Uploads add the ID, deletes remove it.
When the stored manifest is missing or empty the static manifest is used.

### Errors

Every error body is `{"success": false, "error": "...", "code": "..."}`.
Authentication failures always read `Unauthorized`.
"#,
        license(
            name = "MIT OR Apache-2.0",
            url = "https://github.com/war-in-vr/panorama-admin/blob/main/LICENSE"
        )
    ),
    servers(
        (url = "http://localhost:8787", description = "Local development server")
    ),
    tags(
        (name = "Admin", description = "Authenticated upload and delete"),
        (name = "Catalog", description = "Public listing and image proxy"),
        (name = "Health", description = "Service health")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::list::list_handler,
        crate::handlers::admin::admin_handler,
        crate::handlers::image::image_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ListResponse,
            ScanEntryResponse,
            UploadResponse,
            VariantUrls,
            DeleteResponse,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/", "/image", "/health"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
