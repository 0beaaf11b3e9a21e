use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Granary API",
        version = "0.1.0",
        description = "Search over grant activity records: free text, per-field filters, date bounds and offset pagination."
    ),
    servers(
        (url = "http://localhost:7800", description = "Local development")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::search::search,
    ),
    components(
        schemas(
            granary::SearchResponse,
            granary::SearchData,
            granary::ActivityRecord,
        )
    ),
    tags(
        (name = "search", description = "Activity record search"),
        (name = "health", description = "Liveness and corpus status")
    )
)]
pub struct ApiDoc;
