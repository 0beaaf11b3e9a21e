use axum::{
    extract::Request,
    http::{header::CONTENT_LENGTH, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use granary::error::{ErrorResponse, REQUEST_ID_HEADER};

/// Echo the caller's `x-request-id`, or mint one, on every response.
///
/// Error responses carry their id in the JSON body as well. When the caller
/// sent an id, the body is rebuilt with it so header and body agree.
pub async fn request_id(request: Request, next: Next) -> Response {
    let header = HeaderName::from_static(REQUEST_ID_HEADER);
    let incoming = request.headers().get(&header).cloned();
    let mut response = next.run(request).await;

    match incoming {
        Some(id) => adopt_request_id(response, id),
        None => {
            if !response.headers().contains_key(&header) {
                if let Ok(id) =
                    HeaderValue::from_str(&format!("req_gr_{}", uuid::Uuid::new_v4()))
                {
                    response.headers_mut().insert(header, id);
                }
            }
            response
        }
    }
}

fn adopt_request_id(mut response: Response, id: HeaderValue) -> Response {
    let header = HeaderName::from_static(REQUEST_ID_HEADER);
    let Some(body) = response.extensions().get::<ErrorResponse>().cloned() else {
        response.headers_mut().insert(header, id);
        return response;
    };
    let Ok(id_text) = id.to_str() else {
        // Not representable in the JSON body; keep the error's own id.
        return response;
    };

    let body = ErrorResponse {
        request_id: id_text.to_string(),
        ..body
    };
    let (mut parts, _) = response.into_parts();
    let (_, rebuilt) = Json(body.clone()).into_response().into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    parts.headers.insert(header, id);
    parts.extensions.insert(body);
    Response::from_parts(parts, rebuilt)
}
