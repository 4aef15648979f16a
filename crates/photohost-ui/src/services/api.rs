//! HTTP client helpers for dashboard partials and form actions.

use crate::app::dom::js_error;
use crate::core::nav::FetchOutcome;
use gloo_net::http::Request;
use web_sys::{FormData, HtmlFormElement, RequestCredentials};

/// Header the server uses to tell partial/XHR requests from page loads.
pub(crate) const REQUESTED_WITH: &str = "X-Requested-With";
/// Value paired with [`REQUESTED_WITH`].
pub(crate) const XML_HTTP_REQUEST: &str = "XMLHttpRequest";
/// Header carrying the CSRF token on POSTs.
pub(crate) const CSRF_HEADER: &str = "X-CSRFToken";

/// GET a server-rendered partial.
pub(crate) async fn fetch_partial(url: &str) -> FetchOutcome {
    let request = Request::get(url)
        .header(REQUESTED_WITH, XML_HTTP_REQUEST)
        .credentials(RequestCredentials::SameOrigin);
    settle(request).await
}

/// POST a form as multipart data with the CSRF header when a token is available.
pub(crate) async fn post_form(
    url: &str,
    form: &HtmlFormElement,
    csrf: Option<&str>,
) -> FetchOutcome {
    let body = match FormData::new_with_form(form) {
        Ok(body) => body,
        Err(err) => return FetchOutcome::Network(js_error(err).to_string()),
    };
    let mut request = Request::post(url)
        .body(body)
        .credentials(RequestCredentials::SameOrigin);
    if let Some(token) = csrf {
        request = request.header(CSRF_HEADER, token);
    }
    settle(request).await
}

async fn settle(request: Request) -> FetchOutcome {
    match send(request).await {
        Ok(outcome) => outcome,
        Err(err) => FetchOutcome::Network(err.to_string()),
    }
}

async fn send(request: Request) -> anyhow::Result<FetchOutcome> {
    let response = request.send().await?;
    let body = response.text().await?;
    Ok(if response.ok() {
        FetchOutcome::Html(body)
    } else {
        FetchOutcome::Status {
            code: response.status(),
            body,
        }
    })
}
