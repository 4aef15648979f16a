//! Instrumented multipart upload over `XMLHttpRequest`.
//!
//! # Design
//! - XHR is used instead of fetch because only XHR exposes upload progress.
//! - Listeners live as long as the returned handle; dropping it detaches them.
//! - `abort` dispatches the abort event synchronously, so callers must not hold
//!   state borrows that the event callback needs.

use crate::app::dom::js_error;
use crate::services::api::{CSRF_HEADER, REQUESTED_WITH, XML_HTTP_REQUEST};
use gloo::console;
use gloo::events::EventListener;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{FormData, ProgressEvent, XmlHttpRequest};

/// Events surfaced by an in-flight upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum XhrEvent {
    /// Bytes sent so far; only emitted when the length is computable.
    Progress { loaded: u64, total: u64 },
    /// Response received, any status.
    Load { status: u16, body: String },
    /// Transport failure.
    Error,
    /// Request aborted.
    Abort,
}

/// Handle to an in-flight upload.
pub(crate) struct UploadRequest {
    xhr: XmlHttpRequest,
    listeners: Vec<EventListener>,
}

impl UploadRequest {
    /// Abort; the abort event is delivered to the callback before this returns.
    pub(crate) fn abort(&self) {
        if let Err(err) = self.xhr.abort() {
            console::error!("upload abort failed", err);
        }
    }

    /// Detach the callback, then abort silently.
    pub(crate) fn discard(self) {
        let Self { xhr, listeners } = self;
        drop(listeners);
        if let Err(err) = xhr.abort() {
            console::error!("upload abort failed", err);
        }
    }
}

/// Start a POST of `body` to `url`, reporting through `on_event`.
pub(crate) fn send<F>(
    url: &str,
    body: &FormData,
    csrf: Option<&str>,
    on_event: F,
) -> anyhow::Result<UploadRequest>
where
    F: Fn(XhrEvent) + 'static,
{
    let xhr = XmlHttpRequest::new().map_err(js_error)?;
    let upload = xhr.upload().map_err(js_error)?;
    let on_event = Rc::new(on_event);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let listeners = vec![
        EventListener::new(&upload, "progress", {
            let on_event = Rc::clone(&on_event);
            move |event| {
                let Some(progress) = event.dyn_ref::<ProgressEvent>() else {
                    return;
                };
                if progress.length_computable() {
                    on_event(XhrEvent::Progress {
                        loaded: progress.loaded().max(0.0) as u64,
                        total: progress.total().max(0.0) as u64,
                    });
                }
            }
        }),
        EventListener::new(&xhr, "load", {
            let on_event = Rc::clone(&on_event);
            let xhr = xhr.clone();
            move |_| {
                let status = xhr.status().unwrap_or(0);
                let body = xhr.response_text().ok().flatten().unwrap_or_default();
                on_event(XhrEvent::Load { status, body });
            }
        }),
        EventListener::new(&xhr, "error", {
            let on_event = Rc::clone(&on_event);
            move |_| on_event(XhrEvent::Error)
        }),
        EventListener::new(&xhr, "abort", {
            let on_event = Rc::clone(&on_event);
            move |_| on_event(XhrEvent::Abort)
        }),
    ];

    xhr.open_with_async("POST", url, true).map_err(js_error)?;
    if let Some(token) = csrf {
        xhr.set_request_header(CSRF_HEADER, token)
            .map_err(js_error)?;
    }
    xhr.set_request_header(REQUESTED_WITH, XML_HTTP_REQUEST)
        .map_err(js_error)?;
    xhr.send_with_opt_form_data(Some(body)).map_err(js_error)?;

    Ok(UploadRequest {
        xhr,
        listeners,
    })
}
