//! Upload widget: selection, drag-and-drop, previews, and the tracked request.
//!
//! # Design
//! - [`UploadSession`] owns every decision; handlers translate DOM events into session
//!   calls and render the result.
//! - Session borrows are released before anything that can re-enter a handler
//!   (request abort, follow-up navigation).
//! - Timers and the request are only replaced from outside their own callbacks.

use crate::app::dom::{
    append, by_id, create, csrf_token, now_ms, set_attr, set_class, set_style, set_text,
    set_visible,
};
use crate::core::config::{UploadConfig, UploadVariant};
use crate::core::upload::progress::{FileRowState, ProgressSample, format_bytes};
use crate::core::upload::selection::FileMeta;
use crate::core::upload::session::{
    FollowUp, ProgressView, SelectionView, Settled, StatusBanner, SubmitAction, UploadSession,
};
use crate::services::upload::{self as transport, UploadRequest, XhrEvent};
use gloo::console;
use gloo::events::{EventListener, EventListenerOptions};
use gloo::file::callbacks::{FileReader, read_as_data_url};
use gloo::timers::callback::Timeout;
use gloo::utils::window;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{
    DragEvent, Element, File, FileList, FormData, HtmlElement, HtmlFormElement,
    HtmlInputElement,
};

const DRAGOVER: &str = "dragover";
const BAR_SUCCESS_CLASS: &str = "progress-bar progress-bar-striped bg-success";

/// Shared handle to a mounted widget.
#[derive(Clone)]
struct Upload {
    inner: Rc<Inner>,
}

struct Inner {
    session: RefCell<UploadSession>,
    el: Elements,
    request: RefCell<Option<UploadRequest>>,
    readers: RefCell<Vec<FileReader>>,
    timer: RefCell<Option<Timeout>>,
    rows: RefCell<Vec<FileRow>>,
}

struct Elements {
    form: HtmlFormElement,
    input: HtmlInputElement,
    drop_zone: Option<HtmlElement>,
    count: Option<Element>,
    warnings: Option<Element>,
    previews: Option<Element>,
    panel: Option<Panel>,
}

/// Status panel of the tracked variant.
struct Panel {
    container: HtmlElement,
    status_text: Element,
    bar: HtmlElement,
    bar_class: String,
    progress_text: Option<Element>,
    speed_text: Option<Element>,
    file_list: Option<Element>,
    cancel: Option<HtmlElement>,
}

struct FileRow {
    status: HtmlElement,
    bar: HtmlElement,
}

/// Mounted widget; unmounting aborts any request and detaches everything.
pub(crate) struct UploadHandle {
    upload: Upload,
    listeners: Vec<EventListener>,
}

impl UploadHandle {
    pub(crate) fn unmount(self) {
        let inner = &self.upload.inner;
        let request = inner.request.borrow_mut().take();
        if let Some(request) = request {
            request.discard();
        }
        inner.readers.borrow_mut().clear();
        *inner.timer.borrow_mut() = None;
        inner.rows.borrow_mut().clear();
        drop(self.listeners);
    }
}

/// Mount onto `#fileInput` and its upload form when present.
pub(crate) fn mount() -> anyhow::Result<Option<UploadHandle>> {
    let Some(input) = by_id::<HtmlInputElement>("fileInput") else {
        return Ok(None);
    };
    let form = by_id::<HtmlFormElement>("uploadForm")
        .or_else(|| {
            by_id::<Element>("dropZone")?
                .closest("form")
                .ok()
                .flatten()?
                .dyn_into::<HtmlFormElement>()
                .ok()
        })
        .or_else(|| input.form());
    let Some(form) = form else {
        console::warn!("file input has no form; upload widget not mounted");
        return Ok(None);
    };
    let panel = find_panel();
    let config = read_config(&form, panel.is_some());
    console::log!(format!(
        "upload widget mounted ({:?}, {} MB)",
        config.variant, config.ceiling_mb
    ));

    let upload = Upload {
        inner: Rc::new(Inner {
            session: RefCell::new(UploadSession::new(config)),
            el: Elements {
                form,
                input,
                drop_zone: by_id("dropZone"),
                count: by_id("fileCount"),
                warnings: by_id("fileWarnings"),
                previews: by_id("previewContainer"),
                panel,
            },
            request: RefCell::new(None),
            readers: RefCell::new(Vec::new()),
            timer: RefCell::new(None),
            rows: RefCell::new(Vec::new()),
        }),
    };

    let mut listeners = vec![bind_change(&upload), bind_submit(&upload)];
    listeners.extend(bind_drop_zone(&upload));
    listeners.extend(bind_cancel(&upload));
    Ok(Some(UploadHandle { upload, listeners }))
}

fn find_panel() -> Option<Panel> {
    let container = by_id::<HtmlElement>("uploadStatusContainer")?;
    let status_text = by_id::<Element>("uploadStatusText")?;
    let bar = by_id::<HtmlElement>("uploadProgressBar")?;
    Some(Panel {
        bar_class: bar.class_name(),
        container,
        status_text,
        bar,
        progress_text: by_id("uploadProgressText"),
        speed_text: by_id("uploadSpeedText"),
        file_list: by_id("uploadFileList"),
        cancel: by_id("cancelUploadBtn"),
    })
}

fn read_config(form: &HtmlFormElement, has_panel: bool) -> UploadConfig {
    let variant = form.get_attribute("data-upload-variant");
    let ceiling = form.get_attribute("data-max-upload-mb");
    let mut config =
        match UploadConfig::from_attributes(variant.as_deref(), ceiling.as_deref(), has_panel) {
            Ok(config) => config,
            Err(err) => {
                console::warn!("upload config ignored", format!("{err:?}"));
                UploadConfig::from_attributes(None, None, has_panel)
                    .unwrap_or_else(|_| UploadConfig::for_variant(UploadVariant::Simple))
            }
        };
    if config.variant == UploadVariant::Tracked && !has_panel {
        console::warn!("tracked upload needs #uploadStatusContainer; using native submit");
        config.variant = UploadVariant::Simple;
    }
    config
}

fn bind_change(upload: &Upload) -> EventListener {
    let upload = upload.clone();
    let input = upload.inner.el.input.clone();
    EventListener::new(&input, "change", move |_| {
        upload.select(upload.inner.el.input.files());
    })
}

fn bind_drop_zone(upload: &Upload) -> Vec<EventListener> {
    let Some(zone) = upload.inner.el.drop_zone.clone() else {
        return Vec::new();
    };
    let mut listeners: Vec<EventListener> = ["dragenter", "dragover", "dragleave"]
        .into_iter()
        .map(|name| {
            let zone_el = zone.clone();
            let over = name != "dragleave";
            EventListener::new_with_options(
                &zone,
                name,
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    event.prevent_default();
                    event.stop_propagation();
                    set_class(&zone_el, DRAGOVER, over);
                },
            )
        })
        .collect();

    let upload = upload.clone();
    let zone_el = zone.clone();
    listeners.push(EventListener::new_with_options(
        &zone,
        "drop",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            event.prevent_default();
            event.stop_propagation();
            set_class(&zone_el, DRAGOVER, false);
            let files = event
                .dyn_ref::<DragEvent>()
                .and_then(DragEvent::data_transfer)
                .and_then(|transfer| transfer.files());
            if let Some(files) = &files {
                upload.inner.el.input.set_files(Some(files));
            }
            upload.select(files);
        },
    ));
    listeners
}

fn bind_submit(upload: &Upload) -> EventListener {
    let upload = upload.clone();
    let form = upload.inner.el.form.clone();
    EventListener::new_with_options(
        &form,
        "submit",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            let decided = upload.inner.session.borrow_mut().submit(now_ms());
            match decided {
                Ok(SubmitAction::Native) => {}
                Ok(SubmitAction::Ignore) => event.prevent_default(),
                Ok(SubmitAction::Send) => {
                    event.prevent_default();
                    upload.start();
                }
                Err(rejection) => {
                    event.prevent_default();
                    set_text(upload.inner.el.warnings.as_ref(), &rejection.to_string());
                }
            }
        },
    )
}

fn bind_cancel(upload: &Upload) -> Option<EventListener> {
    let button = upload.inner.el.panel.as_ref()?.cancel.clone()?;
    let upload = upload.clone();
    Some(EventListener::new(&button, "click", move |_| upload.cancel()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn file_meta(file: &File) -> FileMeta {
    FileMeta {
        name: file.name(),
        size: file.size().max(0.0) as u64,
        mime: file.type_(),
    }
}

fn list_files(list: Option<&FileList>) -> Vec<File> {
    list.map_or_else(Vec::new, |list| {
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    })
}

impl Upload {
    fn select(&self, list: Option<FileList>) {
        let files = list_files(list.as_ref());
        let view = self
            .inner
            .session
            .borrow_mut()
            .select(files.iter().map(file_meta).collect());
        self.render_selection(&view, &files);
    }

    fn render_selection(&self, view: &SelectionView, files: &[File]) {
        let el = &self.inner.el;
        let mut readers = self.inner.readers.borrow_mut();
        readers.clear();
        if let Some(previews) = &el.previews {
            previews.set_text_content(None);
        }
        set_text(el.count.as_ref(), view.summary.as_deref().unwrap_or_default());
        set_text(el.warnings.as_ref(), view.warning.as_deref().unwrap_or_default());
        if view.clear_input {
            el.input.set_value("");
        }
        let Some(container) = &el.previews else {
            return;
        };
        for file in view.previews.iter().filter_map(|&i| files.get(i)) {
            let container = container.clone();
            let blob = gloo::file::File::from(file.clone());
            readers.push(read_as_data_url(&blob, move |read| match read {
                Ok(url) => render_preview(&container, &url),
                Err(err) => console::warn!("preview read failed", err.to_string()),
            }));
        }
    }

    fn start(&self) {
        let request = self.inner.request.borrow_mut().take();
        if let Some(request) = request {
            request.discard();
        }
        self.render_start();

        let form = &self.inner.el.form;
        let sent = FormData::new_with_form(form)
            .map_err(crate::app::dom::js_error)
            .and_then(|body| {
                let upload = self.clone();
                transport::send(&form.action(), &body, csrf_token().as_deref(), move |event| {
                    upload.on_xhr(event);
                })
            });
        match sent {
            Ok(request) => *self.inner.request.borrow_mut() = Some(request),
            Err(err) => {
                console::error!("upload request failed to start", err.to_string());
                let settled = self.inner.session.borrow_mut().network_error();
                self.settle(settled);
            }
        }
    }

    fn on_xhr(&self, event: XhrEvent) {
        match event {
            XhrEvent::Progress { loaded, total } => {
                let view = self
                    .inner
                    .session
                    .borrow_mut()
                    .progress(loaded, total, now_ms());
                if let Some(view) = view {
                    self.render_progress(&view);
                }
            }
            XhrEvent::Load { status, body } => {
                let settled = self.inner.session.borrow_mut().complete(status, &body);
                match &settled {
                    Some(Settled::FollowUp { .. }) => self.render_success(),
                    Some(Settled::Reset { .. }) => console::warn!("upload rejected", status),
                    None => {}
                }
                self.settle(settled);
            }
            XhrEvent::Error => {
                console::error!("upload network error");
                let settled = self.inner.session.borrow_mut().network_error();
                self.settle(settled);
            }
            XhrEvent::Abort => {
                let settled = self.inner.session.borrow_mut().cancel();
                self.settle(settled);
            }
        }
    }

    fn cancel(&self) {
        let settled = self.inner.session.borrow_mut().cancel();
        if settled.is_none() {
            return;
        }
        // The abort event re-enters `on_xhr`; the session already ignores it.
        if let Some(request) = self.inner.request.borrow().as_ref() {
            request.abort();
        }
        self.settle(settled);
    }

    /// Render the banner and arm the follow-up or reset timer.
    fn settle(&self, settled: Option<Settled>) {
        let Some(settled) = settled else {
            return;
        };
        let banner = self.inner.session.borrow().banner().cloned();
        if let Some(banner) = &banner {
            self.render_banner(banner);
        }
        let upload = self.clone();
        let timer = match settled {
            Settled::FollowUp { action, delay_ms } => {
                Timeout::new(delay_ms, move || upload.follow_up(&action))
            }
            Settled::Reset { delay_ms } => Timeout::new(delay_ms, move || upload.reset()),
        };
        *self.inner.timer.borrow_mut() = Some(timer);
    }

    fn follow_up(&self, action: &FollowUp) {
        let location = window().location();
        let result = match action {
            FollowUp::Redirect(url) => location.set_href(url),
            FollowUp::Reload => location.reload(),
            FollowUp::Resubmit => self.inner.el.form.submit(),
        };
        if let Err(err) = result {
            console::error!("upload follow-up failed", err);
        }
    }

    fn reset(&self) {
        self.inner.session.borrow_mut().reset();
        let request = self.inner.request.borrow_mut().take();
        if let Some(request) = request {
            request.discard();
        }
        if let Some(panel) = &self.inner.el.panel {
            set_visible(&panel.container, false);
        }
        set_visible(&self.inner.el.form, true);
    }

    fn render_banner(&self, banner: &StatusBanner) {
        let Some(panel) = &self.inner.el.panel else {
            return;
        };
        panel.status_text.set_text_content(Some(&banner.text));
        let alert = panel
            .status_text
            .parent_element()
            .and_then(|parent| parent.parent_element());
        if let Some(alert) = alert {
            alert.set_class_name(banner.kind.alert_class());
        }
    }

    fn render_start(&self) {
        let Some(panel) = &self.inner.el.panel else {
            return;
        };
        set_visible(&panel.container, true);
        set_visible(&self.inner.el.form, false);
        let banner = self.inner.session.borrow().banner().cloned();
        if let Some(banner) = &banner {
            self.render_banner(banner);
        }
        panel.bar.set_class_name(&panel.bar_class);
        set_bar(&panel.bar, 0);
        set_text(panel.speed_text.as_ref(), "");
        set_text(panel.progress_text.as_ref(), "Starting upload...");
        self.render_rows(panel);
    }

    fn render_rows(&self, panel: &Panel) {
        let mut rows = self.inner.rows.borrow_mut();
        rows.clear();
        let Some(list) = &panel.file_list else {
            return;
        };
        list.set_text_content(None);
        let session = self.inner.session.borrow();
        let Some(batch) = session.batch() else {
            return;
        };
        for file in batch.files() {
            match build_row(file) {
                Ok((item, row)) => {
                    append(list, &item);
                    rows.push(row);
                }
                Err(err) => console::error!("file row render failed", err.to_string()),
            }
        }
    }

    fn render_progress(&self, view: &ProgressView) {
        let Some(panel) = &self.inner.el.panel else {
            return;
        };
        render_sample(panel, &view.sample);
        for (row, state) in self.inner.rows.borrow().iter().zip(&view.rows) {
            render_row(row, *state);
        }
    }

    fn render_success(&self) {
        let Some(panel) = &self.inner.el.panel else {
            return;
        };
        set_bar(&panel.bar, 100);
        panel.bar.set_class_name(BAR_SUCCESS_CLASS);
        for row in self.inner.rows.borrow().iter() {
            render_row(row, FileRowState::Completed);
        }
    }
}

fn render_preview(container: &Element, url: &str) {
    match create("img", "preview-img") {
        Ok(img) => {
            set_attr(&img, "src", url);
            set_style(&img, "width", "100px");
            set_style(&img, "height", "100px");
            set_style(&img, "object-fit", "cover");
            set_style(&img, "border-radius", "5px");
            append(container, &img);
        }
        Err(err) => console::error!("preview render failed", err.to_string()),
    }
}

fn set_bar(bar: &HtmlElement, percent: u8) {
    set_style(bar, "width", &format!("{percent}%"));
    bar.set_text_content(Some(&format!("{percent}%")));
    set_attr(bar, "aria-valuenow", &percent.to_string());
}

fn render_sample(panel: &Panel, sample: &ProgressSample) {
    set_bar(&panel.bar, sample.percent());
    set_text(panel.speed_text.as_ref(), &sample.speed_line());
    set_text(panel.progress_text.as_ref(), &sample.bytes_line());
}

fn build_row(file: &FileMeta) -> anyhow::Result<(HtmlElement, FileRow)> {
    let item = create("div", "upload-file-item")?;
    let info = create("div", "d-flex align-items-center")?;
    set_style(&info, "flex", "1");
    let status = create("div", "file-status pending")?;
    let text = create("div", "")?;
    set_style(&text, "flex", "1");
    let name = create("div", "text-truncate")?;
    set_style(&name, "max-width", "200px");
    set_attr(&name, "title", &file.name);
    name.set_text_content(Some(&file.name));
    let size = create("small", "text-muted")?;
    size.set_text_content(Some(&format_bytes(file.size)));
    let track = create("div", "progress")?;
    set_style(&track, "width", "80px");
    set_style(&track, "height", "20px");
    let bar = create("div", "file-progress progress-bar")?;
    set_attr(&bar, "role", "progressbar");
    set_style(&bar, "width", "0%");
    bar.set_text_content(Some("0%"));

    append(&text, &name);
    append(&text, &size);
    append(&info, &status);
    append(&info, &text);
    append(&track, &bar);
    append(&item, &info);
    append(&item, &track);
    Ok((
        item,
        FileRow { status, bar },
    ))
}

fn render_row(row: &FileRow, state: FileRowState) {
    let (status_class, mark, percent, bar_class) = match state {
        FileRowState::Pending => ("file-status pending", "", 0, "file-progress progress-bar"),
        FileRowState::Uploading(percent) => (
            "file-status uploading",
            "",
            percent,
            "file-progress progress-bar progress-bar-striped progress-bar-animated",
        ),
        FileRowState::Completed => (
            "file-status completed",
            "✓",
            100,
            "file-progress progress-bar bg-success",
        ),
    };
    row.status.set_class_name(status_class);
    row.status.set_text_content(Some(mark));
    set_style(&row.bar, "width", &format!("{percent}%"));
    row.bar.set_text_content(Some(&format!("{percent}%")));
    row.bar.set_class_name(bar_class);
}
