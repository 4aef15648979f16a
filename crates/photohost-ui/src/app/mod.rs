//! Browser entry point: mounts whichever widgets the current page carries.

use crate::core::lifecycle::{LifecycleStep, PageEvent, PageLifecycle};
use gloo::console;
use gloo::events::EventListener;
use gloo::utils::{document, window};
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::wasm_bindgen;
use web_sys::PageTransitionEvent;

mod bindings;
mod dashboard;
pub(crate) mod dom;
mod history;
mod notes;
mod upload;

enum Mounted {
    Dashboard(dashboard::DashboardHandle),
    Upload(upload::UploadHandle),
}

impl Mounted {
    fn unmount(self) {
        match self {
            Self::Dashboard(handle) => handle.unmount(),
            Self::Upload(handle) => handle.unmount(),
        }
    }
}

thread_local! {
    static PAGE: RefCell<PageLifecycle> = const { RefCell::new(PageLifecycle::new()) };
    static MOUNTED: RefCell<Vec<Mounted>> = const { RefCell::new(Vec::new()) };
}

/// Install the panic hook, mount once the document is parsed, and follow page lifecycle.
pub fn run_app() {
    console_error_panic_hook::set_once();
    if document().ready_state() == "loading" {
        EventListener::once(&document(), "DOMContentLoaded", |_| on_page(PageEvent::Ready))
            .forget();
    } else {
        on_page(PageEvent::Ready);
    }
    EventListener::new(&window(), "pagehide", |_| on_page(PageEvent::Hide)).forget();
    EventListener::new(&window(), "pageshow", |event| {
        let persisted = event
            .dyn_ref::<PageTransitionEvent>()
            .is_some_and(PageTransitionEvent::persisted);
        on_page(PageEvent::Show { persisted });
    })
    .forget();
}

/// Detach every mounted widget, aborting in-flight uploads.
///
/// Exported to page scripts as `unmountAll`; `pagehide` runs the same teardown.
#[wasm_bindgen(js_name = unmountAll)]
pub fn unmount_all() {
    on_page(PageEvent::Hide);
}

fn on_page(event: PageEvent) {
    let step = PAGE.with(|page| page.borrow_mut().apply(event));
    match step {
        LifecycleStep::Mount => mount_all(),
        LifecycleStep::Unmount => unmount_mounted(),
        LifecycleStep::Idle => {}
    }
}

fn unmount_mounted() {
    let mounted = MOUNTED.with(|cell| std::mem::take(&mut *cell.borrow_mut()));
    for handle in mounted {
        handle.unmount();
    }
}

fn mount_all() {
    let mut mounted = Vec::new();
    match dashboard::mount() {
        Ok(Some(handle)) => mounted.push(Mounted::Dashboard(handle)),
        Ok(None) => {}
        Err(err) => console::error!("dashboard mount failed", err.to_string()),
    }
    match upload::mount() {
        Ok(Some(handle)) => mounted.push(Mounted::Upload(handle)),
        Ok(None) => {}
        Err(err) => console::error!("upload widget mount failed", err.to_string()),
    }
    MOUNTED.with(|cell| cell.borrow_mut().extend(mounted));
}
