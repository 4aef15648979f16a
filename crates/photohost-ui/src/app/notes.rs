//! Secret-notes partial: tabs, the retention modal, and copy-to-clipboard.

use crate::app::dom::{append, by_id, create, document_query_all, query_all, set_attr, set_class};
use crate::core::config::COPY_RESET_MS;
use crate::core::notes::{CopyLabel, NoteModal, NoteTab, select_tab};
use gloo::console;
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use gloo::utils::{document, window};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Element, HtmlDocument, HtmlElement, HtmlTextAreaElement, KeyboardEvent};

const MODAL_ID: &str = "retentionModal";
const OPEN_CLASS: &str = "is-open";

struct Tab {
    tab: NoteTab,
    button: HtmlElement,
    pane: Element,
}

type Tabs = Rc<Vec<Tab>>;

pub(crate) fn bind() -> Vec<EventListener> {
    let tabs: Tabs = Rc::new(
        NoteTab::ALL
            .into_iter()
            .filter_map(|tab| {
                Some(Tab {
                    tab,
                    button: by_id(&tab.button_id())?,
                    pane: by_id(&tab.pane_id())?,
                })
            })
            .collect(),
    );
    let mut listeners: Vec<EventListener> = tabs
        .iter()
        .map(|entry| {
            let tabs = Rc::clone(&tabs);
            let tab = entry.tab;
            EventListener::new(&entry.button, "click", move |_| show_tab(&tabs, tab))
        })
        .collect();
    if let Some(first) = tabs.first() {
        show_tab(&tabs, first.tab);
    }

    for button in document_query_all::<HtmlElement>(".js-view-note") {
        let tabs = Rc::clone(&tabs);
        let target = button.clone();
        listeners.push(EventListener::new(&target, "click", move |_| {
            open_modal(&NoteModal {
                note_id: button.get_attribute("data-note-id").unwrap_or_default(),
                plaintext: button.get_attribute("data-plaintext").unwrap_or_default(),
            });
            let owner = button
                .closest(".dash-tabpane")
                .ok()
                .flatten()
                .and_then(|pane| NoteTab::from_pane_id(&pane.id()));
            if let Some(tab) = owner {
                show_tab(&tabs, tab);
            }
        }));
    }

    if let Some(modal) = by_id::<Element>(MODAL_ID) {
        for closer in query_all::<Element>(&modal, "[data-close='1']") {
            listeners.push(EventListener::new(&closer, "click", |_| close_modal()));
        }
    }

    listeners.extend(bind_copy());
    listeners
}

/// Document-level Escape handler; bound once per dashboard mount.
pub(crate) fn bind_escape() -> EventListener {
    EventListener::new(&document(), "keydown", |event| {
        let is_escape = event
            .dyn_ref::<KeyboardEvent>()
            .is_some_and(|key| key.key() == "Escape");
        let open = by_id::<Element>(MODAL_ID)
            .is_some_and(|modal| modal.class_list().contains(OPEN_CLASS));
        if is_escape && open {
            close_modal();
        }
    })
}

fn show_tab(tabs: &[Tab], selected: NoteTab) {
    let present: Vec<NoteTab> = tabs.iter().map(|entry| entry.tab).collect();
    for (entry, flags) in tabs.iter().zip(select_tab(&present, selected)) {
        set_class(&entry.button, "is-active", flags.active);
        set_class(&entry.pane, "is-active", flags.active);
        set_attr(&entry.button, "aria-selected", flags.aria_selected());
    }
}

fn open_modal(note: &NoteModal) {
    let Some(modal) = by_id::<Element>(MODAL_ID) else {
        return;
    };
    if let Some(id) = by_id::<Element>("retentionModalId") {
        id.set_text_content(Some(&note.note_id));
    }
    if let Some(text) = by_id::<HtmlTextAreaElement>("retentionModalText") {
        text.set_value(&note.plaintext);
    }
    set_class(&modal, OPEN_CLASS, true);
    set_attr(&modal, "aria-hidden", "false");
}

fn close_modal() {
    let Some(modal) = by_id::<Element>(MODAL_ID) else {
        return;
    };
    set_class(&modal, OPEN_CLASS, false);
    set_attr(&modal, "aria-hidden", "true");
}

fn bind_copy() -> Option<EventListener> {
    let button = by_id::<HtmlElement>("retentionCopyBtn")?;
    let text = by_id::<HtmlTextAreaElement>("retentionModalText")?;
    let reset: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));
    Some(EventListener::new(&button.clone(), "click", move |_| {
        let button = button.clone();
        let text = text.clone();
        let reset = Rc::clone(&reset);
        spawn_local(async move {
            copy_plaintext(button, text, reset).await;
        });
    }))
}

async fn copy_plaintext(
    button: HtmlElement,
    text: HtmlTextAreaElement,
    reset: Rc<RefCell<Option<Timeout>>>,
) {
    let promise = window().navigator().clipboard().write_text(&text.value());
    match JsFuture::from(promise).await {
        Ok(_) => {
            render_copy_label(&button, CopyLabel::Copied);
            let timer = Timeout::new(COPY_RESET_MS, move || {
                render_copy_label(&button, CopyLabel::Copy);
            });
            *reset.borrow_mut() = Some(timer);
        }
        Err(err) => {
            console::error!("clipboard write failed; using execCommand", err);
            copy_by_selection(&text);
        }
    }
}

fn copy_by_selection(text: &HtmlTextAreaElement) {
    if let Err(err) = text.focus() {
        console::error!("textarea focus failed", err);
    }
    text.select();
    let copied = document()
        .dyn_into::<HtmlDocument>()
        .ok()
        .map(|doc| doc.exec_command("copy"));
    if let Some(Err(err)) = copied {
        console::error!("execCommand copy failed", err);
    }
}

fn render_copy_label(button: &HtmlElement, label: CopyLabel) {
    button.set_text_content(None);
    match create("i", label.icon_class()) {
        Ok(icon) => append(button, &icon),
        Err(err) => console::error!("copy icon render failed", err.to_string()),
    }
    if let Err(err) = button.append_with_str_1(label.text()) {
        console::error!("copy label render failed", err);
    }
}
