//! Dashboard shell: partial loading, active-link highlight, history, and sidebar.
//!
//! # Design
//! - All routing decisions go through [`DashboardRouter`]; this module only moves bytes
//!   between it and the DOM.
//! - Route-scoped listeners are replaced after each successful load, from the async task,
//!   never from inside a listener that might be among those being dropped.

use crate::app::bindings;
use crate::app::dom::{
    by_id, csrf_token, document_query_all, replace_with_line, set_class,
};
use crate::app::history::{self, BrowserHistory};
use crate::app::notes;
use crate::core::config::{COLLAPSE_MEDIA_QUERY, DashboardConfig};
use crate::core::nav::{
    ActionOutcome, ContentView, DashboardRouter, FetchOutcome, HistoryMode, LOADING_TEXT,
    LoadTicket, QueryParams,
};
use crate::core::routes::DashRoute;
use crate::services::api::{fetch_partial, post_form};
use gloo::console;
use gloo::events::{EventListener, EventListenerOptions};
use gloo::utils::window;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlElement, HtmlFormElement, PopStateEvent};

const NAV_LINK_SELECTOR: &str = ".dash-nav .dash-link[data-route]";

/// Shared handle to the mounted dashboard.
#[derive(Clone)]
pub(crate) struct Dashboard {
    inner: Rc<Inner>,
}

struct Inner {
    router: RefCell<DashboardRouter<BrowserHistory>>,
    content: Element,
    nav_links: Vec<HtmlElement>,
    route_listeners: RefCell<Vec<EventListener>>,
}

/// Mounted dashboard; dropping or unmounting detaches every listener.
pub(crate) struct DashboardHandle {
    dashboard: Dashboard,
    listeners: Vec<EventListener>,
}

impl DashboardHandle {
    pub(crate) fn unmount(self) {
        self.dashboard.inner.route_listeners.borrow_mut().clear();
        drop(self.listeners);
    }
}

/// Mount onto `#dashContent` when present.
pub(crate) fn mount() -> anyhow::Result<Option<DashboardHandle>> {
    let Some(content) = by_id::<Element>("dashContent") else {
        return Ok(None);
    };
    let shell = by_id::<HtmlElement>("dashboardShell");
    let config = DashboardConfig {
        initial_route: shell
            .as_ref()
            .and_then(|shell| shell.get_attribute("data-initial-route")),
    };
    let dashboard = Dashboard {
        inner: Rc::new(Inner {
            router: RefCell::new(DashboardRouter::new(BrowserHistory)),
            content,
            nav_links: document_query_all(NAV_LINK_SELECTOR),
            route_listeners: RefCell::new(Vec::new()),
        }),
    };

    let mut listeners = Vec::new();
    if let Some(shell) = &shell {
        listeners.extend(bind_sidebar(shell));
    }
    for link in &dashboard.inner.nav_links {
        listeners.push(bind_nav_link(&dashboard, link));
    }
    listeners.push(bind_popstate(&dashboard));
    listeners.push(notes::bind_escape());

    let location = window().location();
    let path = location.pathname().unwrap_or_default();
    let query = location.search().unwrap_or_default();
    let ticket = dashboard.inner.router.borrow_mut().begin_initial(
        &path,
        &query,
        config.initial_route.as_deref(),
    );
    console::log!("dashboard mounted", ticket.route.name());
    dashboard.run(ticket);

    Ok(Some(DashboardHandle {
        dashboard,
        listeners,
    }))
}

impl Dashboard {
    /// Navigate by route name; unknown names render inline and leave history alone.
    pub(crate) fn navigate(&self, name: &str, params: QueryParams, mode: HistoryMode) {
        let accepted = self.inner.router.borrow_mut().begin(name, params, mode);
        match accepted {
            Ok(ticket) => self.run(ticket),
            Err(err) => self.render(&ContentView::Error(err.to_string())),
        }
    }

    /// POST a route-scoped form, then reload the route in place.
    ///
    /// A navigation started while the POST is in flight wins over its response.
    pub(crate) async fn post_and_reload(&self, route: DashRoute, form: HtmlFormElement) {
        let ticket = self.inner.router.borrow_mut().begin_action(route);
        let token = csrf_token();
        let outcome = post_form(&form.action(), &form, token.as_deref()).await;
        if let FetchOutcome::Network(detail) = &outcome {
            console::error!("dashboard action failed", detail);
        }
        let next = self.inner.router.borrow().finish_action(&ticket, outcome);
        match next {
            Some(ActionOutcome::Reload) => {
                self.navigate(route.name(), QueryParams::new(), HistoryMode::Skip);
            }
            Some(ActionOutcome::Show(view)) => {
                self.render(&view);
                if matches!(view, ContentView::Partial(_)) {
                    self.rebind(route);
                }
            }
            None => {}
        }
    }

    fn run(&self, ticket: LoadTicket) {
        self.set_active(ticket.route);
        self.render(&ContentView::Loading);
        let dashboard = self.clone();
        spawn_local(async move {
            let outcome = fetch_partial(&ticket.partial_url()).await;
            if let FetchOutcome::Network(detail) = &outcome {
                console::error!("partial fetch failed", ticket.partial_url(), detail);
            }
            let view = dashboard.inner.router.borrow_mut().finish(&ticket, outcome);
            let Some(view) = view else {
                return;
            };
            dashboard.render(&view);
            if matches!(view, ContentView::Partial(_)) {
                dashboard.rebind(ticket.route);
            }
        });
    }

    fn rebind(&self, route: DashRoute) {
        let listeners = bindings::bind(self, route);
        *self.inner.route_listeners.borrow_mut() = listeners;
    }

    fn render(&self, view: &ContentView) {
        let content = &self.inner.content;
        match view {
            ContentView::Loading => replace_with_line(content, "dash-loading", LOADING_TEXT),
            ContentView::Partial(html) => content.set_inner_html(html),
            ContentView::Error(message) => replace_with_line(content, "dash-error", message),
        }
    }

    fn set_active(&self, route: DashRoute) {
        for link in &self.inner.nav_links {
            let on = link.get_attribute("data-route").as_deref() == Some(route.name());
            set_class(link, "active", on);
        }
    }
}

fn bind_nav_link(dashboard: &Dashboard, link: &HtmlElement) -> EventListener {
    let dashboard = dashboard.clone();
    let route = link.get_attribute("data-route").unwrap_or_default();
    EventListener::new_with_options(
        link,
        "click",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            event.prevent_default();
            dashboard.navigate(&route, QueryParams::new(), HistoryMode::Push);
        },
    )
}

fn bind_popstate(dashboard: &Dashboard) -> EventListener {
    let dashboard = dashboard.clone();
    EventListener::new(&window(), "popstate", move |event| {
        let state = event
            .dyn_ref::<PopStateEvent>()
            .and_then(|event| history::decode(&event.state()));
        let restored = dashboard.inner.router.borrow_mut().restore(state);
        match restored {
            Ok(Some(ticket)) => dashboard.run(ticket),
            Ok(None) => {}
            Err(err) => dashboard.render(&ContentView::Error(err.to_string())),
        }
    })
}

fn bind_sidebar(shell: &HtmlElement) -> Option<EventListener> {
    let narrow = window()
        .match_media(COLLAPSE_MEDIA_QUERY)
        .ok()
        .flatten()
        .is_some_and(|query| query.matches());
    if narrow {
        set_class(shell, "is-collapsed", true);
    }
    let toggle = by_id::<HtmlElement>("dashToggle")?;
    let shell = shell.clone();
    Some(EventListener::new(&toggle, "click", move |_| {
        let collapsed = shell.class_list().contains("is-collapsed");
        set_class(&shell, "is-collapsed", !collapsed);
    }))
}
