//! Listeners scoped to the partial currently shown in the dashboard.

use crate::app::dashboard::Dashboard;
use crate::app::dom::by_id;
use crate::app::notes;
use crate::core::nav::{HistoryMode, clean_params};
use crate::core::routes::{DashRoute, QueryForm};
use gloo::console;
use gloo::events::{EventListener, EventListenerOptions};
use wasm_bindgen_futures::spawn_local;
use web_sys::{FormData, HtmlFormElement};

const TWOFA_FORMS: [&str; 2] = ["twofaEnableForm", "twofaDisableForm"];

/// Bind everything the freshly injected partial for `route` needs.
pub(crate) fn bind(dashboard: &Dashboard, route: DashRoute) -> Vec<EventListener> {
    let mut listeners = Vec::new();
    if let Some(query) = route.query_form() {
        listeners.extend(bind_query_form(dashboard, route, query));
    }
    match route {
        DashRoute::SecretNotes => listeners.extend(notes::bind()),
        DashRoute::TwoFa => listeners.extend(bind_twofa(dashboard)),
        DashRoute::Stats | DashRoute::Sections | DashRoute::Files => {}
    }
    listeners
}

fn bind_query_form(
    dashboard: &Dashboard,
    route: DashRoute,
    query: QueryForm,
) -> Option<EventListener> {
    let form = by_id::<HtmlFormElement>(query.form_id)?;
    let dashboard = dashboard.clone();
    Some(EventListener::new_with_options(
        &form.clone(),
        "submit",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            event.prevent_default();
            let data = match FormData::new_with_form(&form) {
                Ok(data) => data,
                Err(err) => {
                    console::error!("form data unavailable", query.form_id, err);
                    return;
                }
            };
            let params = clean_params(query.fields.iter().map(|field| {
                (*field, data.get(field).as_string().unwrap_or_default())
            }));
            dashboard.navigate(route.name(), params, HistoryMode::Push);
        },
    ))
}

fn bind_twofa(dashboard: &Dashboard) -> Vec<EventListener> {
    TWOFA_FORMS
        .into_iter()
        .filter_map(by_id::<HtmlFormElement>)
        .map(|form| {
            let dashboard = dashboard.clone();
            EventListener::new_with_options(
                &form.clone(),
                "submit",
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    event.prevent_default();
                    let dashboard = dashboard.clone();
                    let form = form.clone();
                    spawn_local(async move {
                        dashboard.post_and_reload(DashRoute::TwoFa, form).await;
                    });
                },
            )
        })
        .collect()
}
