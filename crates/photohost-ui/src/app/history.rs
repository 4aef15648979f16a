//! `window.history` adapter for the dashboard router.

use crate::core::nav::{HistoryPort, NavState};
use gloo::console;
use gloo::utils::window;
use wasm_bindgen::JsValue;

/// Browser history; entries carry [`NavState`] serialized as a JSON string.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserHistory;

impl HistoryPort for BrowserHistory {
    fn push(&mut self, state: &NavState, url: &str) {
        write(state, url, false);
    }

    fn replace(&mut self, state: &NavState, url: &str) {
        write(state, url, true);
    }
}

fn write(state: &NavState, url: &str, replace: bool) {
    let json = match state.to_json() {
        Ok(json) => JsValue::from_str(&json),
        Err(err) => {
            console::error!("history state encode failed", err.to_string());
            return;
        }
    };
    let history = match window().history() {
        Ok(history) => history,
        Err(err) => {
            console::error!("history unavailable", err);
            return;
        }
    };
    let result = if replace {
        history.replace_state_with_url(&json, "", Some(url))
    } else {
        history.push_state_with_url(&json, "", Some(url))
    };
    if let Err(err) = result {
        console::error!("history update failed", url, err);
    }
}

/// Decode the state attached to a `popstate` event.
pub(crate) fn decode(state: &JsValue) -> Option<NavState> {
    state.as_string().and_then(|raw| NavState::from_json(&raw))
}
