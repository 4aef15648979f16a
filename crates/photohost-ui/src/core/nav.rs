//! Navigation state machine for the dashboard shell.
//!
//! # Design
//! - Every load takes a ticket; only the newest ticket may write content or history.
//! - History is written only after a partial loads successfully.
//! - Restoring from back/forward never writes history.

use crate::core::error::RouteError;
use crate::core::routes::DashRoute;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query parameters carried by a navigation, ordered for stable URLs.
pub type QueryParams = BTreeMap<String, String>;

/// Placeholder shown while a partial is in flight.
pub const LOADING_TEXT: &str = "Loading...";

/// Snapshot stored in each browser history entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavState {
    /// Route name (see [`DashRoute::name`]).
    pub route: String,
    /// Non-empty query parameters.
    #[serde(default)]
    pub params: QueryParams,
}

impl NavState {
    /// Encode for `history.pushState`.
    ///
    /// # Errors
    /// Returns the serializer error; only possible for non-string map keys.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a history entry written by [`NavState::to_json`].
    #[must_use]
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// How a successful load touches browser history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryMode {
    /// Add a new entry.
    Push,
    /// Overwrite the current entry.
    Replace,
    /// Leave history alone (back/forward, reload after an action).
    Skip,
}

/// Writable browser history.
pub trait HistoryPort {
    /// Append an entry.
    fn push(&mut self, state: &NavState, url: &str);
    /// Overwrite the current entry.
    fn replace(&mut self, state: &NavState, url: &str);
}

/// Result of fetching a partial or posting an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx response with its HTML body.
    Html(String),
    /// Non-2xx response.
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// Request never produced a response.
    Network(String),
}

/// What the content region should display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentView {
    /// Request in flight.
    Loading,
    /// Server HTML to inject as-is.
    Partial(String),
    /// Inline error line rendered as text.
    Error(String),
}

/// A load that has been accepted by the router and awaits its response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    id: u64,
    /// Target route.
    pub route: DashRoute,
    /// Query parameters sent with the request and written to history.
    pub params: QueryParams,
    /// History behaviour on success.
    pub mode: HistoryMode,
}

impl LoadTicket {
    /// Partial endpoint with query string.
    #[must_use]
    pub fn partial_url(&self) -> String {
        with_query(&self.route.partial_path(), &self.params)
    }

    /// Address-bar URL with query string.
    #[must_use]
    pub fn pretty_url(&self) -> String {
        with_query(&self.route.pretty_path(), &self.params)
    }
}

/// Collect parameters, dropping empty values.
#[must_use]
pub fn clean_params<K, V, I>(pairs: I) -> QueryParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .filter(|(_, v)| !v.is_empty())
        .collect()
}

/// Parse a `?a=1&b=2` query string into parameters.
#[must_use]
pub fn parse_query(raw: &str) -> QueryParams {
    clean_params(
        raw.trim_start_matches('?')
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key), decode_component(value))
            }),
    )
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or(spaced.clone(), |decoded| decoded.into_owned())
}

/// Append non-empty parameters to a path.
#[must_use]
pub fn with_query(path: &str, params: &QueryParams) -> String {
    let query = params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

/// Content shown after a failed form action (e.g. 2FA enable).
///
/// The server's error page wins when it sent one.
#[must_use]
pub fn action_failure_view(code: u16, body: String) -> ContentView {
    if body.trim().is_empty() {
        ContentView::Error(format!("Action failed ({code})."))
    } else {
        ContentView::Partial(body)
    }
}

/// Next step after a form action answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Action accepted; reload the route in place.
    Reload,
    /// Action refused; show this in the content region.
    Show(ContentView),
}

/// Dashboard router over an injectable history.
#[derive(Debug)]
pub struct DashboardRouter<H> {
    history: H,
    current: Option<NavState>,
    latest: u64,
}

impl<H: HistoryPort> DashboardRouter<H> {
    /// Create a router with no route loaded.
    pub const fn new(history: H) -> Self {
        Self {
            history,
            current: None,
            latest: 0,
        }
    }

    /// Accept a navigation request.
    ///
    /// Every request supersedes earlier tickets, including one that fails to resolve.
    ///
    /// # Errors
    /// Returns [`RouteError::Unknown`] without touching history when the name is not routable.
    pub fn begin(
        &mut self,
        name: &str,
        params: QueryParams,
        mode: HistoryMode,
    ) -> Result<LoadTicket, RouteError> {
        let id = self.next_id();
        Ok(LoadTicket {
            id,
            route: DashRoute::from_name(name)?,
            params: clean_params(params),
            mode,
        })
    }

    /// Accept a form action posted from `route`; it supersedes pending loads.
    pub fn begin_action(&mut self, route: DashRoute) -> LoadTicket {
        LoadTicket {
            id: self.next_id(),
            route,
            params: QueryParams::new(),
            mode: HistoryMode::Skip,
        }
    }

    /// Apply a form action response. Returns `None` when a navigation started meanwhile.
    #[must_use]
    pub fn finish_action(
        &self,
        ticket: &LoadTicket,
        outcome: FetchOutcome,
    ) -> Option<ActionOutcome> {
        if !self.is_current(ticket) {
            return None;
        }
        Some(match outcome {
            FetchOutcome::Html(_) => ActionOutcome::Reload,
            FetchOutcome::Status { code, body } => {
                ActionOutcome::Show(action_failure_view(code, body))
            }
            FetchOutcome::Network(_) => ActionOutcome::Show(ContentView::Error(
                "Action failed (network error).".to_string(),
            )),
        })
    }

    fn next_id(&mut self) -> u64 {
        self.latest = self.latest.wrapping_add(1);
        self.latest
    }

    /// First load of the page, seeded into the current history entry.
    pub fn begin_initial(
        &mut self,
        path: &str,
        query: &str,
        hint: Option<&str>,
    ) -> LoadTicket {
        LoadTicket {
            id: self.next_id(),
            route: DashRoute::initial(path, hint),
            params: parse_query(query),
            mode: HistoryMode::Replace,
        }
    }

    /// Back/forward navigation to a previously written entry.
    ///
    /// Entries without a decodable state are ignored.
    ///
    /// # Errors
    /// Returns [`RouteError::Unknown`] when the stored route no longer exists.
    pub fn restore(&mut self, state: Option<NavState>) -> Result<Option<LoadTicket>, RouteError> {
        state
            .map(|state| self.begin(&state.route, state.params, HistoryMode::Skip))
            .transpose()
    }

    /// Whether a ticket is still the newest navigation.
    #[must_use]
    pub const fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.id == self.latest
    }

    /// Apply a response. Returns `None` when a newer navigation superseded this one.
    pub fn finish(&mut self, ticket: &LoadTicket, outcome: FetchOutcome) -> Option<ContentView> {
        if !self.is_current(ticket) {
            return None;
        }
        let view = match outcome {
            FetchOutcome::Html(html) => {
                let state = NavState {
                    route: ticket.route.name().to_string(),
                    params: ticket.params.clone(),
                };
                match ticket.mode {
                    HistoryMode::Push => self.history.push(&state, &ticket.pretty_url()),
                    HistoryMode::Replace => self.history.replace(&state, &ticket.pretty_url()),
                    HistoryMode::Skip => {}
                }
                self.current = Some(state);
                ContentView::Partial(html)
            }
            FetchOutcome::Status { code, .. } => {
                ContentView::Error(format!("Failed to load ({code})."))
            }
            FetchOutcome::Network(_) => {
                ContentView::Error("Failed to load (network error).".to_string())
            }
        };
        Some(view)
    }

    /// Most recently loaded route and parameters.
    #[must_use]
    pub const fn current(&self) -> Option<&NavState> {
        self.current.as_ref()
    }

    /// Underlying history port.
    #[must_use]
    pub const fn history(&self) -> &H {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct MemoryHistory {
        entries: Vec<(NavState, String)>,
        index: usize,
    }

    impl MemoryHistory {
        fn back(&mut self) -> Option<NavState> {
            self.index = self.index.checked_sub(1)?;
            self.entries.get(self.index).map(|(state, _)| state.clone())
        }
    }

    impl HistoryPort for MemoryHistory {
        fn push(&mut self, state: &NavState, url: &str) {
            if !self.entries.is_empty() {
                self.entries.truncate(self.index + 1);
            }
            self.entries.push((state.clone(), url.to_string()));
            self.index = self.entries.len() - 1;
        }

        fn replace(&mut self, state: &NavState, url: &str) {
            if let Some(slot) = self.entries.get_mut(self.index) {
                *slot = (state.clone(), url.to_string());
            } else {
                self.push(state, url);
            }
        }
    }

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        clean_params(pairs.iter().copied())
    }

    fn load(router: &mut DashboardRouter<MemoryHistory>, name: &str, p: QueryParams) {
        let ticket = router.begin(name, p, HistoryMode::Push).unwrap();
        router.finish(&ticket, FetchOutcome::Html("<p>ok</p>".into()));
    }

    #[test]
    fn back_restores_route_and_params_without_new_entries() {
        let mut router = DashboardRouter::new(MemoryHistory::default());
        let initial = router.begin_initial("/dashboard/", "", None);
        router.finish(&initial, FetchOutcome::Html(String::new()));
        load(&mut router, "files", params(&[("q", "cats")]));
        load(&mut router, "sections", QueryParams::new());
        assert_eq!(router.history().entries.len(), 3);

        let state = router.history.back();
        let ticket = router.restore(state).unwrap().unwrap();
        assert_eq!(ticket.route, DashRoute::Files);
        assert_eq!(ticket.params, params(&[("q", "cats")]));
        assert_eq!(ticket.mode, HistoryMode::Skip);

        let view = router.finish(&ticket, FetchOutcome::Html("<p>files</p>".into()));
        assert_eq!(view, Some(ContentView::Partial("<p>files</p>".into())));
        assert_eq!(router.history().entries.len(), 3);
        assert_eq!(router.history().index, 1);
        assert_eq!(
            router.current(),
            Some(&NavState {
                route: "files".into(),
                params: params(&[("q", "cats")]),
            })
        );
    }

    #[test]
    fn unknown_route_is_rejected_before_history() {
        let mut router = DashboardRouter::new(MemoryHistory::default());
        let err = router
            .begin("billing", QueryParams::new(), HistoryMode::Push)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown route: billing");
        assert!(router.history().entries.is_empty());
        assert!(router.current().is_none());
    }

    #[test]
    fn failures_render_inline_and_leave_history() {
        let mut router = DashboardRouter::new(MemoryHistory::default());
        let ticket = router
            .begin("stats", QueryParams::new(), HistoryMode::Push)
            .unwrap();
        let view = router.finish(
            &ticket,
            FetchOutcome::Status {
                code: 503,
                body: String::new(),
            },
        );
        assert_eq!(
            view,
            Some(ContentView::Error("Failed to load (503).".into()))
        );
        assert!(router.history().entries.is_empty());
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut router = DashboardRouter::new(MemoryHistory::default());
        let first = router
            .begin("stats", QueryParams::new(), HistoryMode::Push)
            .unwrap();
        let second = router
            .begin("files", QueryParams::new(), HistoryMode::Push)
            .unwrap();
        assert!(router.finish(&first, FetchOutcome::Html("old".into())).is_none());
        assert!(router.finish(&second, FetchOutcome::Html("new".into())).is_some());
        assert_eq!(router.history().entries.len(), 1);
        assert_eq!(router.history().entries[0].1, "/dashboard/files/");
    }

    #[test]
    fn unknown_route_supersedes_pending_load() {
        let mut router = DashboardRouter::new(MemoryHistory::default());
        let pending = router
            .begin("files", QueryParams::new(), HistoryMode::Push)
            .unwrap();
        assert!(
            router
                .begin("billing", QueryParams::new(), HistoryMode::Push)
                .is_err()
        );
        assert!(!router.is_current(&pending));
        assert!(router.finish(&pending, FetchOutcome::Html("files".into())).is_none());
        assert!(router.history().entries.is_empty());
        assert!(router.current().is_none());
    }

    #[test]
    fn action_response_after_navigation_is_dropped() {
        let mut router = DashboardRouter::new(MemoryHistory::default());
        let action = router.begin_action(DashRoute::TwoFa);
        router
            .begin("stats", QueryParams::new(), HistoryMode::Push)
            .unwrap();
        let refused = FetchOutcome::Status {
            code: 400,
            body: "<form>bad code</form>".into(),
        };
        assert!(router.finish_action(&action, refused).is_none());
    }

    #[test]
    fn action_outcomes_reload_or_show_failure() {
        let mut router = DashboardRouter::new(MemoryHistory::default());
        let action = router.begin_action(DashRoute::TwoFa);
        assert_eq!(action.mode, HistoryMode::Skip);
        assert_eq!(
            router.finish_action(&action, FetchOutcome::Html(String::new())),
            Some(ActionOutcome::Reload)
        );
        assert_eq!(
            router.finish_action(
                &action,
                FetchOutcome::Status {
                    code: 403,
                    body: String::new(),
                }
            ),
            Some(ActionOutcome::Show(ContentView::Error("Action failed (403).".into())))
        );
        assert_eq!(
            router.finish_action(&action, FetchOutcome::Network("offline".into())),
            Some(ActionOutcome::Show(ContentView::Error(
                "Action failed (network error).".into()
            )))
        );
        assert!(router.history().entries.is_empty());
    }

    #[test]
    fn initial_load_replaces_and_keeps_query() {
        let mut router = DashboardRouter::new(MemoryHistory::default());
        let ticket = router.begin_initial("/dashboard/stats/", "?start=2024-01-01&end=", Some("files"));
        assert_eq!(ticket.route, DashRoute::Stats);
        assert_eq!(ticket.mode, HistoryMode::Replace);
        assert_eq!(ticket.partial_url(), "/dashboard/partials/stats/?start=2024-01-01");
        router.finish(&ticket, FetchOutcome::Html(String::new()));
        router.finish(&ticket, FetchOutcome::Html(String::new()));
        assert_eq!(router.history().entries.len(), 1);
    }

    #[test]
    fn popstate_without_state_is_ignored() {
        let mut router = DashboardRouter::new(MemoryHistory::default());
        assert_eq!(router.restore(None), Ok(None));
    }

    #[test]
    fn urls_encode_and_skip_empty_values() {
        let p = params(&[("q", "red fox&co"), ("page", "")]);
        assert_eq!(with_query("/dashboard/files/", &p), "/dashboard/files/?q=red%20fox%26co");
        assert_eq!(with_query("/x/", &QueryParams::new()), "/x/");
        assert_eq!(parse_query("?q=red+fox%26co&empty=&flag"), params(&[("q", "red fox&co")]));
    }

    #[test]
    fn nav_state_json_round_trips_and_tolerates_missing_params() {
        let state = NavState {
            route: "files".into(),
            params: params(&[("q", "a")]),
        };
        let json = state.to_json().unwrap();
        assert_eq!(json, r#"{"route":"files","params":{"q":"a"}}"#);
        assert_eq!(NavState::from_json(&json), Some(state));
        assert_eq!(
            NavState::from_json(r#"{"route":"stats"}"#).map(|s| s.params.len()),
            Some(0)
        );
        assert!(NavState::from_json("null").is_none());
    }

    #[test]
    fn action_failures_prefer_server_html() {
        assert_eq!(
            action_failure_view(400, "<form>bad code</form>".into()),
            ContentView::Partial("<form>bad code</form>".into())
        );
        assert_eq!(
            action_failure_view(500, "  ".into()),
            ContentView::Error("Action failed (500).".into())
        );
    }
}
