//! Dashboard route table.
//!
//! # Design
//! - The set of routes is closed; anything else is rejected before any request is made.
//! - Each route owns its partial endpoint, its display URL, and the search form it re-binds.

use crate::core::error::RouteError;

/// Routes served by the dashboard shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DashRoute {
    /// Usage statistics with a date range filter.
    Stats,
    /// Uploaded sections (albums).
    Sections,
    /// Individual stored files.
    Files,
    /// Secret notes with retention and flagged tabs.
    SecretNotes,
    /// Two-factor authentication settings.
    TwoFa,
}

/// Search-style form that re-navigates the current route with its field values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryForm {
    /// DOM id of the form element inside the partial.
    pub form_id: &'static str,
    /// Form fields copied into the query string, in order.
    pub fields: &'static [&'static str],
}

impl DashRoute {
    /// All routes in sidebar order.
    pub const ALL: [Self; 5] = [
        Self::Stats,
        Self::Sections,
        Self::Files,
        Self::SecretNotes,
        Self::TwoFa,
    ];

    /// Stable route name used in `data-route` attributes and history state.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Sections => "sections",
            Self::Files => "files",
            Self::SecretNotes => "secret_notes",
            Self::TwoFa => "twofa",
        }
    }

    const fn slug(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Sections => "sections",
            Self::Files => "files",
            Self::SecretNotes => "secret-notes",
            Self::TwoFa => "2fa",
        }
    }

    /// Resolve a route from its name.
    ///
    /// # Errors
    /// Returns [`RouteError::Unknown`] for names outside the route table.
    pub fn from_name(name: &str) -> Result<Self, RouteError> {
        Self::ALL
            .into_iter()
            .find(|route| route.name() == name)
            .ok_or_else(|| RouteError::Unknown(name.to_string()))
    }

    /// Path of the server-rendered partial for this route.
    #[must_use]
    pub fn partial_path(self) -> String {
        format!("/dashboard/partials/{}/", self.slug())
    }

    /// Path shown in the address bar for this route.
    #[must_use]
    pub fn pretty_path(self) -> String {
        format!("/dashboard/{}/", self.slug())
    }

    /// Form that filters this route, if the partial carries one.
    #[must_use]
    pub const fn query_form(self) -> Option<QueryForm> {
        match self {
            Self::Stats => Some(QueryForm {
                form_id: "statsRangeForm",
                fields: &["start", "end"],
            }),
            Self::Sections => Some(QueryForm {
                form_id: "sectionsSearchForm",
                fields: &["q"],
            }),
            Self::Files => Some(QueryForm {
                form_id: "filesSearchForm",
                fields: &["q"],
            }),
            Self::SecretNotes => Some(QueryForm {
                form_id: "notesSearchForm",
                fields: &["q"],
            }),
            Self::TwoFa => None,
        }
    }

    /// Pick the route to load first from the current path.
    ///
    /// Falls back to the shell's `data-initial-route` hint, then to [`DashRoute::Stats`].
    #[must_use]
    pub fn initial(path: &str, hint: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|route| path.contains(&route.pretty_path()))
            .or_else(|| hint.and_then(|name| Self::from_name(name.trim()).ok()))
            .unwrap_or(Self::Stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup() {
        for route in DashRoute::ALL {
            assert_eq!(DashRoute::from_name(route.name()), Ok(route));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            DashRoute::from_name("billing"),
            Err(RouteError::Unknown("billing".into()))
        );
        assert!(DashRoute::from_name("secret-notes").is_err());
    }

    #[test]
    fn paths_use_hyphenated_slugs() {
        assert_eq!(
            DashRoute::SecretNotes.partial_path(),
            "/dashboard/partials/secret-notes/"
        );
        assert_eq!(DashRoute::TwoFa.partial_path(), "/dashboard/partials/2fa/");
        assert_eq!(DashRoute::TwoFa.pretty_path(), "/dashboard/2fa/");
        assert_eq!(DashRoute::Stats.pretty_path(), "/dashboard/stats/");
    }

    #[test]
    fn initial_route_prefers_path_then_hint() {
        assert_eq!(
            DashRoute::initial("/dashboard/files/", Some("sections")),
            DashRoute::Files
        );
        assert_eq!(
            DashRoute::initial("/en/dashboard/secret-notes/", None),
            DashRoute::SecretNotes
        );
        assert_eq!(
            DashRoute::initial("/dashboard/", Some("twofa")),
            DashRoute::TwoFa
        );
        assert_eq!(
            DashRoute::initial("/dashboard/", Some("nope")),
            DashRoute::Stats
        );
        assert_eq!(DashRoute::initial("/", None), DashRoute::Stats);
    }

    #[test]
    fn only_twofa_lacks_a_query_form() {
        assert_eq!(
            DashRoute::Stats.query_form().map(|f| f.fields),
            Some(&["start", "end"][..])
        );
        assert!(DashRoute::TwoFa.query_form().is_none());
    }
}
