//! Secret-notes partial: tab and viewer modal model.

/// Tabs on the secret-notes partial, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteTab {
    /// Notes that have not been read yet.
    Active,
    /// Read notes kept for the retention window.
    Retention,
    /// Notes flagged by moderation.
    Flagged,
}

impl NoteTab {
    /// All tabs in display order.
    pub const ALL: [Self; 3] = [Self::Active, Self::Retention, Self::Flagged];

    const fn key(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Retention => "retention",
            Self::Flagged => "flagged",
        }
    }

    /// DOM id of the tab button.
    #[must_use]
    pub fn button_id(self) -> String {
        format!("tab-{}-btn", self.key())
    }

    /// DOM id of the tab pane.
    #[must_use]
    pub fn pane_id(self) -> String {
        format!("tab-{}", self.key())
    }

    /// Tab owning a pane id, if any.
    #[must_use]
    pub fn from_pane_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.pane_id() == id)
    }
}

/// Flags for one tab after selecting `selected`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TabFlags {
    /// Tab the flags apply to.
    pub tab: NoteTab,
    /// Whether the `is-active` class is set on button and pane.
    pub active: bool,
}

impl TabFlags {
    /// Value for the button's `aria-selected` attribute.
    #[must_use]
    pub const fn aria_selected(self) -> &'static str {
        if self.active { "true" } else { "false" }
    }
}

/// Compute tab flags for the tabs present in the partial.
#[must_use]
pub fn select_tab(present: &[NoteTab], selected: NoteTab) -> Vec<TabFlags> {
    present
        .iter()
        .map(|&tab| TabFlags {
            tab,
            active: tab == selected,
        })
        .collect()
}

/// Content shown in the retention modal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteModal {
    /// Note identifier, shown in the header.
    pub note_id: String,
    /// Decrypted note text, placed in the copyable textarea.
    pub plaintext: String,
}

/// Label of the copy button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyLabel {
    /// Resting state.
    Copy,
    /// Shown briefly after a successful copy.
    Copied,
}

impl CopyLabel {
    /// Font Awesome icon class list.
    #[must_use]
    pub const fn icon_class(self) -> &'static str {
        match self {
            Self::Copy => "fa-regular fa-copy",
            Self::Copied => "fa-solid fa-check",
        }
    }

    /// Visible text following the icon.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Copy => " Copy",
            Self::Copied => " Copied",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_ids_follow_partial_markup() {
        assert_eq!(NoteTab::Retention.button_id(), "tab-retention-btn");
        assert_eq!(NoteTab::Flagged.pane_id(), "tab-flagged");
        assert_eq!(NoteTab::from_pane_id("tab-active"), Some(NoteTab::Active));
        assert_eq!(NoteTab::from_pane_id("tab-archive"), None);
    }

    #[test]
    fn exactly_one_present_tab_is_active() {
        let flags = select_tab(&[NoteTab::Active, NoteTab::Flagged], NoteTab::Flagged);
        assert_eq!(flags.len(), 2);
        assert!(!flags[0].active);
        assert_eq!(flags[0].aria_selected(), "false");
        assert!(flags[1].active);
        assert_eq!(flags[1].aria_selected(), "true");
    }

    #[test]
    fn copy_label_swaps_icon_and_text() {
        assert_eq!(CopyLabel::Copied.icon_class(), "fa-solid fa-check");
        assert_eq!(CopyLabel::Copy.text(), " Copy");
    }
}
