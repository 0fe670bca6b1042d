use std::fmt;

use crate::shared::constants::FALLBACK_MESSAGE;

/// Named parts of the user interface toggled by the fallback path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UiRegion {
    Canvas,
    Links,
    FallbackMessage,
}

impl fmt::Display for UiRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UiRegion::Canvas => "canvas",
            UiRegion::Links => "links",
            UiRegion::FallbackMessage => "fallback message",
        };
        f.write_str(name)
    }
}

pub trait FallbackView {
    fn show(&mut self, region: UiRegion);
    fn hide(&mut self, region: UiRegion);
}

/// Switches the view into its fallback state.
pub fn apply_fallback(view: &mut dyn FallbackView) {
    view.hide(UiRegion::Canvas);
    view.hide(UiRegion::Links);
    view.show(UiRegion::FallbackMessage);
}

/// Terminal stand-in for the page: logs region changes and prints the
/// fallback message to stderr when it is shown.
#[derive(Default)]
pub struct LogFallbackView {
    hidden: Vec<UiRegion>,
    shown: Vec<UiRegion>,
}

impl LogFallbackView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hidden(&self, region: UiRegion) -> bool {
        self.hidden.contains(&region)
    }

    pub fn is_shown(&self, region: UiRegion) -> bool {
        self.shown.contains(&region)
    }
}

impl FallbackView for LogFallbackView {
    fn show(&mut self, region: UiRegion) {
        log::debug!("showing {region}");
        self.hidden.retain(|r| *r != region);
        if !self.shown.contains(&region) {
            self.shown.push(region);
        }
        if region == UiRegion::FallbackMessage {
            eprintln!("{FALLBACK_MESSAGE}");
        }
    }

    fn hide(&mut self, region: UiRegion) {
        log::debug!("hiding {region}");
        self.shown.retain(|r| *r != region);
        if !self.hidden.contains(&region) {
            self.hidden.push(region);
        }
    }
}
