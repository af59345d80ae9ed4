//! View module - viewport transform, selection and transitions

mod projection;
mod selection;
mod state;
mod transition;

pub use selection::{ScaleDomain, Selection};
pub use state::{ViewChange, ViewEvent, ViewSettings, ViewState};
pub use transition::{Transition, BAR_GROWTH, TOOLTIP_FADE_IN, TOOLTIP_FADE_OUT};
