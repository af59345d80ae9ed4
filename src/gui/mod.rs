//! GUI module - User interface components

mod app;
mod control_panel;
mod country_popup;
mod map_view;

pub use app::AtlasApp;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use country_popup::{CountryPopup, PopupAction};
pub use map_view::MapView;
