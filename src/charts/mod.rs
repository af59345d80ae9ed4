//! Charts module - color scales, bar series and plotters renderers

mod bars;
mod card;
mod color;
mod map;

pub use bars::{country_bars, metric_color, BarSeries};
pub use card::{card_size, coordinates_label, CardRenderer};
pub use map::{Highlight, MapRenderer, MapScene, MapStyle, HIGHLIGHT_WIDTH};

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error("country not found in dataset: {0}")]
    UnknownCountry(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(err.to_string())
    }
}
