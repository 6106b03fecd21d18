pub mod board;
pub mod chart;
pub mod color;
pub mod generation;
pub mod project;
pub mod wiki;

pub use board::BoardViewModel;
pub use chart::ChartSlice;
pub use generation::{Generation, Ticket};
pub use project::{Content, FieldValue, ProjectItem, ProjectSnapshot};
pub use wiki::WikiNavigator;
