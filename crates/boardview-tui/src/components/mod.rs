pub mod markdown;
pub mod progress_chart;
pub mod project_board;
pub mod wiki_view;
