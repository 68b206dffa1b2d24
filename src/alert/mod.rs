pub mod render;
pub mod severity;

pub use render::{html_escape, AlertRenderer, RenderedAlert};
pub use severity::{severity_color, severity_name};
