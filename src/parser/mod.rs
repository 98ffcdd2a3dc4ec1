pub mod anchors;
pub mod ordinal;

pub use anchors::{base_path, AnchorPage};
pub use ordinal::Labeler;
