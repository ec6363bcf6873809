//! Card content and its detached, fully resolved render tree.

pub mod layout;
pub mod model;
pub mod text;
pub mod tree;

pub(crate) mod hat;

pub use layout::build_card_tree;
pub use model::{CardData, Photo};
pub use text::FontBook;
pub use tree::{CardNode, CardTree};
