pub mod item;
pub mod node;
pub mod seen_set;

pub use item::Item;
pub use node::PostNode;
pub use seen_set::SeenSet;
