mod category;
mod item;
mod metric;
mod option;
mod summary;

pub use category::*;
pub use item::*;
pub use metric::*;
pub use option::*;
pub use summary::*;
