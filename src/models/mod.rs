pub mod content;
pub mod search;
pub mod site;
pub mod trade;

pub use content::*;
pub use search::*;
pub use site::*;
pub use trade::*;
