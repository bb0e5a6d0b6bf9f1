pub use event::*;
pub use interface::*;
pub use params::*;
pub use record::*;

mod event;
mod interface;
mod params;
mod record;
