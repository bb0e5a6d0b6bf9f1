pub use transport::*;

mod transport;
