pub use transport::MockTransport;

mod transport;
