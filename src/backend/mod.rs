//! Radio driver abstraction layer

pub mod mock_radio;
pub mod radio_driver;
pub mod socket_radio;

pub use {mock_radio::MockRadio, radio_driver::RadioDriver, socket_radio::SocketRadio};
