//! Transport layer towards the radio bridge

pub mod unix_socket;
