//! System event bus between the radio and its listeners

pub mod event_loop;
pub mod types;

pub use {
    event_loop::{EventDispatcher, EventHandler, EventLoop},
    types::{EventCategory, IpEvent, SmartConfigEvent, SystemEvent, WifiEvent},
};
