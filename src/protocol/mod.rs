//! Radio bridge protocol message definitions

pub mod jsonrpc;
pub mod notification;
pub mod request;
pub mod response;

pub use {
    jsonrpc::{
        JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
        RequestId,
    },
    notification::Notification,
    request::Request,
    response::{AckResponse, ReservedDataResponse, Response},
};
