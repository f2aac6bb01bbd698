use thiserror::Error;

use crate::sys::backing::HostId;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("host {0:?} is already registered")]
    AlreadyRegistered(HostId),
    #[error("backing window {0:?} is already closed")]
    BackingClosed(HostId),
}
