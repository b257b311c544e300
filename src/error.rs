use crate::assistant::StageError;
use crate::config::ConfigError;
use crate::host::HostError;
use crate::llm::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- configuration errors --------------------------------------
    #[error(transparent)]
    Config(#[from] ConfigError),

    // --------------------------------- llm errors ------------------------------------------------
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Stage(#[from] StageError),

    // --------------------------------- debugger errors -------------------------------------------
    #[error("debugger error: {0}")]
    Host(#[from] HostError),
}

impl Error {
    /// Return a hint to an interface - continue the session after error or stop it.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Config(_) => false,
            Error::Transport(_) => false,
            Error::Stage(_) => false,
            Error::Host(e) => e.is_fatal(),
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "dbgchat", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "dbgchat", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
