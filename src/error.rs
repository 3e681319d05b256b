//! Tagged error kinds shared by every module, plus the originating namespace.
//!
//! Lower layers fail fast with a precise kind; the facade re-wraps anything
//! unexpected as `Unhandled`.

use std::fmt;

/// Which subsystem raised the error. Carried alongside the error kind so a
/// caller can tell a capability mismatch at the facade from a codec failure
/// deep in a specific algorithm.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Namespace {
    Steganos,
    Lsb,
    RandomLsb,
    DwtDugad,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Namespace::Steganos => "Steganos",
            Namespace::Lsb => "LSB",
            Namespace::RandomLsb => "RandomLSB",
            Namespace::DwtDugad => "DWTDUGAD",
        };
        write!(f, "{}", s)
    }
}

/// Crate-wide error type, one variant per distinct failure kind callers
/// need to tell apart.
#[derive(thiserror::Error, Debug)]
pub enum StegError {
    #[error("[{namespace}] no plugin specified")]
    NoPluginSpecified { namespace: Namespace },

    #[error("[{namespace}] unhandled error: {message}")]
    Unhandled { namespace: Namespace, message: String },

    #[error("[{namespace}] algorithm does not support data hiding")]
    PluginDoesNotSupportDataHiding { namespace: Namespace },

    #[error("[{namespace}] algorithm does not support watermarking")]
    PluginDoesNotSupportWatermarking { namespace: Namespace },

    #[error("[{namespace}] a password is required to generate a signature")]
    PasswordMandatoryForGenSig { namespace: Namespace },

    #[error("[{namespace}] invalid password")]
    InvalidPassword { namespace: Namespace },

    #[error("[{namespace}] unrecognized cipher algorithm: {algorithm}")]
    InvalidCryptAlgo { namespace: Namespace, algorithm: String },

    #[error("[{namespace}] watermark embedding requires a cover image")]
    NoCoverFile { namespace: Namespace },

    #[error("[{namespace}] image too small: {message}")]
    FileTooSmall { namespace: Namespace, message: String },

    #[error("[{namespace}] signature is not valid: {message}")]
    SigNotValid { namespace: Namespace, message: String },

    #[error("[{namespace}] read fewer payload bytes than the header declared")]
    ImageDataRead { namespace: Namespace },

    #[error("[{namespace}] corrupt data: {message}")]
    CorruptData { namespace: Namespace, message: String },
}

impl StegError {
    pub fn namespace(&self) -> Namespace {
        match self {
            StegError::NoPluginSpecified { namespace }
            | StegError::Unhandled { namespace, .. }
            | StegError::PluginDoesNotSupportDataHiding { namespace }
            | StegError::PluginDoesNotSupportWatermarking { namespace }
            | StegError::PasswordMandatoryForGenSig { namespace }
            | StegError::InvalidPassword { namespace }
            | StegError::InvalidCryptAlgo { namespace, .. }
            | StegError::NoCoverFile { namespace }
            | StegError::FileTooSmall { namespace, .. }
            | StegError::SigNotValid { namespace, .. }
            | StegError::ImageDataRead { namespace }
            | StegError::CorruptData { namespace, .. } => *namespace,
        }
    }

    pub(crate) fn unhandled(namespace: Namespace, message: impl Into<String>) -> StegError {
        StegError::Unhandled { namespace, message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, StegError>;
