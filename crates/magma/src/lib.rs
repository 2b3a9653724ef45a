//! Client filesystem binding: one function per POSIX verb, built on
//! `magma-net`'s routing/connection layer and `magma-wire`'s frame
//! codecs. Registering with a host's FUSE stack is out of scope here;
//! this crate hands a host adapter typed results it can translate to
//! whatever that host's filesystem API expects.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;

pub use config::MagmaConfig;
pub use context::{BootError, CallerContext, Context, OpenFileHandle};
pub use error::BindingError;
