//! Category fan-out / fan-in.
//!
//! - [`dispatcher`]: `CategoryDispatcher`, `DispatchConfig`, `DispatchReport`
//! - [`error`]: `DispatchError`, `CategoryFailure`

pub mod dispatcher;
pub mod error;

pub use dispatcher::{
    CategoryCompletion, CategoryDispatcher, CategoryTask, DispatchConfig, DispatchReport,
};
pub use error::{CategoryFailure, DispatchError, DispatchResult};
