//! # Sluice
//!
//! Lazy, cancellation-aware sequence pipelines on tokio.
//!
//! A source emits values onto a bounded channel, transforms each consume one
//! channel and produce another, and a sink drains the last channel into a
//! result. Every stage runs as its own task.
//!
//! ## Features
//!
//! - **Backpressure**: every channel between two stages is bounded
//! - **One cancellation root per pipeline**: a sink finishing early, a
//!   deadline, a panicking callback or an external caller stops every
//!   upstream stage without deadlock or task leak
//! - **Typed composition**: each stage may change the element type and the
//!   chain is checked at compile time
//! - **Order-preserving parallel map**: [`map_par`] runs a pool of workers
//!   and restores input order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sluice::prelude::*;
//!
//! let ctx = Context::background();
//!
//! // Builder
//! let odd_squares = from_slice(&ctx, &[1, 2, 3, 4, 5])
//!     .then(filter(|n: &i32| n % 2 == 1))
//!     .then(map(|n: i32| n * n))
//!     .sink(to_vec::<i32>())
//!     .await?;
//! assert_eq!(odd_squares, vec![1, 9, 25]);
//!
//! // Fixed arity
//! let evens = pipe2(
//!     from_iter(&ctx, 0..100),
//!     filter(|n: &i32| n % 2 == 0),
//!     count::<i32>(),
//! )
//! .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod collections;
pub mod config;
pub mod context;
pub mod eager;
pub mod error;
pub mod observability;
pub mod pipe;
pub mod stages;
pub mod stream;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::context::{CancelHandle, CancelOnDrop, Context};
    pub use crate::error::{Error, Partial, Result, SinkResult};
    pub use crate::pipe::*;
    pub use crate::stages::*;
    pub use crate::stream::{Emitter, Stream};
}

pub use config::PipelineConfig;
pub use context::{CancelHandle, CancelOnDrop, Context};
pub use error::{Error, Partial, Result, SinkResult};
pub use pipe::{pipe1, pipe2, pipe3, pipe4, pipe5, pipe6, pipe7};
pub use stages::*;
pub use stream::{Emitter, Stream};
