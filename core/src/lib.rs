//! Client core for the todo service.
//!
//! # Overview
//! Keeps a cached copy of the user's todos in sync with a remote REST
//! service and derives the filtered view a front-end renders.
//!
//! # Design
//! - `TodoClient` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`, so the I/O boundary is explicit.
//! - A `Transport` performs the round-trip; `ReqwestTransport` is the real one.
//! - `TodoGateway` maps each exchange to an operation-level `TodoError`.
//! - `TodoViewModel` owns list, filter, edit selection and request progress,
//!   and always reloads from the server after a successful mutation.
//! - `AuthContext` persists the session through an injectable `SessionStore`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod http;
pub mod session;
pub mod types;
pub mod view_model;

pub use auth::{AuthContext, AuthState};
pub use client::TodoClient;
pub use config::Config;
pub use error::{ApiError, AuthError, ConfigError, SessionError, TodoError};
pub use filter::{visible_todos, Filter};
pub use gateway::{TodoApi, TodoGateway};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::{
    AuthResponse, CreateTodo, LoginCredentials, RegisterCredentials, Todo, TodoId, UpdateTodo, User,
};
pub use view_model::{MutationError, MutationKind, OpStatus, RowActivity, TodoViewModel, ViewState};
