// Copyright 2021 Dmitry Tantsur <dtantsur@protonmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! OCCI client with Keystone authentication fallback.
//!
//! The [Client](struct.Client.html) talks to one OCCI endpoint: it authenticates, downloads the
//! server's category model and lists, describes, creates, deletes and triggers actions on
//! entities. Requests are rendered as `text/plain` or `text/occi`.
//!
//! When the server rejects the configured authentication with a Keystone challenge, the
//! client obtains a tenant-scoped token from Keystone and retries with it.
//!
//! Clients can be created directly, from `OCCI_*` environment variables with
//! [from_env](fn.from_env.html) or from a `occi.yaml` file with
//! [from_config](fn.from_config.html). A blocking wrapper is available in the
//! [sync](sync/index.html) module.

#![crate_name = "occi_client"]
#![crate_type = "lib"]
// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
// Taken from https://github.com/rust-unofficial/patterns/
#![deny(
    dead_code,
    improper_ctypes,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_doc_comments,
    unused_import_braces,
    unused_parens,
    unused_qualifications,
    unused_results,
    while_true
)]
#![allow(unused_extern_crates)]
#![allow(
    clippy::new_ret_no_self,
    clippy::should_implement_trait,
    clippy::wrong_self_convention
)]

pub mod auth;
mod builder;
pub mod category;
mod client;
pub mod connection;
pub mod entity;
mod error;
pub mod infrastructure;
pub mod loading;
pub mod model;
pub mod render;
#[cfg(feature = "sync")]
pub mod sync;
pub mod tls;
pub mod transport;
mod url;
mod utils;

pub use crate::auth::Authentication;
pub use crate::builder::EntityBuilder;
pub use crate::client::Client;
pub use crate::entity::{ActionInstance, Entity};
pub use crate::error::{Error, ErrorKind};
pub use crate::loading::{from_config, from_env, CloudConfig};
pub use crate::model::Model;
pub use crate::render::MediaType;
