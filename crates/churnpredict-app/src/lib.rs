// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod error;
pub mod form;
pub mod interpret;
pub mod model;
pub mod normalize;
pub mod schema;
pub mod state;

pub use error::*;
pub use form::*;
pub use interpret::*;
pub use model::*;
pub use normalize::*;
pub use state::*;
