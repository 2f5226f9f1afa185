//! Model trait - デコード先の型
//!
//! # Trait Bounds
//! - `DeserializeOwned`: body / blob の JSON から復元するため
//! - `Send + Sync`: 並行 drain と handler から参照されるため
//! - `'static`: Arc に格納できるため

use serde::de::DeserializeOwned;

/// Target type a message is decoded into.
///
/// Implemented for every `DeserializeOwned + Send + Sync + 'static` type, so
/// a plain `#[derive(Deserialize)]` struct is enough.
pub trait Model: DeserializeOwned + Send + Sync + 'static {}

impl<T> Model for T where T: DeserializeOwned + Send + Sync + 'static {}
