//! Typed - 型付きデコード API
//!
//! - **Model**: デコード先の型（`DeserializeOwned` なら何でもよい）
//! - **PayloadDecoder**: 順序付きフォールバックで body / blob を Model にする
//! - **OutcomeHandler**: 結果ごとのフック（削除の veto が可能）

pub mod codec;
pub mod handler;
pub mod model;

pub use self::codec::PayloadDecoder;
pub use self::handler::{FnHandler, OutcomeHandler, handler_fn};
pub use self::model::Model;
