//! courier-core
//!
//! Core building blocks for a queue consumer whose messages either carry
//! their payload inline or point at objects in a blob store.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, message, reference, resource, outcome, errors）
//! - **ports**: 抽象化レイヤー（DeliveryQueue, BlobStore, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, resolver, fetcher, processor, coordinator, poller）
//! - **typed**: 型付きデコード API（Model, PayloadDecoder, OutcomeHandler）
//! - **impls**: 実装（InMemoryDeliveryQueue など開発用）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod typed;
