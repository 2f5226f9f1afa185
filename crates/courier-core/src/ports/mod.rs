//! Ports - 抽象化レイヤー
//!
//! 外部システム（キュー、Blob ストレージ）と時刻・ID 生成への
//! インターフェースを定義し、実装の詳細を隠蔽します。

pub mod blob_store;
pub mod clock;
pub mod delivery_queue;
pub mod id_generator;

pub use self::blob_store::BlobStore;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::delivery_queue::{DeliveryQueue, ReceiveRequest};
pub use self::id_generator::{IdGenerator, UlidGenerator};
