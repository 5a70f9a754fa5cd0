//! Ports - 抽象化レイヤー
//!
//! 各 trait は外部の協調者（ストレージ、アップローダー、通知チャネルなど）への
//! インターフェースです。Processor はこれらにのみ依存し、実装は `impls` か
//! 呼び出し側が注入します。

pub mod artifact_source;
pub mod clock;
pub mod connectivity;
pub mod id_generator;
pub mod notification;
pub mod record_store;
pub mod uploader;

pub use self::artifact_source::{ArtifactSource, SourceError};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::connectivity::ConnectivityOracle;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notification::{ChannelError, Contact, ContactDirectory, NotificationChannel};
pub use self::record_store::{RecordStore, StoreError};
pub use self::uploader::{CloudUploader, UploadError, UploadMetadata};
