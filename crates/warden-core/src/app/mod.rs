//! App - アプリケーション層
//!
//! ports を組み合わせて queue の振る舞いを実装します。
//!
//! # 主要コンポーネント
//! - **ProcessorBuilder**: Processor の構築とワイヤリング
//! - **Processor**: 1 pass の処理と手動操作（retry / cancel / clear）
//! - **NotificationFanout**: アップロード完了の通知
//! - **Scheduler**: 定期実行と即時 wake

pub mod builder;
pub mod notify;
pub mod processor;
pub mod scheduler;
pub mod status;

pub use self::builder::{BuildError, ProcessorBuilder};
pub use self::notify::{NotificationFanout, NotificationReport, compose_message};
pub use self::processor::{AttemptOutcome, Processor};
pub use self::scheduler::{Scheduler, SchedulerHandle};
pub use self::status::{PassOutcome, PassReport, QueueCounts};
