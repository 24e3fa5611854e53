//! procflow のコアライブラリ
//!
//! プロセススーパーバイザー向け設定（ecosystem）の型付きモデル、
//! KDL / JSON / YAML の読み書き、検証、再起動判定、デプロイレシピの組み立てを提供する。

pub mod emitter;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod loader;
pub mod model;
pub mod parser;
pub mod recipe;
pub mod validate;

pub use emitter::to_kdl_string;
pub use error::{FlowError, Result};
pub use format::{Format, parse_str, to_string};
pub use lifecycle::{RestartDecision, RestartTracker, TrackerState};
pub use loader::{load_ecosystem, save_ecosystem};
pub use model::*;
pub use parser::{parse_kdl_file, parse_kdl_string};
pub use recipe::{DeployPhase, DeployPlan, HostPlan, Step, shell_escape};
pub use validate::{Issue, Severity, ValidationReport, validate};
