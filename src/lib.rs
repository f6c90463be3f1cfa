//! minish ライブラリ — テスト・ベンチマーク用にモジュールを公開する。
//!
//! バイナリ本体は `main.rs` の REPL ループ。
//! この `lib.rs` は `benches/bench_main.rs` 等の外部クレートから
//! パーサー・コマンドモデル・状態管理に直接アクセスするために存在する。
//!
//! ## モジュール構成
//!
//! | モジュール | 役割 |
//! |-----------|------|
//! | [`command`] | コマンドモデル（ステージ列、バックグラウンド、リダイレクト、PID 番兵） |
//! | [`state`] | シェルの実行状態（履歴、ジョブテーブル、プロンプト、継続フラグ） |
//! | [`parser`] | 構文解析（空白トークン、`&`、`>`、`|` のステージ分割） |
//! | [`builtins`] | ビルトイン（`history`, `jobs`, `!N`, `fg N`, `cd`, `pwd`, `exit`） |
//! | [`launcher`] | パイプラインランチャー（パイプ配線、ステージ fork、`execvp`） |
//! | [`job`] | 待機ヘルパー（対象 PID のブロッキング待機、`WNOHANG` 生存確認） |

pub mod builtins;
pub mod command;
pub mod job;
pub mod launcher;
pub mod parser;
pub mod state;
