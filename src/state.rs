//! シェルの実行状態を保持するモジュール。
//!
//! コマンド履歴・ジョブテーブル・プロンプト・継続フラグを 1 つの [`ShellState`] にまとめる。
//! 履歴とジョブはメモリ内のみで、プロセス終了とともに破棄される。
//! 状態は制御ループが起動時に 1 つだけ構築して所有し、
//! ビルトインへは可変参照で渡される（アンビエントなグローバルは持たない）。

use crate::command::Command;
use crate::job;

/// 既定のプロンプト文字列。
const DEFAULT_PROMPT: &str = ">> ";

/// シェルの実行状態。REPL ループ全体で共有される。
pub struct ShellState {
    /// 記録済みコマンドの履歴（古い順）。`Command::number` で 1 始まりに番号付けされる。
    pub history: Vec<Command>,
    /// バックグラウンドで実行中とみなしているコマンド。[`reconcile_jobs`](Self::reconcile_jobs) が刈り取る。
    pub jobs: Vec<Command>,
    /// プロンプト文字列。既定は `">> "`、起動時に `MINISH_PROMPT` で上書きできる。
    pub prompt: String,
    /// `exit` または EOF で `false` になり、外側のループを終了させる。
    pub running: bool,
    /// 次に記録するコマンドへ割り当てる番号。1 から単調増加。
    next_number: usize,
}

impl ShellState {
    pub fn new() -> Self {
        let prompt =
            std::env::var("MINISH_PROMPT").unwrap_or_else(|_| DEFAULT_PROMPT.to_string());
        Self {
            history: Vec::new(),
            jobs: Vec::new(),
            prompt,
            running: true,
            next_number: 1,
        }
    }

    /// コマンドに次の番号を割り当てて履歴に記録し、その番号を返す。
    ///
    /// バックグラウンドコマンドは同じ内容でジョブテーブルにも登録される。
    /// 失敗しない。
    pub fn record(&mut self, cmd: &mut Command) -> usize {
        cmd.number = self.next_number;
        self.next_number += 1;
        self.history.push(cmd.clone());

        if cmd.background {
            self.jobs.push(cmd.clone());
        }

        cmd.number
    }

    /// ジョブテーブルを現状と照合する。
    ///
    /// 各ジョブの PID を非ブロッキングで確認し、終了が判明したものを取り除く。
    /// 実行中のジョブは元の相対順序のまま残る。子プロセスが遅くても
    /// 呼び出し側をブロックしない（待機ではなくポーリング）。
    pub fn reconcile_jobs(&mut self) {
        self.jobs.retain(|cmd| job::still_running(cmd.pid));
    }

    /// 1 始まりの履歴参照。範囲外は `None`。
    pub fn history_at(&self, n: usize) -> Option<&Command> {
        if n >= 1 {
            self.history.get(n - 1)
        } else {
            None
        }
    }

    /// 1 始まりのジョブ参照。範囲外は `None`。
    pub fn job_at(&self, n: usize) -> Option<&Command> {
        if n >= 1 {
            self.jobs.get(n - 1)
        } else {
            None
        }
    }
}
