//! コマンドモデル: パース済みの入力 1 行を表す値型。
//!
//! 1 つの [`Command`] はパイプラインのステージ列（各ステージは引数リスト）、
//! バックグラウンドフラグ、出力リダイレクト先、追跡中のプロセス ID を持つ。
//! 構築後は [`ShellState::record`](crate::state::ShellState::record) による番号付けと
//! [`reset_pid`](Command::reset_pid) 以外では変更されない。

use std::fmt;

use libc::pid_t;

/// 「追跡中のプロセスなし」を表す番兵値。
pub const NO_PID: pid_t = -1;

/// パース済みコマンド 1 件。
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// 履歴内の番号。[`ShellState::record`](crate::state::ShellState::record) が割り当てる（1 始まり）。
    pub number: usize,
    /// ステージごとの引数リスト。`stages[i][0]` がプログラム名。パイプなしなら 1 要素。
    pub stages: Vec<Vec<String>>,
    /// 末尾に `&` が指定された場合に `true`。シェルは完了を待たない。
    pub background: bool,
    /// `>` の指定があれば最終ステージの stdout の書き込み先ファイル名。
    pub redirect: Option<String>,
    /// 最後に関連づけられたプロセス ID。未追跡なら [`NO_PID`]。
    pub pid: pid_t,
}

impl Command {
    pub fn new(stages: Vec<Vec<String>>, background: bool, redirect: Option<String>) -> Self {
        Self {
            number: 0,
            stages,
            background,
            redirect,
            pid: NO_PID,
        }
    }

    /// PID を番兵値に戻す。履歴からの再生時に呼ばれ、再生を新規起動として扱わせる。
    pub fn reset_pid(&mut self) {
        self.pid = NO_PID;
    }

    /// 実引数がひとつもない場合に `true`。
    /// 全ステージの引数を連結した結果が空であることと同値（ステージ 0 件を含む）。
    pub fn is_empty(&self) -> bool {
        self.stages.iter().flatten().all(|arg| arg.is_empty())
    }

    /// ステージが 2 つ以上あるか。
    pub fn has_pipeline(&self) -> bool {
        self.stages.len() > 1
    }

    /// 出力リダイレクトの指定があるか。
    pub fn has_redirect(&self) -> bool {
        self.redirect.is_some()
    }
}

/// コマンド構造の一覧表示。ディスパッチ直後・待機前に制御ループが出力するほか、
/// `history` / `jobs` ビルトインの一覧にも使われる。
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<Command #\t: {}", self.number)?;
        for (i, stage) in self.stages.iter().enumerate() {
            writeln!(f, " Arguments {}\t: {}", i + 1, stage.join(" "))?;
        }
        writeln!(f, " Background\t: {}", self.background)?;
        writeln!(f, " Piped\t\t: {}", self.has_pipeline())?;
        writeln!(
            f,
            " Output redir\t: {}, to '{}'",
            self.has_redirect(),
            self.redirect.as_deref().unwrap_or(""),
        )?;
        write!(f, " Last known PID\t: {}>", self.pid)
    }
}
