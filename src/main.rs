//! minish — ジョブ制御付きの対話型コマンドインタープリタ
//!
//! REPL ループ: ジョブ照合 → プロンプト表示 → 1 行読み取り → ビルトイン判定 →
//! fork + 記録 + 待機（フォアグラウンド）またはジョブ登録（バックグラウンド）
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

mod builtins;
mod command;
mod job;
mod launcher;
mod parser;
mod state;

use std::io::{self, BufRead, Write};

use command::{Command, NO_PID};
use state::ShellState;

/// プロンプトを表示して 1 行読み取る。EOF なら `None`。
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) => None, // EOF (Ctrl+D)
        Ok(_) => Some(line),
        Err(e) => {
            eprintln!("minish: read: {}", e);
            None
        }
    }
}

/// パース済みコマンドを 1 件ディスパッチする。
///
/// 取りうる状態は排他的に 3 つ:
/// 1. バックグラウンドかつ PID 追跡済み → 既存プロセスのフォアグラウンド待機
///    （`fg N` の再生。新しいプロセスは作らない）
/// 2. フォアグラウンド → fork して記録し、その PID が終了を報告するまで待機
/// 3. バックグラウンド → fork して履歴とジョブテーブルに記録し、待たずに戻る
///
/// fork の子側は [`launcher::launch`] に入り、決して戻らない。
/// コマンド構造の表示は記録直後・待機前に行う。
fn dispatch(state: &mut ShellState, mut cmd: Command) {
    if cmd.background && cmd.pid != NO_PID {
        println!("{}\n", cmd);
        job::wait_for(cmd.pid);
        cmd.reset_pid();
        return;
    }

    let pid = unsafe { libc::fork() };
    if pid < 0 {
        eprintln!("minish: fork: {}", io::Error::last_os_error());
        return;
    }
    if pid == 0 {
        // 子プロセス: パイプラインを配線して exec する
        launcher::launch(&cmd);
    }

    cmd.pid = pid;
    state.record(&mut cmd);
    println!("{}\n", cmd);

    if !cmd.background {
        job::wait_for(pid);
    }
}

fn main() {
    let mut state = ShellState::new();

    while state.running {
        // プロンプト前にバックグラウンドジョブを照合して刈り取る
        state.reconcile_jobs();

        let line = match read_line(&state.prompt) {
            Some(line) => line,
            None => {
                state.running = false;
                continue;
            }
        };

        // ビルトインはパーサーより先に生の行を引き受ける
        if let Some(outcome) = builtins::try_dispatch(&mut state, &line) {
            if let builtins::Dispatch::Run(cmd) = outcome {
                dispatch(&mut state, cmd);
            }
            continue;
        }

        match parser::parse(&line) {
            Ok(Some(cmd)) if !cmd.is_empty() => dispatch(&mut state, cmd),
            Ok(_) => {} // 空行・実引数なし → 何もしない
            Err(e) => eprintln!("minish: {}", e),
        }
    }

    // EOF・exit 後は改行を出力して正常終了する
    println!();
}
