//! ビルトインコマンドの実装。
//!
//! 生の入力行をパーサーより先に引き受ける。履歴・ジョブの一覧表示、
//! ディレクトリ操作、シェル終了はここで完結し、`!N` / `fg N` は
//! 制御ループに実行させる [`Command`] を返す。
//! 状態への作用は `record` / `reconcile_jobs` / 番号参照に限られる。

use std::path::Path;

use crate::command::Command;
use crate::state::ShellState;

/// ビルトイン処理の結果。
#[derive(Debug, PartialEq)]
pub enum Dispatch {
    /// 行はビルトインとして処理済み。次の行へ進む。
    Handled,
    /// ビルトインが生成したコマンド（`!N` の再生、`fg N` のジョブ）を実行する。
    Run(Command),
}

/// 入力行のビルトイン判定と実行を試みる。
///
/// 戻り値:
/// - `Some(Dispatch)` — ビルトインとして認識・処理した
/// - `None` — 該当するビルトインなし（パーサーと外部コマンド実行に委ねる）
pub fn try_dispatch(state: &mut ShellState, line: &str) -> Option<Dispatch> {
    let trimmed = line.trim();

    match trimmed {
        "history" => return Some(list_history(state)),
        "jobs" => return Some(list_jobs(state)),
        "pwd" => return Some(print_working_dir()),
        "exit" => {
            state.running = false;
            return Some(Dispatch::Handled);
        }
        _ => {}
    }

    if let Some(rest) = trimmed.strip_prefix('!') {
        if !rest.is_empty() {
            return Some(replay(state, rest));
        }
        return None;
    }

    let mut parts = trimmed.split_whitespace();
    match parts.next() {
        Some("fg") => Some(foreground(state, parts.next())),
        Some("cd") => Some(change_dir(parts.next())),
        _ => None,
    }
}

/// `history` — 記録済みコマンドをすべて一覧する。
fn list_history(state: &ShellState) -> Dispatch {
    if state.history.is_empty() {
        println!("no command history");
    }
    for (i, cmd) in state.history.iter().enumerate() {
        println!("[{}]\n{}\n", i + 1, cmd);
    }
    Dispatch::Handled
}

/// `jobs` — ジョブテーブルを照合してから一覧する。
fn list_jobs(state: &mut ShellState) -> Dispatch {
    state.reconcile_jobs();

    if state.jobs.is_empty() {
        println!("no jobs are present");
    }
    for (i, cmd) in state.jobs.iter().enumerate() {
        println!("[{}]\n{}\n", i + 1, cmd);
    }
    Dispatch::Handled
}

/// `!N` — 履歴エントリ N を PID を消去したうえで再生する。
///
/// 番号の解析失敗と範囲外は別のメッセージで報告し、状態は変更しない。
fn replay(state: &ShellState, arg: &str) -> Dispatch {
    match arg.trim().parse::<usize>() {
        Ok(n) if n >= 1 => match state.history_at(n) {
            Some(entry) => {
                let mut cmd = entry.clone();
                cmd.reset_pid();
                Dispatch::Run(cmd)
            }
            None => {
                eprintln!("no command found in history");
                Dispatch::Handled
            }
        },
        _ => {
            eprintln!("Incorrect command number provided");
            Dispatch::Handled
        }
    }
}

/// `fg N` — ジョブ N をフォアグラウンド待機の対象として返す。
///
/// 先にジョブテーブルを照合し、消えたジョブを対象にしない。
/// 引数なしの `fg` は何もしない。
fn foreground(state: &mut ShellState, arg: Option<&str>) -> Dispatch {
    let arg = match arg {
        Some(a) => a,
        None => return Dispatch::Handled,
    };

    state.reconcile_jobs();

    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => match state.job_at(n) {
            Some(job) => Dispatch::Run(job.clone()),
            None => {
                eprintln!("no jobs found");
                Dispatch::Handled
            }
        },
        _ => {
            eprintln!("Incorrect command number provided");
            Dispatch::Handled
        }
    }
}

/// `cd <path>` — カレントディレクトリを変更する。引数なしは何もしない。
fn change_dir(path: Option<&str>) -> Dispatch {
    if let Some(path) = path {
        if std::env::set_current_dir(Path::new(path)).is_err() {
            eprintln!("invalid argument to cd");
        }
    }
    Dispatch::Handled
}

/// `pwd` — カレントディレクトリを表示する。
fn print_working_dir() -> Dispatch {
    match std::env::current_dir() {
        Ok(dir) => println!("{}", dir.display()),
        Err(e) => eprintln!("minish: pwd: {}", e),
    }
    Dispatch::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::NO_PID;
    use libc::pid_t;
    use std::process::Command as Proc;

    fn cmd(args: &[&str], background: bool) -> Command {
        Command::new(
            vec![args.iter().map(|s| s.to_string()).collect()],
            background,
            None,
        )
    }

    // ── 認識 ──

    #[test]
    fn unknown_line_is_not_builtin() {
        let mut state = ShellState::new();
        assert!(try_dispatch(&mut state, "ls -la").is_none());
        assert!(try_dispatch(&mut state, "!").is_none());
    }

    #[test]
    fn exit_clears_running() {
        let mut state = ShellState::new();
        assert_eq!(try_dispatch(&mut state, "exit"), Some(Dispatch::Handled));
        assert!(!state.running);
    }

    #[test]
    fn history_and_jobs_are_handled() {
        let mut state = ShellState::new();
        assert_eq!(try_dispatch(&mut state, "history"), Some(Dispatch::Handled));
        assert_eq!(try_dispatch(&mut state, "jobs"), Some(Dispatch::Handled));
    }

    // ── !N ──

    #[test]
    fn replay_clones_entry_with_sentinel_pid() {
        let mut state = ShellState::new();
        let mut first = cmd(&["echo", "one"], false);
        first.pid = 111;
        state.record(&mut first);
        let mut second = cmd(&["echo", "two"], true);
        second.pid = 222;
        state.record(&mut second);

        match try_dispatch(&mut state, "!2") {
            Some(Dispatch::Run(replayed)) => {
                assert_eq!(replayed.stages, state.history[1].stages);
                assert!(replayed.background);
                assert_eq!(replayed.pid, NO_PID);
            }
            other => panic!("expected Run, got {:?}", other),
        }
        // 再生自体は状態を変更しない
        assert_eq!(state.history.len(), 2);
    }

    #[test]
    fn replay_out_of_range_reports_and_leaves_state() {
        let mut state = ShellState::new();
        state.record(&mut cmd(&["ls"], false));

        assert_eq!(try_dispatch(&mut state, "!0"), Some(Dispatch::Handled));
        assert_eq!(try_dispatch(&mut state, "!5"), Some(Dispatch::Handled));
        assert_eq!(try_dispatch(&mut state, "!abc"), Some(Dispatch::Handled));
        assert_eq!(state.history.len(), 1);
    }

    // ── fg ──

    #[test]
    fn fg_without_argument_is_noop() {
        let mut state = ShellState::new();
        assert_eq!(try_dispatch(&mut state, "fg"), Some(Dispatch::Handled));
    }

    #[test]
    fn fg_with_empty_job_table_reports() {
        let mut state = ShellState::new();
        assert_eq!(try_dispatch(&mut state, "fg 1"), Some(Dispatch::Handled));
        assert_eq!(try_dispatch(&mut state, "fg xyz"), Some(Dispatch::Handled));
    }

    #[test]
    fn fg_returns_live_job_with_pid_intact() {
        let mut child = Proc::new("sleep").arg("30").spawn().expect("spawn sleep");
        let pid = child.id() as pid_t;

        let mut state = ShellState::new();
        let mut job = cmd(&["sleep", "30"], true);
        job.pid = pid;
        state.record(&mut job);

        match try_dispatch(&mut state, "fg 1") {
            Some(Dispatch::Run(found)) => {
                assert_eq!(found.pid, pid);
                assert!(found.background);
            }
            other => panic!("expected Run, got {:?}", other),
        }

        child.kill().expect("kill");
        unsafe { libc::waitpid(pid, std::ptr::null_mut(), 0) };
    }

    // ── cd / pwd ──

    #[test]
    fn cd_invalid_directory_is_handled() {
        let mut state = ShellState::new();
        let outcome = try_dispatch(&mut state, "cd /no/such/directory/anywhere");
        assert_eq!(outcome, Some(Dispatch::Handled));
    }

    #[test]
    fn pwd_is_handled() {
        let mut state = ShellState::new();
        assert_eq!(try_dispatch(&mut state, "pwd"), Some(Dispatch::Handled));
    }
}
