//! パイプラインランチャー: パイプ作成、ステージごとの fork、`execvp` による置き換え。
//!
//! [`launch`] は制御ループが fork した子プロセス側でのみ呼ばれ、決して戻らない。
//! 親（シェル本体）のファイルディスクリプタや制御フローには一切影響しない。
//!
//! ## 構成
//!
//! | 要素 | 役割 |
//! |------|------|
//! | [`LaunchError`] | fork / exec の失敗（errno とプログラム名を保持） |
//! | `CStringVec` | argv 用の NULL 終端ポインタ配列 |
//! | `spawn_stage` | ステージ 1 つ分のプロセス生成とパイプ両端の複製・クローズ |
//! | [`launch`] | パイプライン全体の配線と最終ステージの exec |

use std::ffi::CString;
use std::fmt;
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::IntoRawFd;

use crate::command::Command;

// ── エラー型 ──────────────────────────────────────────────────────

/// プロセスの生成または置き換えに失敗したときのエラー。
pub struct LaunchError {
    /// errno 値。
    pub errno: i32,
    /// プログラム名（エラーメッセージ用）。
    pub program: String,
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self.errno {
            libc::ENOENT => "command not found",
            libc::EACCES => "permission denied",
            _ => "cannot execute",
        };
        write!(f, "minish: {}: {}", self.program, msg)
    }
}

impl LaunchError {
    /// エラーに対応する終了ステータスを返す。
    /// 127 = command not found, 126 = permission denied, 1 = その他。
    pub fn exit_status(&self) -> i32 {
        match self.errno {
            libc::ENOENT => 127,
            libc::EACCES => 126,
            _ => 1,
        }
    }

    fn last_os_error(program: &str) -> Self {
        Self {
            errno: std::io::Error::last_os_error().raw_os_error().unwrap_or(0),
            program: program.to_string(),
        }
    }
}

// ── CStringVec ────────────────────────────────────────────────────

/// argv 用の CString ベクタ。NULL 終端のポインタ配列を構築する。
struct CStringVec {
    _strings: Vec<CString>,
    ptrs: Vec<*mut libc::c_char>,
}

impl CStringVec {
    /// 引数リストから構築する。各要素を `CString` に変換し、NULL 終端ポインタ配列を作る。
    fn from_args(args: &[String]) -> Self {
        let strings: Vec<CString> = args
            .iter()
            .map(|s| CString::new(s.as_str()).unwrap_or_else(|_| CString::new("").unwrap()))
            .collect();
        let mut ptrs: Vec<*mut libc::c_char> = strings
            .iter()
            .map(|s| s.as_ptr() as *mut libc::c_char)
            .collect();
        ptrs.push(std::ptr::null_mut()); // NULL 終端
        Self {
            _strings: strings,
            ptrs,
        }
    }

    /// NULL 終端ポインタ配列を返す。
    fn as_ptr(&self) -> *const *mut libc::c_char {
        self.ptrs.as_ptr()
    }
}

// ── リダイレクト ──────────────────────────────────────────────────

/// stdout を対象ファイルへ置き換える。作成時パーミッションは 0744、
/// 既存ファイルは truncate、書き込み専用で開く。
fn redirect_stdout(target: &str) -> Result<(), String> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o744)
        .open(target)
        .map_err(|e| format!("minish: cannot redirect output to '{}': {}", target, e))?;

    let fd = file.into_raw_fd();
    unsafe {
        libc::dup2(fd, libc::STDOUT_FILENO);
        libc::close(fd);
    }
    Ok(())
}

// ── exec ──────────────────────────────────────────────────────────

/// ステージ `idx` を `execvp` で現在のプロセスに置き換える。戻らない。
///
/// `last` が真のとき、コマンドのリダイレクト指定を stdout に適用してから exec する。
/// exec・リダイレクトの失敗はこのプロセスだけを失敗ステータスで終了させ、
/// 呼び出し元（シェル本体）の制御フローには決して戻らない。
fn exec_stage(cmd: &Command, idx: usize, last: bool) -> ! {
    let args = &cmd.stages[idx];
    if args.is_empty() {
        eprintln!("minish: empty pipeline stage");
        std::process::exit(libc::EXIT_FAILURE);
    }

    if last {
        if let Some(target) = &cmd.redirect {
            if let Err(msg) = redirect_stdout(target) {
                eprintln!("{}", msg);
                std::process::exit(libc::EXIT_FAILURE);
            }
        }
    }

    let argv = CStringVec::from_args(args);
    unsafe {
        libc::execvp(
            argv.as_ptr().read() as *const libc::c_char,
            argv.as_ptr() as *const *const libc::c_char,
        );
    }

    // ここに到達するのは exec 失敗時のみ
    let err = LaunchError::last_os_error(&args[0]);
    eprintln!("{}", err);
    std::process::exit(err.exit_status());
}

// ── ステージ生成 ──────────────────────────────────────────────────

/// ステージ `idx` 用のプロセスを 1 つ fork する。
///
/// `stdin_fd` はこのステージが読むべき fd、`pipe_rd` / `pipe_wr` は次のステージへの
/// パイプ両端。生成されたプロセスは使う側の端を標準ストリームへ複製したあと、
/// 持っているパイプの端をすべて閉じる（使わない読み端も閉じることで、
/// 書き手が全員いなくなった時点で下流が EOF を観測できる）。
fn spawn_stage(
    cmd: &Command,
    idx: usize,
    stdin_fd: i32,
    pipe_rd: i32,
    pipe_wr: i32,
) -> Result<libc::pid_t, LaunchError> {
    let pid = unsafe { libc::fork() };
    if pid < 0 {
        let program = cmd.stages[idx].first().cloned().unwrap_or_default();
        return Err(LaunchError::last_os_error(&program));
    }

    if pid == 0 {
        unsafe {
            if stdin_fd != libc::STDIN_FILENO {
                libc::dup2(stdin_fd, libc::STDIN_FILENO);
                libc::close(stdin_fd);
            }
            libc::dup2(pipe_wr, libc::STDOUT_FILENO);
            libc::close(pipe_wr);
            libc::close(pipe_rd);
        }
        exec_stage(cmd, idx, false);
    }

    Ok(pid)
}

// ── パイプライン起動 ──────────────────────────────────────────────

/// パイプライン全体を起動する。制御ループが fork した子プロセスから呼ばれ、決して戻らない。
///
/// ステージ数 N = 1 ならそのまま exec する。N > 1 なら先頭から N−1 ステージを
/// [`spawn_stage`] で起動してパイプで数珠つなぎにし、自身が最終ステージとして
/// exec する。リダイレクトは最終ステージの stdout にのみ適用される。
///
/// パイプ作成や fork に失敗した場合はパイプライン全体を中断し、エラーを 1 件
/// 報告して失敗ステータスで終了する（途切れたまま後続ステージを走らせない）。
pub fn launch(cmd: &Command) -> ! {
    let n = cmd.stages.len();
    if n == 0 {
        eprintln!("minish: empty command");
        std::process::exit(libc::EXIT_FAILURE);
    }

    let mut input = libc::STDIN_FILENO;

    for idx in 0..n - 1 {
        let mut fds = [0i32; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            eprintln!("minish: pipe: {}", std::io::Error::last_os_error());
            std::process::exit(libc::EXIT_FAILURE);
        }
        let [rd, wr] = fds;

        if let Err(e) = spawn_stage(cmd, idx, input, rd, wr) {
            eprintln!("{}", e);
            unsafe {
                libc::close(rd);
                libc::close(wr);
            }
            std::process::exit(libc::EXIT_FAILURE);
        }

        // 書き端はステージ側が所有する。消費した読み端もここで手放し、
        // 次のステージの入力だけを持ち越す。
        unsafe {
            libc::close(wr);
            if input != libc::STDIN_FILENO {
                libc::close(input);
            }
        }
        input = rd;
    }

    // 最終ステージ: 手前のパイプの読み端を stdin に接続して自身を exec する
    if input != libc::STDIN_FILENO {
        unsafe {
            libc::dup2(input, libc::STDIN_FILENO);
            libc::close(input);
        }
    }
    exec_stage(cmd, n - 1, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── CStringVec ──

    #[test]
    fn cstring_vec_is_null_terminated() {
        let args = vec!["echo".to_string(), "hello".to_string()];
        let argv = CStringVec::from_args(&args);
        assert_eq!(argv.ptrs.len(), 3);
        assert!(argv.ptrs[2].is_null());
        assert!(!argv.ptrs[0].is_null());
    }

    #[test]
    fn cstring_vec_preserves_contents() {
        let args = vec!["wc".to_string(), "-w".to_string()];
        let argv = CStringVec::from_args(&args);
        let first = unsafe { std::ffi::CStr::from_ptr(argv.ptrs[0]) };
        let second = unsafe { std::ffi::CStr::from_ptr(argv.ptrs[1]) };
        assert_eq!(first.to_str().unwrap(), "wc");
        assert_eq!(second.to_str().unwrap(), "-w");
    }

    // ── LaunchError ──

    #[test]
    fn launch_error_maps_exit_status() {
        let not_found = LaunchError {
            errno: libc::ENOENT,
            program: "nosuch".to_string(),
        };
        assert_eq!(not_found.exit_status(), 127);
        assert_eq!(format!("{}", not_found), "minish: nosuch: command not found");

        let denied = LaunchError {
            errno: libc::EACCES,
            program: "locked".to_string(),
        };
        assert_eq!(denied.exit_status(), 126);

        let other = LaunchError {
            errno: libc::ENOMEM,
            program: "x".to_string(),
        };
        assert_eq!(other.exit_status(), 1);
    }
}
