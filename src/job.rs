//! 待機ヘルパー。
//!
//! フォアグラウンド待機（[`wait_for`]）と非ブロッキング生存確認（[`still_running`]）を
//! 提供する。制御ループと [`ShellState`](crate::state::ShellState) の両方から利用し、
//! `waitpid` の呼び出しをここに集約する。

use libc::pid_t;

use crate::command::NO_PID;

/// 対象 PID が状態変化を報告するまでブロックする。
///
/// `waitpid` を対象 PID を返すまでリトライし、偽の起床を完了と誤認しない。
/// 既に終了・回収済みの PID（`waitpid` が負を返す）では即座に戻るため、
/// 終了済みジョブの `fg` がハングすることはない。
pub fn wait_for(pid: pid_t) {
    // 番兵値で waitpid(-1) を呼ぶと任意の子を回収してしまう
    if pid == NO_PID {
        return;
    }
    loop {
        let r = unsafe { libc::waitpid(pid, std::ptr::null_mut(), 0) };
        if r == pid || r < 0 {
            break;
        }
    }
}

/// 対象 PID がまだ実行中かを非ブロッキングで確認する。
///
/// `waitpid(pid, WNOHANG)` が 0 を返す場合のみ実行中。終了済み（このとき同時に
/// 回収される）や未知の PID は `false`。呼び出し側をブロックしない。
pub fn still_running(pid: pid_t) -> bool {
    if pid == NO_PID {
        return false;
    }
    unsafe { libc::waitpid(pid, std::ptr::null_mut(), libc::WNOHANG) == 0 }
}
