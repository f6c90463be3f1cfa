//! トークナイザ + パーサー: 入力 1 行から [`Command`] を構築する。
//!
//! ## 対応構文
//!
//! - 空白区切りのトークン（タブ・制御文字も区切りとして扱う）
//! - バックグラウンド実行: 行内最後の `&`
//! - 出力リダイレクト: 行内最後の `>` と、その直後のトークンがターゲット
//! - パイプライン: `|` でステージ分割
//!
//! クォート・エスケープ・変数展開は扱わない。ビルトイン（`history` 等）は
//! [`builtins`](crate::builtins) がこのパーサーより先に生の行を引き受ける。

use std::fmt;

use crate::command::Command;

// ── Error ───────────────────────────────────────────────────────────

/// パース時に発生しうるエラー。
#[derive(Debug, PartialEq)]
pub enum ParseError {
    /// リダイレクト演算子の後にターゲットファイル名がない。
    MissingRedirectTarget,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRedirectTarget => write!(f, "syntax error: missing redirect target"),
        }
    }
}

// ── Tokenizer ───────────────────────────────────────────────────────

/// 空白と制御文字（スペース以下のコードポイント）をすべて区切りとして
/// トークン化する。空トークンは捨てる。
fn tokenize(input: &str) -> Vec<String> {
    input
        .split(|c: char| c <= ' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Parser ──────────────────────────────────────────────────────────

/// 入力 1 行をパースして [`Command`] を返す。
///
/// - 空行・空白のみ → `Ok(None)`
/// - 通常のコマンド → `Ok(Some(Command))`
/// - 構文エラー → `Err(ParseError)`
///
/// `&` と `>` はステージ分割より先に消費されるため、リダイレクトとバック
/// グラウンド指定はパイプラインの末尾にまとめて書ける（`a | b > f &`）。
/// 全ステージが引数を持たないコマンド（`|` のみの行など）もここでは返し、
/// [`Command::is_empty`] による抑止は呼び出し側に委ねる。
pub fn parse(input: &str) -> Result<Option<Command>, ParseError> {
    if input.trim().is_empty() {
        return Ok(None);
    }

    let mut line = input.to_string();

    // 行内最後の `&` をバックグラウンドマーカーとして消費する
    let mut background = false;
    if let Some(pos) = line.rfind('&') {
        background = true;
        line.replace_range(pos..pos + 1, " ");
    }

    // 行内最後の `>` を消費し、直後の最初のトークンをターゲットにする
    let mut redirect = None;
    if let Some(pos) = line.rfind('>') {
        let mut after = tokenize(&line[pos + 1..]);
        if after.is_empty() {
            return Err(ParseError::MissingRedirectTarget);
        }
        redirect = Some(after.remove(0));
        line.truncate(pos);
    }

    // 残りを `|` でステージに分割する
    let stages: Vec<Vec<String>> = line.split('|').map(tokenize).collect();

    Ok(Some(Command::new(stages, background, redirect)))
}

// ── Tests ───────────────────────────────────────────────────────────
