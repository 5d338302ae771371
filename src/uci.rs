use std::io::{self, BufRead};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::board::{Color, File, MoveGen, Piece, Position, Rank, Square};
use crate::error::EngineError;
use crate::search::{self, SearchState};
use crate::time::TimeManager;
use crate::types::{EngineConfig, DEFAULT_DEPTH};

pub fn run() {
    let stdin = io::stdin();

    let mut pos = Position::default();
    let mut config = EngineConfig::default();
    let mut search_state: Option<SearchState> = Some(SearchState::new());
    let mut stop_flag: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
    let mut search_thread: Option<thread::JoinHandle<SearchState>> = None;

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        tracing::info!(command = tokens[0], "received command");

        match tokens[0] {
            "uci" => {
                println!("id name chess-engine");
                println!("id author yourname");
                println!("option name Hash type spin default 64 min 1 max 4096");
                println!("uciok");
            }
            "isready" => {
                wait_for_search(&mut search_thread, &mut search_state);
                println!("readyok");
            }
            "ucinewgame" => {
                wait_for_search(&mut search_thread, &mut search_state);
                pos = Position::default();
                if let Some(ref mut ss) = search_state {
                    ss.tt.clear();
                }
            }
            "position" => {
                wait_for_search(&mut search_thread, &mut search_state);
                if let Err(e) = parse_position(&tokens, &mut pos) {
                    tracing::warn!(%e, "rejecting position command");
                    println!("info string {}", e);
                }
            }
            "go" => {
                wait_for_search(&mut search_thread, &mut search_state);

                let go_params = parse_go(&tokens);
                let max_depth = go_params.depth.unwrap_or(DEFAULT_DEPTH);

                let mut ss = search_state.take().expect("search state missing");
                ss.reset();
                let move_count = (pos.applied_moves().len() / 2) as u32;
                ss.time_manager = go_params.time_manager(pos.side_to_move(), move_count);

                let flag = Arc::new(AtomicBool::new(false));
                stop_flag = flag.clone();
                ss.stop = flag;

                let mut pos_copy = pos.clone();

                search_thread = Some(thread::spawn(move || {
                    let result = search::search(&mut pos_copy, &mut ss, max_depth);

                    match result.best_move {
                        Some(m) => {
                            tracing::info!(bestmove = %m, depth = result.depth, nodes = result.nodes, "search complete");
                            println!("bestmove {}", m);
                        }
                        None => {
                            tracing::info!("search complete, no legal move");
                            println!("bestmove 0000");
                        }
                    }

                    ss
                }));
            }
            "stop" => {
                stop_flag.store(true, Ordering::SeqCst);
                wait_for_search(&mut search_thread, &mut search_state);
            }
            "setoption" => {
                wait_for_search(&mut search_thread, &mut search_state);
                if let Some(ref mut ss) = search_state {
                    parse_setoption(&tokens, &mut config, ss);
                }
            }
            "quit" => {
                stop_flag.store(true, Ordering::SeqCst);
                wait_for_search(&mut search_thread, &mut search_state);
                break;
            }
            "d" | "print" => {
                println!("{}", pos);
            }
            other => {
                tracing::debug!(error = %EngineError::UnknownCommand(other.to_string()), "ignoring command");
            }
        }
    }
}

/// Wait for a running search thread to finish and recover the SearchState.
fn wait_for_search(handle: &mut Option<thread::JoinHandle<SearchState>>, state: &mut Option<SearchState>) {
    if let Some(h) = handle.take() {
        match h.join() {
            Ok(ss) => *state = Some(ss),
            Err(_) => {
                // search thread panicked - create fresh state
                *state = Some(SearchState::new());
            }
        }
    }
}

/// Parsed `go` command parameters.
struct GoParams {
    depth: Option<u8>,
    movetime: Option<u64>,
    wtime: Option<u64>,
    btime: Option<u64>,
    winc: Option<u64>,
    binc: Option<u64>,
    moves_to_go: Option<u32>,
    infinite: bool,
}

impl GoParams {
    fn new() -> Self {
        Self {
            depth: None,
            movetime: None,
            wtime: None,
            btime: None,
            winc: None,
            binc: None,
            moves_to_go: None,
            infinite: false,
        }
    }

    /// Build the `TimeManager` this search should run under. `move_count` is the number of full
    /// moves already played, used to weight the time allocation (see `time::TimeManager::new`).
    fn time_manager(&self, side: Color, move_count: u32) -> TimeManager {
        if self.infinite {
            return TimeManager::unbounded();
        }
        if let Some(mt) = self.movetime {
            return TimeManager::fixed(mt);
        }

        let (my_time, my_inc) = if side == Color::White {
            (self.wtime, self.winc.unwrap_or(0))
        } else {
            (self.btime, self.binc.unwrap_or(0))
        };

        match my_time {
            Some(remaining) => TimeManager::new(remaining, my_inc, move_count),
            None => TimeManager::unbounded(),
        }
    }
}

fn parse_go(tokens: &[&str]) -> GoParams {
    let mut params = GoParams::new();
    let mut i = 1;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                if i < tokens.len() {
                    params.depth = tokens[i].parse().ok();
                }
            }
            "movetime" => {
                i += 1;
                if i < tokens.len() {
                    params.movetime = tokens[i].parse().ok();
                }
            }
            "wtime" => {
                i += 1;
                if i < tokens.len() {
                    params.wtime = tokens[i].parse().ok();
                }
            }
            "btime" => {
                i += 1;
                if i < tokens.len() {
                    params.btime = tokens[i].parse().ok();
                }
            }
            "winc" => {
                i += 1;
                if i < tokens.len() {
                    params.winc = tokens[i].parse().ok();
                }
            }
            "binc" => {
                i += 1;
                if i < tokens.len() {
                    params.binc = tokens[i].parse().ok();
                }
            }
            "movestogo" => {
                i += 1;
                if i < tokens.len() {
                    params.moves_to_go = tokens[i].parse().ok();
                }
            }
            "infinite" => {
                params.infinite = true;
            }
            _ => {}
        }
        i += 1;
    }

    params
}

fn parse_position(tokens: &[&str], pos: &mut Position) -> Result<(), EngineError> {
    if tokens.len() < 2 {
        return Err(EngineError::InvalidFen(String::new()));
    }

    let mut idx = 1;

    if tokens[idx] == "startpos" {
        *pos = Position::default();
        idx += 1;
    } else if tokens[idx] == "fen" {
        idx += 1;
        let mut fen_parts: Vec<&str> = Vec::new();
        while idx < tokens.len() && tokens[idx] != "moves" && fen_parts.len() < 6 {
            fen_parts.push(tokens[idx]);
            idx += 1;
        }
        if fen_parts.len() < 4 {
            return Err(EngineError::InvalidFen(fen_parts.join(" ")));
        }
        let fen_str = fen_parts.join(" ");
        *pos = Position::from_str(&fen_str).map_err(EngineError::InvalidFen)?;
    } else {
        return Err(EngineError::UnknownCommand(tokens[idx].to_string()));
    }

    if idx < tokens.len() && tokens[idx] == "moves" {
        idx += 1;
        for &move_str in &tokens[idx..] {
            let mv = resolve_uci_move(pos, move_str)?;
            pos.apply_move(mv);
        }
    }

    Ok(())
}

/// A UCI move string parsed into squares and an optional promotion piece, before legality is
/// checked. Kept separate from `resolve_uci_move` so a malformed string (bad square letters,
/// wrong length) can be reported as `InvalidMoveString` while a well-formed but illegal one is
/// reported as `IllegalMove`.
fn parse_move_str(move_str: &str) -> Option<(Square, Square, Option<Piece>)> {
    if move_str.len() < 4 {
        return None;
    }
    let bytes = move_str.as_bytes();

    let src_file = bytes[0].wrapping_sub(b'a');
    let src_rank = bytes[1].wrapping_sub(b'1');
    let dst_file = bytes[2].wrapping_sub(b'a');
    let dst_rank = bytes[3].wrapping_sub(b'1');

    if src_file >= 8 || src_rank >= 8 || dst_file >= 8 || dst_rank >= 8 {
        return None;
    }

    let src = Square::make_square(Rank::from_index(src_rank as usize), File::from_index(src_file as usize));
    let dst = Square::make_square(Rank::from_index(dst_rank as usize), File::from_index(dst_file as usize));

    let promo = if move_str.len() >= 5 {
        match bytes[4] {
            b'q' => Some(Piece::Queen),
            b'r' => Some(Piece::Rook),
            b'b' => Some(Piece::Bishop),
            b'n' => Some(Piece::Knight),
            _ => return None,
        }
    } else {
        None
    };

    Some((src, dst, promo))
}

/// Resolve a UCI move string (e.g. "e2e4", "a7a8q") against the legal moves of `pos`. The
/// lightweight `Move` construction used elsewhere needs the moving/captured/kind fields filled
/// in, which only legal-move generation can supply, so this matches against `MoveGen` rather
/// than building a `Move` by hand.
fn parse_uci_move(pos: &Position, move_str: &str) -> Option<crate::board::Move> {
    let (src, dst, promo) = parse_move_str(move_str)?;
    MoveGen::new_legal(pos).find(|mv| mv.from() == src && mv.to() == dst && mv.get_promotion() == promo)
}

/// Like `parse_uci_move`, but distinguishes a syntactically malformed string from one that
/// names squares correctly but isn't a legal move in `pos`.
fn resolve_uci_move(pos: &Position, move_str: &str) -> Result<crate::board::Move, EngineError> {
    let (src, dst, promo) =
        parse_move_str(move_str).ok_or_else(|| EngineError::InvalidMoveString(move_str.to_string()))?;
    MoveGen::new_legal(pos)
        .find(|mv| mv.from() == src && mv.to() == dst && mv.get_promotion() == promo)
        .ok_or_else(|| EngineError::IllegalMove(move_str.to_string()))
}

fn parse_setoption(tokens: &[&str], config: &mut EngineConfig, state: &mut SearchState) {
    let name_idx = tokens.iter().position(|&t| t == "name");
    let value_idx = tokens.iter().position(|&t| t == "value");

    if let (Some(ni), Some(vi)) = (name_idx, value_idx) {
        let name: String = tokens[ni + 1..vi].join(" ");
        let value: String = tokens[vi + 1..].join(" ");

        if name.to_lowercase() == "hash" {
            if let Ok(mb) = value.parse::<usize>() {
                config.hash_mb = mb.clamp(1, 4096);
                state.resize_tt(config.hash_mb);
            }
        }
    }
}
