//! Text rendering of a session view.

use rook_session::{ParticipantColor, SessionView};

const FILES: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// Piece letters indexed `[rank][file]`, rank 0 being rank 1.
type Grid = [[char; 8]; 8];

/// Parse the placement field of a FEN. Unknown or overflowing input is
/// skipped, so a malformed string renders as a partial board.
fn grid_from_fen(fen: &str) -> Grid {
    let mut grid = [['.'; 8]; 8];
    let placement = fen.split_whitespace().next().unwrap_or_default();

    for (row, rank_text) in placement.split('/').take(8).enumerate() {
        let rank = 7 - row;
        let mut file = 0usize;
        for c in rank_text.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as usize;
            } else if file < 8 {
                grid[rank][file] = c;
                file += 1;
            }
        }
    }
    grid
}

/// ASCII board seen from `color`'s side; white's view when unassigned.
pub fn board(fen: &str, color: ParticipantColor) -> String {
    let grid = grid_from_fen(fen);
    let flipped = color == ParticipantColor::Black;

    let ranks: Vec<usize> = if flipped {
        (0..8).collect()
    } else {
        (0..8).rev().collect()
    };
    let files: Vec<usize> = if flipped {
        (0..8).rev().collect()
    } else {
        (0..8).collect()
    };

    let mut out = String::new();
    for &rank in &ranks {
        out.push_str(&format!("{} ", rank + 1));
        let squares: Vec<String> = files.iter().map(|&f| grid[rank][f].to_string()).collect();
        out.push_str(&squares.join(" "));
        out.push('\n');
    }
    let labels: Vec<String> = files.iter().map(|&f| FILES[f].to_string()).collect();
    out.push_str("  ");
    out.push_str(&labels.join(" "));
    out.push('\n');
    out
}

/// Session header, board and headline.
pub fn frame(view: &SessionView) -> String {
    let mut out = String::new();
    if let Some(id) = &view.session_id {
        out.push_str(&format!("Game {id} | you play {}\n", view.color));
    }
    out.push_str(&board(&view.position, view.color));
    out.push_str(&view.headline());
    out.push('\n');
    out
}
