// 3x3 board and turn state.
//
// `Board` owns the complete mutable game state: nine cells and the active
// mark (whose move is legal next). It performs no legality checking itself —
// the session (`session.rs`) validates seat, turn ownership, and cell
// vacancy before calling `apply_move`. Outcome is derived, never stored:
// `evaluate()` recomputes it from the cells after every accepted move.

use gridduel_protocol::message::BOARD_CELLS;
use gridduel_protocol::types::{Mark, Outcome};

/// The eight winning lines, scanned in a fixed order: rows top to bottom,
/// then columns left to right, then the two diagonals. Alternating play
/// means at most one line can complete per move, so the scan order never
/// changes the result — fixing it just makes evaluation reproducible.
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Board cells plus the active mark. Lives for the whole process; `reset`
/// replaces the state in place after every concluded game.
pub struct Board {
    cells: [Option<Mark>; BOARD_CELLS],
    active_mark: Mark,
}

impl Board {
    /// An empty board with `X` to move.
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_CELLS],
            active_mark: Mark::X,
        }
    }

    /// The mark occupying `index`, if any.
    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    /// Snapshot of all nine cells, in the wire layout.
    pub fn cells(&self) -> [Option<Mark>; BOARD_CELLS] {
        self.cells
    }

    /// The mark whose move is legal next.
    pub fn active_mark(&self) -> Mark {
        self.active_mark
    }

    /// Place `mark` at `index`. Preconditions (index in range, cell empty,
    /// `mark` is active) are enforced by the caller.
    pub fn apply_move(&mut self, index: usize, mark: Mark) {
        debug_assert!(index < BOARD_CELLS);
        debug_assert!(self.cells[index].is_none());
        debug_assert_eq!(mark, self.active_mark);
        self.cells[index] = Some(mark);
    }

    /// Hand the turn to the other mark. Called after an accepted move that
    /// did not end the game.
    pub fn flip_turn(&mut self) {
        self.active_mark = self.active_mark.opponent();
    }

    /// Recompute the outcome: the first win line whose three cells hold the
    /// same mark wins; a full board with no winner is a draw; otherwise the
    /// game is ongoing (`None`).
    pub fn evaluate(&self) -> Option<Outcome> {
        for line in WIN_LINES {
            if let Some(mark) = self.cells[line[0]] {
                if self.cells[line[1]] == Some(mark) && self.cells[line[2]] == Some(mark) {
                    return Some(Outcome::Won { winner: mark });
                }
            }
        }
        if self.cells.iter().all(Option::is_some) {
            return Some(Outcome::Draw);
        }
        None
    }

    /// Empty all cells and give the turn back to `X`. Idempotent.
    pub fn reset(&mut self) {
        self.cells = [None; BOARD_CELLS];
        self.active_mark = Mark::X;
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
