//! Session module - the game state machine
//!
//! Ties together board, pieces, collision, rotation and scoring. A session is an owned
//! value with a single writer: every intent and tick runs to completion inside the call,
//! either committing a change in full or leaving the state untouched.
//!
//! States: `Playing` ⇄ `Paused` via the pause toggle, `Playing` → `GameOver` when a
//! freshly spawned piece collides. Only `reset` leaves `GameOver`.

use crate::board::Board;
use crate::collision::collides;
use crate::piece::Piece;
use crate::rng::{PieceSource, RandomPieces};
use crate::rotation::try_rotate;
use crate::scoring::Progress;
use crate::snapshot::{ActiveSnapshot, GameSnapshot, TimersSnapshot};
use crate::types::{Intent, PieceKind, Status};

/// What happened when the last piece locked (consumed by observers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEvent {
    pub kind: PieceKind,
    pub lines_cleared: u32,
    pub points: u32,
    pub level_up: bool,
    pub game_over: bool,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct Session<S = RandomPieces> {
    board: Board,
    active: Piece,
    next: PieceKind,
    progress: Progress,
    drop_timer_ms: u32,
    status: Status,
    source: S,
    last_event: Option<LockEvent>,
}

impl Session<RandomPieces> {
    /// Create a session drawing uniformly random pieces from `seed`
    pub fn new(seed: u32) -> Self {
        Self::with_source(RandomPieces::new(seed))
    }
}

impl Default for Session<RandomPieces> {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<S: PieceSource> Session<S> {
    /// Create a session on an empty board, already reset and playing
    pub fn with_source(mut source: S) -> Self {
        let active = Piece::spawn(source.draw());
        let next = source.draw();
        Self {
            board: Board::new(),
            active,
            next,
            progress: Progress::new(),
            drop_timer_ms: 0,
            status: Status::Playing,
            source,
            last_event: None,
        }
    }

    /// Create a session on a prepared board.
    ///
    /// The first piece is spawn-checked like any other: if it collides the session
    /// starts in `GameOver`. A later `reset` returns to an empty board.
    pub fn with_board(board: Board, source: S) -> Self {
        let mut session = Self::with_source(source);
        session.board = board;
        if collides(&session.board, &session.active) {
            session.status = Status::GameOver;
        }
        session
    }

    /// Start over: empty board, zeroed counters, two fresh pieces, `Playing`
    pub fn reset(&mut self) -> GameSnapshot {
        self.board.clear();
        self.active = Piece::spawn(self.source.draw());
        self.next = self.source.draw();
        self.progress = Progress::new();
        self.drop_timer_ms = 0;
        self.status = Status::Playing;
        self.last_event = None;
        self.snapshot()
    }

    /// Advance the gravity timer by `elapsed_ms`.
    ///
    /// Once the accumulated time exceeds the drop interval, one gravity step runs.
    /// No-op unless playing.
    pub fn tick(&mut self, elapsed_ms: u32) -> GameSnapshot {
        if self.status == Status::Playing {
            self.drop_timer_ms = self.drop_timer_ms.saturating_add(elapsed_ms);
            if self.drop_timer_ms > self.progress.drop_interval_ms {
                self.step_down();
            }
        }
        self.snapshot()
    }

    /// Apply a host intent. Rejected intents leave the state unchanged.
    pub fn apply_intent(&mut self, intent: Intent) -> GameSnapshot {
        match (self.status, intent) {
            (Status::Playing, Intent::TogglePause) => self.status = Status::Paused,
            (Status::Paused, Intent::TogglePause) => self.status = Status::Playing,
            (Status::Playing, Intent::MoveLeft) => {
                self.try_move(-1);
            }
            (Status::Playing, Intent::MoveRight) => {
                self.try_move(1);
            }
            (Status::Playing, Intent::Rotate) => {
                self.try_rotate();
            }
            (Status::Playing, Intent::SoftDrop) => self.step_down(),
            (Status::Playing, Intent::HardDrop) => self.hard_drop(),
            (Status::Paused, _) | (Status::GameOver, _) => {}
        }
        self.snapshot()
    }

    /// Read-only copy of the current state
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board.to_grid(),
            active: ActiveSnapshot::from(self.active),
            next: self.next,
            score: self.progress.score,
            level: self.progress.level,
            lines: self.progress.lines,
            status: self.status,
            timers: TimersSnapshot {
                drop_ms: self.drop_timer_ms,
                drop_interval_ms: self.progress.drop_interval_ms,
            },
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> Piece {
        self.active
    }

    pub fn next(&self) -> PieceKind {
        self.next
    }

    pub fn score(&self) -> u32 {
        self.progress.score
    }

    pub fn level(&self) -> u32 {
        self.progress.level
    }

    pub fn lines(&self) -> u32 {
        self.progress.lines
    }

    pub fn drop_interval_ms(&self) -> u32 {
        self.progress.drop_interval_ms
    }

    pub fn drop_timer_ms(&self) -> u32 {
        self.drop_timer_ms
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Take and clear the last lock event.
    pub fn take_last_event(&mut self) -> Option<LockEvent> {
        self.last_event.take()
    }

    /// Row the active piece would rest on after a hard drop
    pub fn landing_y(&self) -> i8 {
        self.lowest_free(self.active).y
    }

    /// Shift the active piece sideways by `dx` if the target is free
    fn try_move(&mut self, dx: i8) -> bool {
        let candidate = self.active.translated(dx, 0);
        if collides(&self.board, &candidate) {
            return false;
        }
        self.active = candidate;
        true
    }

    /// Rotate clockwise with the horizontal kick search
    fn try_rotate(&mut self) -> bool {
        match try_rotate(&self.board, &self.active) {
            Some((rotated, _kick)) => {
                self.active = rotated;
                true
            }
            None => false,
        }
    }

    /// One gravity step: fall a row, or lock when blocked. Resets the drop timer.
    fn step_down(&mut self) {
        let below = self.active.translated(0, 1);
        if collides(&self.board, &below) {
            self.lock_piece();
        } else {
            self.active = below;
        }
        self.drop_timer_ms = 0;
    }

    fn hard_drop(&mut self) {
        self.active = self.lowest_free(self.active);
        self.step_down();
    }

    fn lowest_free(&self, mut piece: Piece) -> Piece {
        loop {
            let below = piece.translated(0, 1);
            if collides(&self.board, &below) {
                return piece;
            }
            piece = below;
        }
    }

    /// Merge the active piece, clear rows, score, then promote the next piece
    fn lock_piece(&mut self) {
        let kind = self.active.kind;

        // Cells still above the board are dropped.
        for (x, y) in self.active.cells() {
            if y >= 0 {
                self.board.write_cell(x, y, kind);
            }
        }

        let cleared = self.board.clear_full_rows();
        let result = self.progress.apply_clear(cleared.len());

        self.active = Piece::spawn(self.next);
        self.next = self.source.draw();

        let game_over = collides(&self.board, &self.active);
        if game_over {
            self.status = Status::GameOver;
        }

        self.last_event = Some(LockEvent {
            kind,
            lines_cleared: result.lines_cleared,
            points: result.points,
            level_up: result.level_up,
            game_over,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedPieces;
    use crate::types::Rotation;

    fn scripted(kinds: &[PieceKind]) -> Session<ScriptedPieces> {
        Session::with_source(ScriptedPieces::new(kinds.to_vec()))
    }

    #[test]
    fn test_new_session() {
        let session = Session::new(12345);
        assert_eq!(session.status(), Status::Playing);
        assert_eq!(session.score(), 0);
        assert_eq!(session.level(), 1);
        assert_eq!(session.lines(), 0);
        assert_eq!(session.drop_interval_ms(), 1000);
        assert_eq!(session.active().y, 0);
        assert_eq!(session.board().occupied_count(), 0);
    }

    #[test]
    fn test_reset_draws_two_pieces() {
        let mut session = scripted(&[PieceKind::T, PieceKind::S, PieceKind::Z]);
        assert_eq!(session.active().kind, PieceKind::T);
        assert_eq!(session.next(), PieceKind::S);

        let snap = session.reset();
        assert_eq!(snap.active.kind, PieceKind::Z);
        assert_eq!(snap.next, PieceKind::T);
    }

    #[test]
    fn test_move_stops_at_wall() {
        let mut session = scripted(&[PieceKind::I]);
        for _ in 0..10 {
            session.apply_intent(Intent::MoveLeft);
        }
        assert_eq!(session.active().x, 0);

        for _ in 0..10 {
            session.apply_intent(Intent::MoveRight);
        }
        assert_eq!(session.active().x, 6);
    }

    #[test]
    fn test_rotate_commits_kick() {
        let mut session = scripted(&[PieceKind::I]);
        session.apply_intent(Intent::SoftDrop);
        session.apply_intent(Intent::Rotate);
        for _ in 0..4 {
            session.apply_intent(Intent::MoveRight);
        }
        assert_eq!(session.active().rotation, Rotation::East);
        assert_eq!(session.active().x, 7);

        session.apply_intent(Intent::Rotate);
        assert_eq!(session.active().rotation, Rotation::South);
        assert_eq!(session.active().x, 6);
    }

    #[test]
    fn test_tick_requires_exceeding_interval() {
        let mut session = scripted(&[PieceKind::O]);
        session.tick(1000);
        assert_eq!(session.active().y, 0);
        assert_eq!(session.drop_timer_ms(), 1000);

        session.tick(1);
        assert_eq!(session.active().y, 1);
        assert_eq!(session.drop_timer_ms(), 0);
    }

    #[test]
    fn test_soft_drop_resets_timer() {
        let mut session = scripted(&[PieceKind::O]);
        session.tick(600);
        session.apply_intent(Intent::SoftDrop);
        assert_eq!(session.active().y, 1);
        assert_eq!(session.drop_timer_ms(), 0);
    }

    #[test]
    fn test_soft_drop_locks_when_grounded() {
        let mut session = scripted(&[PieceKind::O, PieceKind::T]);
        for _ in 0..18 {
            session.apply_intent(Intent::SoftDrop);
        }
        assert_eq!(session.active().y, 18);
        assert_eq!(session.board().occupied_count(), 0);

        session.apply_intent(Intent::SoftDrop);
        assert_eq!(session.board().occupied_count(), 4);
        assert_eq!(session.active().kind, PieceKind::T);
        assert_eq!(session.active().y, 0);

        let event = session.take_last_event().unwrap();
        assert_eq!(event.kind, PieceKind::O);
        assert_eq!(event.lines_cleared, 0);
        assert!(!event.game_over);
        assert!(session.take_last_event().is_none());
    }

    #[test]
    fn test_hard_drop_lands_and_locks() {
        let mut session = scripted(&[PieceKind::I, PieceKind::O]);
        assert_eq!(session.landing_y(), 19);
        session.apply_intent(Intent::HardDrop);

        let snap = session.snapshot();
        for x in 3..7 {
            assert_eq!(snap.cell(x, 19), Some(Some(PieceKind::I)));
        }
        assert_eq!(snap.active.kind, PieceKind::O);
        assert_eq!(snap.next, PieceKind::I);
        assert_eq!(snap.score, 0);
    }

    #[test]
    fn test_lock_into_top_row_ends_game() {
        let board = Board::from_rows(&["OOOO.OOOOO"; 19]);
        let mut session = Session::with_board(board, ScriptedPieces::new(vec![PieceKind::I]));
        assert_eq!(session.status(), Status::Playing);

        // The I cannot fall past row 0, so it locks there and the next spawn overlaps it.
        session.apply_intent(Intent::SoftDrop);

        assert_eq!(session.status(), Status::GameOver);
        assert_eq!(session.board().occupied_count(), 19 * 9 + 4);
        assert!(session.take_last_event().unwrap().game_over);
    }

    #[test]
    fn test_with_board_spawn_collision_is_game_over() {
        let board = Board::from_rows(&["....OO...."; 20]);
        let session = Session::with_board(board, ScriptedPieces::new(vec![PieceKind::O]));
        assert_eq!(session.status(), Status::GameOver);
    }

    #[test]
    fn test_pause_blocks_everything_but_toggle() {
        let mut session = scripted(&[PieceKind::T]);
        session.tick(500);
        let before = session.apply_intent(Intent::TogglePause);
        assert_eq!(before.status, Status::Paused);

        for intent in [
            Intent::MoveLeft,
            Intent::MoveRight,
            Intent::Rotate,
            Intent::SoftDrop,
            Intent::HardDrop,
        ] {
            assert_eq!(session.apply_intent(intent), before);
        }
        assert_eq!(session.tick(5000), before);

        let resumed = session.apply_intent(Intent::TogglePause);
        assert_eq!(resumed.status, Status::Playing);
        assert_eq!(resumed.timers.drop_ms, 500);
    }

    #[test]
    fn test_game_over_ignores_pause_toggle() {
        let board = Board::from_rows(&["....OO...."; 20]);
        let mut session = Session::with_board(board, ScriptedPieces::new(vec![PieceKind::O]));
        let snap = session.apply_intent(Intent::TogglePause);
        assert_eq!(snap.status, Status::GameOver);

        let snap = session.reset();
        assert_eq!(snap.status, Status::Playing);
        assert_eq!(session.board().occupied_count(), 0);
    }

    #[test]
    fn test_session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Session>();
        assert_send::<Session<ScriptedPieces>>();
    }
}
