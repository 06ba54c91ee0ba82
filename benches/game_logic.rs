use criterion::{black_box, criterion_group, criterion_main, Criterion};
use arcade_blocks::core::{try_rotate, Board, GameSnapshot, Piece, Session};
use arcade_blocks::engine::{Driver, DriverConfig};
use arcade_blocks::types::{Intent, PieceKind, Rotation};

fn bench_tick(c: &mut Criterion) {
    let mut session = Session::new(12345);

    c.bench_function("session_tick_16ms", |b| {
        b.iter(|| {
            session.tick(black_box(16));
        })
    });
}

fn bench_line_clear(c: &mut Criterion) {
    c.bench_function("clear_4_lines", |b| {
        b.iter(|| {
            let mut board = Board::new();
            for y in 16..20 {
                for x in 0..10 {
                    board.write_cell(x, y, PieceKind::I);
                }
            }
            board.clear_full_rows();
        })
    });
}

fn bench_try_rotate(c: &mut Criterion) {
    let board = Board::from_rows(&["IIIIIII...", "IIIIIII...", "IIIIIII...", "IIIIIII..."]);
    let piece = Piece {
        kind: PieceKind::I,
        rotation: Rotation::East,
        x: 7,
        y: 12,
    };

    c.bench_function("try_rotate_with_kick", |b| {
        b.iter(|| try_rotate(black_box(&board), black_box(&piece)))
    });
}

fn bench_hard_drop_game(c: &mut Criterion) {
    c.bench_function("hard_drop_until_game_over", |b| {
        b.iter(|| {
            let mut session = Session::new(7);
            while session.snapshot().playable() {
                session.apply_intent(Intent::HardDrop);
            }
            session.score()
        })
    });
}

fn bench_driver_advance(c: &mut Criterion) {
    let mut driver = Driver::new(Session::new(99), DriverConfig::default());
    let mut frames = 0u64;

    c.bench_function("driver_advance_frame", |b| {
        b.iter(|| {
            driver.send_intent(Intent::MoveLeft);
            driver.advance(black_box(16), &mut |_: &GameSnapshot| frames += 1);
        })
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_line_clear,
    bench_try_rotate,
    bench_hard_drop_game,
    bench_driver_advance
);
criterion_main!(benches);
