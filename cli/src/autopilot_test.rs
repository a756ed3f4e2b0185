use super::*;
use engine::bag::{Bag, FixedSequence};
use engine::piece::PieceKind;
use engine::session::{DropCurve, GameSession};

fn fill_row_except(grid: &mut Grid, y: i32, gaps: &[i32]) {
    for x in 0..10 {
        if !gaps.contains(&x) {
            grid.set(x, y, 8);
        }
    }
}

fn session_over(grid: Grid, kinds: Vec<PieceKind>) -> GameSession {
    let board = Board::with_grid(grid, Box::new(FixedSequence::new(kinds)));
    GameSession::with_board(board, DropCurve::default())
}

// =============================================================================
// evaluate / best_plan
// =============================================================================

#[test]
fn empty_grid_scores_only_cleared_lines() {
    let grid = Grid::new();
    assert!(evaluate(&grid, 0).abs() < f64::EPSILON);
    assert!(evaluate(&grid, 2) > evaluate(&grid, 1));
}

#[test]
fn holes_and_height_lower_the_value() {
    let mut flat = Grid::new();
    fill_row_except(&mut flat, 19, &[0]);

    let mut holed = flat.clone();
    holed.set(0, 18, 8);

    assert!(evaluate(&holed, 0) < evaluate(&flat, 0));
}

#[test]
fn square_fills_two_wide_gap() {
    let mut grid = Grid::new();
    fill_row_except(&mut grid, 19, &[4, 5]);
    let mut piece = Piece::new(PieceKind::O);
    piece.x = 4;

    let plan = best_plan(&grid, &piece).expect("a placement exists");

    assert_eq!(plan, Plan { rotations: 0, target_x: 4 });
}

#[test]
fn line_piece_stands_up_in_the_well() {
    let mut grid = Grid::new();
    for y in 16..20 {
        fill_row_except(&mut grid, y, &[9]);
    }
    let mut piece = Piece::new(PieceKind::I);
    piece.x = 3;

    let plan = best_plan(&grid, &piece).expect("a placement exists");

    // One clockwise turn puts the cells in matrix column 2.
    assert_eq!(plan, Plan { rotations: 1, target_x: 7 });
}

// =============================================================================
// Autopilot
// =============================================================================

#[test]
fn pilot_clears_four_rows_with_line_piece() {
    let mut grid = Grid::new();
    for y in 16..20 {
        fill_row_except(&mut grid, y, &[9]);
    }
    let mut session = session_over(grid, vec![PieceKind::I]);
    let mut pilot = Autopilot::new();

    let mut commands = Vec::new();
    while let Some(command) = pilot.next_command(session.board()) {
        session.apply(command);
        commands.push(command);
        if command == Command::HardDrop {
            break;
        }
    }

    assert_eq!(commands.first(), Some(&Command::RotateClockwise));
    assert_eq!(commands.last(), Some(&Command::HardDrop));
    assert_eq!(session.score(), 1200);
    assert_eq!(session.board().grid().occupied(), 0);
}

#[test]
fn pilot_stops_on_locked_board() {
    let mut grid = Grid::new();
    grid.set(4, 1, 8);
    let board = Board::with_grid(grid, Box::new(FixedSequence::new(vec![PieceKind::O])));
    assert!(board.is_locked());

    assert_eq!(Autopilot::new().next_command(&board), None);
}

#[test]
fn pilot_replans_after_gravity_locks_a_piece() {
    let mut session = session_over(Grid::new(), vec![PieceKind::O, PieceKind::T]);
    let mut pilot = Autopilot::new();

    // Plan for the square at spawn, then let gravity land it untouched.
    let first = pilot.next_command(session.board());
    assert!(first.is_some());
    while session.board().active().is_some_and(|piece| piece.kind == PieceKind::O) {
        session.apply(Command::SoftDrop);
    }

    // Fresh piece at the top: the pilot plans again instead of
    // continuing the stale plan.
    let board = session.board();
    let active = board.active().expect("next piece spawned");
    assert_eq!(active.kind, PieceKind::T);
    let expected = Autopilot::new().next_command(board);
    assert!(expected.is_some());
    assert_eq!(pilot.next_command(board), expected);
}

#[test]
fn pilot_survives_a_seeded_run() {
    let board = Board::with_source(Box::new(Bag::seeded(7)));
    let mut session = GameSession::with_board(board, DropCurve::default());
    let mut pilot = Autopilot::new();

    let mut placed = 0;
    for _ in 0..10_000 {
        let Some(command) = pilot.next_command(session.board()) else {
            break;
        };
        session.apply(command);
        if command == Command::HardDrop {
            placed += 1;
            if placed == 20 {
                break;
            }
        }
    }

    assert_eq!(placed, 20);
    assert!(!session.is_over());
}
