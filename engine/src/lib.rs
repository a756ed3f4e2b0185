//! Falling-block simulation engine for a single player's board.
//!
//! This crate is pure game logic: no I/O, no clock, no logging. The host (a
//! browser shell or the headless CLI) owns the frame loop and feeds elapsed
//! time and player commands into a [`session::GameSession`], then forwards the
//! resulting [`session::SessionEvent`]s (board snapshots, the loss notice) to
//! the relay server.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Local session controller: gravity timing, commands, loss reporting |
//! | [`board`] | Grid, active piece, collision, locking, line clears, score |
//! | [`piece`] | Piece kinds, canonical matrices, rotation |
//! | [`bag`] | 7-bag piece supplier and the [`bag::PieceSource`] seam |
//! | [`snapshot`] | Serializable board snapshot relayed to the opponent |
//! | [`consts`] | Grid size, scoring table, timing constants |

pub mod bag;
pub mod board;
pub mod consts;
pub mod piece;
pub mod session;
pub mod snapshot;
