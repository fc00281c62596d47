//! Probe harness: fingerprint a position, embody a tree root for it, and
//! print the deadline schedule the clock would run for the side to move.
//!
//! Usage: `larice [FEN]`, defaulting to the starting position.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use larice_core::{Position, STARTING_FEN, Zobrist};
use larice_search::{Clock, NodeArena, Options, SearchProgress, SearchTree, Trend};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    info!("larice probe starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let fen = if args.is_empty() {
        STARTING_FEN.to_string()
    } else {
        args.join(" ")
    };

    let position: Position = fen.parse().with_context(|| format!("invalid FEN: {fen}"))?;
    let zobrist = Zobrist::new();
    println!("position:    {position}");
    println!("fingerprint: {:#018x}", zobrist.hash(&position));

    let tree = SearchTree::new(NodeArena::new(64), zobrist, true);
    let root = tree.embodied_root(&position)?;
    {
        let state = tree.lock();
        println!(
            "arena:       {} of {} slots used, root embodied",
            state.arena().used(),
            state.arena().capacity()
        );
        assert_eq!(state.root(), Some(root));
    }

    // Simulated schedule: one minute on the clock, no increment, a
    // middling material score, telemetry arriving as the search deepens.
    let options = Arc::new(Options::new());
    let mut clock = Clock::new(options);
    let side = position.side_to_move();
    clock.set_time(side, 60_000);
    clock.set_increment(side, 0);
    clock.set_material_score(10);
    clock.start_deadline(side);
    println!(
        "deadline:    {:?} ms before any telemetry",
        clock.time_to_deadline()
    );

    for depth in [3u32, 5, 8] {
        clock.update_deadline(
            &SearchProgress {
                depth,
                trend: Trend::NotImproving,
                trend_degree: 0.1,
            },
            false,
        );
        println!(
            "deadline:    {:?} ms at depth {depth} (trend factor {})",
            clock.time_to_deadline(),
            clock.trend_factor()
        );
    }

    Ok(())
}
