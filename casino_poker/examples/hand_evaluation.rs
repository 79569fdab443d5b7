//! Hand Evaluation Example
//!
//! Ranks hands, compares them and prints a quick equity estimate.
//!
//! Run with `cargo run -p casino_poker --example hand_evaluation`.

use casino_poker::{
    analyze_hand,
    entities::Card,
    estimate_equity,
    functional::{argmax, evaluate_best_hand},
};
use rand::{SeedableRng, rngs::StdRng};

fn cards(s: &str) -> Vec<Card> {
    s.split_whitespace()
        .filter_map(|c| c.parse().ok())
        .collect()
}

fn main() {
    println!("=== Poker Hand Evaluation Example ===\n");

    // Example 1: Evaluate a single hand
    println!("Example 1: Evaluating a 7-card hand");
    let hand = cards("Ah Kh Qh Jh 10h 9s 2c");
    match evaluate_best_hand(&hand) {
        Ok(best) => {
            println!("Cards: {}", format_cards(&hand));
            println!("Best 5 cards: {}", format_cards(&best.cards));
            println!("Description: {}\n", best);
        }
        Err(e) => println!("Could not evaluate: {e}\n"),
    }

    // Example 2: Showdown between three players on a shared board
    println!("Example 2: Three-way showdown");
    let board = cards("Kd 9s 4h 3c Jd");
    let holes = [("alice", "As Ah"), ("bob", "Ks Qc"), ("carol", "9h 9d")];

    let mut rankings = Vec::new();
    for (name, hole) in holes {
        let all: Vec<Card> = cards(hole).into_iter().chain(board.iter().copied()).collect();
        match evaluate_best_hand(&all) {
            Ok(ranking) => {
                println!("{name:>6}: {hole} -> {ranking}");
                rankings.push(ranking);
            }
            Err(e) => println!("{name:>6}: invalid hand ({e})"),
        }
    }
    let winners: Vec<&str> = argmax(&rankings)
        .into_iter()
        .map(|idx| holes[idx].0)
        .collect();
    println!("Winner(s): {}\n", winners.join(", "));

    // Example 3: A split pot where the board plays
    println!("Example 3: The board plays");
    let board = cards("As Ks Qs Js 10s");
    let split: Vec<_> = ["2c 3d", "2h 3s"]
        .iter()
        .filter_map(|hole| {
            let all: Vec<Card> = cards(hole).into_iter().chain(board.iter().copied()).collect();
            evaluate_best_hand(&all).ok()
        })
        .collect();
    println!("Winners: {:?} (both play {})\n", argmax(&split), split[0]);

    // Example 4: Analysis and equity on the flop
    println!("Example 4: Flush draw on the flop");
    let hole = cards("Ah 7h");
    let flop = cards("Kh 9h 2c");
    if let Ok(analysis) = analyze_hand(&hole, &flop) {
        println!("Made hand: {} ({} tier)", analysis.category, analysis.tier);
        for draw in &analysis.draws {
            println!("Drawing to: {draw}");
        }
    }
    let mut rng = StdRng::seed_from_u64(7);
    match estimate_equity(&hole, &flop, 1, 2_000, &mut rng) {
        Ok(equity) => println!("Equity vs one random hand: {:.1}%", equity * 100.0),
        Err(e) => println!("Could not estimate equity: {e}"),
    }

    println!("\n=== End of Hand Evaluation Example ===");
}

fn format_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
