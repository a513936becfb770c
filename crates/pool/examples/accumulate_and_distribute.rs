//! Basic usage example for the Ember pool engine
//!
//! Demonstrates a full accumulation-to-distribution cycle:
//! - Users burn collectibles into the shared pool
//! - Rank and projected rank queries
//! - Threshold-triggered 85/15 distribution with charity allocation

use ember_ledger::{LedgerStore, MemoryLedger};
use ember_pool::PoolEngine;
use ember_types::{PoolParams, SystemClock, TokenRef, UserId};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Ember Pool - Accumulate & Distribute Example\n");

    let params = PoolParams {
        target_total: 1_000,
        ..Default::default()
    };
    println!("Pool Parameters:");
    println!("  Target: {} tokens", params.target_total);
    println!(
        "  Split: {}% contributors / {}% charity",
        params.contributor_bps / 100,
        params.charity_bps / 100
    );
    println!("  Payout cutoff: top {}\n", params.top_k);

    let ledger = Arc::new(MemoryLedger::new(params.target_total, 0));
    let engine = PoolEngine::new(ledger.clone(), params, Arc::new(SystemClock))?;

    // The wider token economy grants spendable balances
    let (ada, ben, cleo) = (UserId(1), UserId(2), UserId(3));
    for user in [ada, ben, cleo] {
        ledger.credit_balance(user, 1_000)?;
    }

    // Burns accumulate into the round
    for (user, amount, collectible) in [
        (ada, 600, "nft:aurora/12"),
        (ben, 300, "nft:willow/3"),
        (cleo, 50, "nft:tide/44"),
    ] {
        let receipt = engine.contribute(user, amount, &TokenRef::new(collectible))?;
        println!(
            "{user} burned {amount} ({collectible}) -> total {}, rank {}",
            receipt.new_total, receipt.new_rank
        );
    }

    let projected = engine.projected_rank(cleo, 300);
    println!("\n{cleo} would reach rank {projected} by burning 300 more");

    let stats = engine.pool_stats()?;
    println!(
        "Pool: {}/{} ({:.0}%), {} contributors, {} burned today\n",
        stats.current_total,
        stats.target_total,
        stats.progress * 100.0,
        stats.contributor_count,
        stats.today_burned
    );

    // The last burn pushes the pool to its target
    engine.contribute(cleo, 50, &TokenRef::new("nft:tide/45"))?;
    match engine.maybe_distribute()? {
        Some(plan) => {
            println!("Round {} distributed:", plan.round.id);
            for payout in &plan.payouts {
                println!(
                    "  rank {} {} -> {} tokens ({}%)",
                    payout.rank,
                    payout.user,
                    payout.amount,
                    payout.share_bps / 100
                );
            }
            println!("  charity -> {} tokens", plan.charity.amount);
        }
        None => println!("Pool target not reached yet"),
    }

    let stats = engine.pool_stats()?;
    println!(
        "\nNew round {} open, progress {:.0}%",
        stats.round_id,
        stats.progress * 100.0
    );
    Ok(())
}
