use parlor_core::{HandSign, Session};

fn main() {
    // Example end-to-end session: a few rounds, then reveal for verification.
    let mut session = Session::new("example-server-seed", "example-client-seed");
    println!("commit: {}", session.server_seed_hash());

    for (sign, bet) in [
        (HandSign::Rock, 100.0),
        (HandSign::Paper, 250.0),
        (HandSign::Scissors, 50.0),
    ] {
        let receipt = session.play(sign, bet, None).expect("round");
        println!(
            "nonce={} player={} system={} outcome={} payout={} hash={}",
            receipt.record.nonce,
            receipt.record.player.as_str(),
            receipt.record.system.as_str(),
            receipt.record.outcome.as_str(),
            receipt.record.payout,
            receipt.record.hash,
        );
    }

    let server_seed = session.reveal();
    println!("revealed seed: {server_seed} (recompute the hashes above to audit)");
}
