use std::env;

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_babble_core::io::read_file;
use rs_babble_core::{Engine, MemoryBackend, ReplyOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Group name, also the name of the training file in "./data" (one message per line)
    let group = env::args().nth(1).unwrap_or_else(|| "french".to_owned());
    let lines = read_file(format!("./data/{group}.txt"))?;

    // Corpora live in memory only; use JsonFileBackend to keep them across runs
    let engine = Engine::with_backend(MemoryBackend::new());

    let mut learned = 0;
    for line in &lines {
        match engine.ingest(&group, line) {
            Ok(true) => learned += 1,
            Ok(false) => (),
            Err(e) => warn!("Skipping line: {e}"),
        }
    }
    info!("Learned {learned} of {} lines into group '{group}'", lines.len());

    // Reply policy belongs to the caller
    let mut options = ReplyOptions::default();

    // Maximum number of walk steps per reply
    options.max_len = 25;

    // Half of the replies try to start from a word of the seed text
    options.seed_probability = 0.5;

    // Words shorter than this are never used as seeds
    options.min_seed_len = 3;

    // A fixed seed gives the same replies on every run
    let mut rng = StdRng::seed_from_u64(42);

    // Generate 10 replies, reusing the previous reply as seed text
    let mut seed_text = lines.first().cloned();
    for i in 0..10 {
        let reply = engine.generate_reply(&group, seed_text.as_deref(), &options, &mut rng);
        println!("Generated reply {}: {}", i + 1, reply);
        seed_text = reply.is_text().then(|| reply.into_string());
    }

    // An unknown group has nothing to say
    println!("Unknown group: {}", engine.generate_reply("nobody", None, &options, &mut rng));

    Ok(())
}
