//! Arena Survivor headless driver
//!
//! Plays a full run on autopilot at a fixed 60 Hz step and logs the outcome.
//! Usage: `arena-survivor [seed] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use arena_survivor::consts::SIM_DT;
    use arena_survivor::sim::{GameEvent, GamePhase, GameState, MAX_TIER, TickInput, tick};
    use arena_survivor::Tuning;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            log::error!("Invalid seed: {}", e);
            std::process::exit(2);
        }
        None => 12345,
    };
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning from {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => Tuning::default(),
    };

    log::info!("Arena Survivor (headless) starting with seed {}", seed);
    let mut state = GameState::with_tuning(seed, tuning);
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    // One hour of simulated time
    let max_steps = (3600.0 / SIM_DT) as u64;
    let mut steps = 0;
    while state.phase == GamePhase::Playing && steps < max_steps {
        tick(&mut state, &input, SIM_DT);
        steps += 1;

        if state.shop_open() {
            // Buy every tier we can afford, then move on
            while state.progression.tier < MAX_TIER {
                if state.purchase_tier(state.progression.tier + 1).is_err() {
                    break;
                }
            }
            state.close_upgrade_shop();
        }

        for event in state.drain_events() {
            if let GameEvent::LevelUp { level } = event {
                log::info!("Reached level {}", level);
            }
        }
    }

    let record = state.run_record();
    match serde_json::to_string(&record) {
        Ok(json) => log::info!("Run finished after {} steps: {}", steps, json),
        Err(e) => log::error!("Failed to encode run record: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is `web::start`, this is just to satisfy the compiler
}
