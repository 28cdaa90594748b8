//! wasm-bindgen surface for the browser client
//!
//! The page owns rendering, audio and the DOM. Each animation frame it sets
//! the input, calls `step`, then reads `snapshot_json` and drains events.

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::sim::{GameState, Snapshot, TickInput, tick};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) is harmless
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Arena Survivor core loaded");
}

fn seed_or_now(seed: Option<f64>) -> u64 {
    seed.unwrap_or_else(js_sys::Date::now) as u64
}

/// A running game owned by the page
#[wasm_bindgen]
pub struct WebArena {
    state: GameState,
    input: TickInput,
}

#[wasm_bindgen]
impl WebArena {
    /// New run; seeds from the clock when `seed` is omitted
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<f64>) -> WebArena {
        let seed = seed_or_now(seed);
        log::info!("Game initialized with seed: {}", seed);
        WebArena {
            state: GameState::new(seed),
            input: TickInput::default(),
        }
    }

    /// New run with a (possibly partial) JSON tuning file
    #[wasm_bindgen(js_name = withTuning)]
    pub fn with_tuning(json: &str, seed: Option<f64>) -> Result<WebArena, JsValue> {
        let tuning = Tuning::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WebArena {
            state: GameState::with_tuning(seed_or_now(seed), tuning),
            input: TickInput::default(),
        })
    }

    /// Latch input for the next step. `dash` is consumed by that step.
    #[wasm_bindgen(js_name = setInput)]
    #[allow(clippy::too_many_arguments)]
    pub fn set_input(
        &mut self,
        move_x: f32,
        move_z: f32,
        aim_x: f32,
        aim_z: f32,
        fire: bool,
        slash: bool,
        dash: bool,
    ) {
        self.input.move_dir = Vec2::new(move_x, move_z);
        self.input.aim = Some(Vec2::new(aim_x, aim_z));
        self.input.fire = fire;
        self.input.slash = slash;
        self.input.dash |= dash;
    }

    #[wasm_bindgen(js_name = setIdle)]
    pub fn set_idle(&mut self, idle: bool) {
        self.input.idle_mode = idle;
    }

    #[wasm_bindgen(js_name = togglePause)]
    pub fn toggle_pause(&mut self) {
        self.input.pause = true;
    }

    /// Advance one frame of `dt` seconds
    pub fn step(&mut self, dt: f32) {
        tick(&mut self.state, &self.input, dt);
        // Clear one-shot inputs after processing
        self.input.pause = false;
        self.input.dash = false;
    }

    #[wasm_bindgen(js_name = shopOpen)]
    pub fn shop_open(&self) -> bool {
        self.state.shop_open()
    }

    /// Buy `tier`; rejects with a readable reason
    #[wasm_bindgen(js_name = purchaseTier)]
    pub fn purchase_tier(&mut self, tier: u8) -> Result<u8, JsValue> {
        self.state
            .purchase_tier(tier)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = closeShop)]
    pub fn close_shop(&mut self) {
        self.state.close_upgrade_shop();
    }

    pub fn restart(&mut self, seed: Option<f64>) {
        self.state.restart(seed_or_now(seed));
        self.input = TickInput::default();
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        Snapshot::capture(&self.state)
            .to_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Events since the last drain, as a JSON array
    #[wasm_bindgen(js_name = drainEventsJson)]
    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        let events = self.state.drain_events();
        serde_json::to_string(&events).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
