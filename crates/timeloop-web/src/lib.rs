pub mod runner;

pub use runner::GameRunner;

use timeloop_engine::PlayState;
use wasm_bindgen::prelude::*;

/// Generate all `#[wasm_bindgen]` exports for a game.
///
/// Generates:
/// - `thread_local!` storage for the GameRunner
/// - `with_runner()` helper function
/// - All wasm-bindgen exports (game_init, game_tick, input handlers, data accessors)
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
/// use timeloop_web::GameRunner;
///
/// timeloop_web::export_game!(MyGame, "my-game", MyGame::new);
/// ```
///
/// # Arguments
///
/// - `$game_type`: The game struct type that implements `timeloop_engine::Game`
/// - `$game_name`: A string literal used in the initialization log message
/// - `$ctor`: Builds the game from a `GameConfig`
#[macro_export]
macro_rules! export_game {
    ($game_type:ty, $game_name:literal, $ctor:expr) => {
        use std::cell::RefCell;

        thread_local! {
            static RUNNER: RefCell<Option<$crate::GameRunner<$game_type>>> = RefCell::new(None);
        }

        /// Runs `f` against the runner. Before `game_init` this logs and
        /// returns the default value.
        fn with_runner<R: Default>(f: impl FnOnce(&mut $crate::GameRunner<$game_type>) -> R) -> R {
            RUNNER.with(|cell| match cell.borrow_mut().as_mut() {
                Some(runner) => f(runner),
                None => {
                    log::warn!("game not initialized, call game_init() first");
                    R::default()
                }
            })
        }

        /// Build and start the game. `config_json` may be empty for defaults.
        #[wasm_bindgen]
        pub fn game_init(config_json: &str) -> Result<(), JsValue> {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);

            let config = if config_json.trim().is_empty() {
                timeloop_engine::GameConfig::default()
            } else {
                timeloop_engine::GameConfig::from_json(config_json)
                    .map_err(|e| js_sys::Error::new(&format!("bad config: {}", e)))?
            };

            let build: fn(timeloop_engine::GameConfig) -> $game_type = $ctor;
            let runner = $crate::GameRunner::new(build(config));

            RUNNER.with(|cell| {
                *cell.borrow_mut() = Some(runner);
            });

            with_runner(|r| r.init());
            log::info!("{}: initialized", $game_name);
            Ok(())
        }

        #[wasm_bindgen]
        pub fn game_tick(dt: f32) {
            with_runner(|r| r.tick(dt));
        }

        #[wasm_bindgen]
        pub fn game_key_down(key_code: u32) {
            with_runner(|r| r.push_key_code(key_code, true));
        }

        #[wasm_bindgen]
        pub fn game_key_up(key_code: u32) {
            with_runner(|r| r.push_key_code(key_code, false));
        }

        /// Hand over the sprite manifest. Names missing from it are drawn as
        /// flat colours.
        #[wasm_bindgen]
        pub fn game_load_manifest(json: &str) -> Result<(), JsValue> {
            let manifest = timeloop_engine::AssetManifest::from_json(json)
                .map_err(|e| js_sys::Error::new(&format!("bad manifest: {}", e)))?;
            let cache = timeloop_engine::AssetCache::from_manifest(&manifest);
            log::info!("manifest loaded: {} sprites", cache.len());
            with_runner(|r| timeloop_engine::Game::load_assets(r.game_mut(), cache));
            Ok(())
        }

        // ---- Data accessors ----

        #[wasm_bindgen]
        pub fn get_buffer_ptr() -> *const f32 {
            RUNNER.with(|cell| {
                cell.borrow()
                    .as_ref()
                    .map_or(std::ptr::null(), |runner| runner.buffer_ptr())
            })
        }

        /// Copy of the whole frame buffer, for hosts without shared memory.
        #[wasm_bindgen]
        pub fn get_buffer_copy() -> js_sys::Float32Array {
            RUNNER.with(|cell| match cell.borrow().as_ref() {
                Some(runner) => js_sys::Float32Array::from(runner.buffer()),
                None => js_sys::Float32Array::new_with_length(0),
            })
        }

        #[wasm_bindgen]
        pub fn get_instance_count() -> u32 {
            with_runner(|r| r.instance_count())
        }

        #[wasm_bindgen]
        pub fn get_game_events_len() -> u32 {
            with_runner(|r| r.game_events_len())
        }

        #[wasm_bindgen]
        pub fn get_world_width() -> f32 {
            with_runner(|r| r.world_width())
        }

        #[wasm_bindgen]
        pub fn get_world_height() -> f32 {
            with_runner(|r| r.world_height())
        }

        // ---- Capacity accessors ----

        #[wasm_bindgen]
        pub fn get_max_instances() -> u32 {
            with_runner(|r| r.max_instances())
        }

        #[wasm_bindgen]
        pub fn get_max_events() -> u32 {
            with_runner(|r| r.max_events())
        }

        #[wasm_bindgen]
        pub fn get_buffer_total_floats() -> u32 {
            with_runner(|r| r.buffer_total_floats())
        }

        #[wasm_bindgen]
        pub fn get_instance_data_offset() -> u32 {
            with_runner(|r| r.instance_data_offset())
        }

        #[wasm_bindgen]
        pub fn get_event_data_offset() -> u32 {
            with_runner(|r| r.event_data_offset())
        }
    };
}

export_game!(PlayState, "timeloop", PlayState::new);
