//! The play state: owns one level, the player, the rewind recorder and the
//! countdown, and advances them in a fixed order once per tick.

use std::time::Duration;

use glam::Vec2;

use crate::api::game::{Game, GameConfig};
use crate::api::types::{EntityId, GameEvent};
use crate::assets::registry::AssetCache;
use crate::components::button::ButtonKind;
use crate::components::player::{CarriedBody, Direction, Player, PLAYER_ID};
use crate::core::level::Level;
use crate::core::time::GameClock;
use crate::core::timer::TimerManager;
use crate::input::queue::{InputEvent, InputQueue, Key};
use crate::levels::{BuiltinLevels, LevelSource};
use crate::renderer::instance::{Frame, FrameSnapshot, Hud};
use crate::renderer::traits::{draw_frame, Renderer};
use crate::systems::render::build_frame;
use crate::systems::rewind::{RewindManager, RewindState};

pub struct PlayState<S: LevelSource = BuiltinLevels> {
    config: GameConfig,
    source: S,
    tick: Duration,
    clock: GameClock,
    timer: TimerManager,
    level: Level,
    player: Player,
    rewind: RewindManager,
    /// Buttons and boxes within reach, refreshed every tick.
    highlighted: Vec<EntityId>,
    snapshot: FrameSnapshot,
    assets: AssetCache,
    events: Vec<GameEvent>,
    game_over: bool,
    paused: bool,
}

impl PlayState<BuiltinLevels> {
    pub fn new(config: GameConfig) -> Self {
        Self::with_source(config, BuiltinLevels)
    }
}

impl Default for PlayState<BuiltinLevels> {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl<S: LevelSource> PlayState<S> {
    /// Build a play state with nothing loaded. `init` loads the start level.
    pub fn with_source(config: GameConfig, source: S) -> Self {
        let level = Level::new(0, &config);
        let cell = config.cell_size;
        let player = Player::new(cell, cell, config.player_speed, level.grid().screen_size());
        Self {
            tick: Duration::try_from_secs_f32(config.fixed_dt).unwrap_or_default(),
            clock: GameClock::new(),
            timer: TimerManager::from_secs(config.timer_secs),
            rewind: RewindManager::new(config.rewind_capacity()),
            level,
            player,
            highlighted: Vec::new(),
            snapshot: FrameSnapshot::new(),
            assets: AssetCache::new(),
            events: Vec::new(),
            game_over: false,
            paused: false,
            config,
            source,
        }
    }

    pub fn with_assets(mut self, assets: AssetCache) -> Self {
        self.assets = assets;
        self
    }

    pub fn set_assets(&mut self, assets: AssetCache) {
        self.assets = assets;
    }

    // -- Accessors --

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn rewind(&self) -> &RewindManager {
        &self.rewind
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn timer(&self) -> &TimerManager {
        &self.timer
    }

    pub fn highlighted(&self) -> &[EntityId] {
        &self.highlighted
    }

    /// The last completed frame.
    pub fn frame(&self) -> &Frame {
        self.snapshot.front()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // -- Level lifecycle --

    /// Replace the current level with `index`. Unknown levels leave the
    /// session untouched and return false.
    pub fn load_level(&mut self, index: u32) -> bool {
        let Some(next) = self.source.build(index, &self.config) else {
            log::warn!("no level {}, staying on level {}", index, self.level.index);
            return false;
        };
        self.rewind.reset(&mut self.level);
        self.level = next;
        self.rewind.track_boxes(&self.level);

        self.player.set_area(self.level.grid().screen_size());
        self.player.place_at(self.level.spawn_pos());
        self.player.set_carried(None);
        self.player.freeze();

        self.timer.reset();
        self.timer.start();
        self.game_over = false;
        self.paused = false;
        self.highlighted.clear();

        log::info!("level {} loaded", index);
        self.events
            .push(GameEvent::new(GameEvent::LEVEL_LOADED, index as f32, 0.0, 0.0));
        self.publish();
        true
    }

    /// Rebuild the current level from scratch. Also leaves game over.
    pub fn reset_level(&mut self) -> bool {
        self.load_level(self.level.index)
    }

    // -- Input --

    pub fn key_pressed(&mut self, key: Key) {
        match key {
            Key::Reset => {
                self.reset_level();
            }
            Key::SelectLevel(n) => {
                self.load_level(n as u32);
            }
            _ if self.game_over => {}
            Key::Pause => {
                self.paused = !self.paused;
                log::info!("paused: {}", self.paused);
            }
            _ if self.paused => {}
            Key::Left => self.player.set_direction(Direction::Left, true),
            Key::Right => self.player.set_direction(Direction::Right, true),
            Key::Up => self.player.set_direction(Direction::Up, true),
            Key::Down => self.player.set_direction(Direction::Down, true),
            Key::Interact => self.interact(),
            Key::RewindToggle => self.toggle_rewind(),
        }
    }

    pub fn key_released(&mut self, key: Key) {
        match key {
            Key::Left => self.player.set_direction(Direction::Left, false),
            Key::Right => self.player.set_direction(Direction::Right, false),
            Key::Up => self.player.set_direction(Direction::Up, false),
            Key::Down => self.player.set_direction(Direction::Down, false),
            _ => {}
        }
    }

    pub fn toggle_rewind(&mut self) {
        let before = self.rewind.state();
        self.rewind.toggle(&mut self.player, &mut self.level);
        self.note_rewind_change(before);
    }

    /// Press every pressable button in reach, then drop the held box or pick
    /// up the closest one.
    pub fn interact(&mut self) {
        let now = self.clock.now();
        let buttons: Vec<EntityId> = self
            .level
            .iter()
            .filter(|e| e.active)
            .filter(|e| e.button().is_some_and(|b| b.kind == ButtonKind::Pressable))
            .filter(|e| self.in_reach(e.center()))
            .map(|e| e.id)
            .collect();
        for id in buttons {
            if self.level.activate_button(id, now) {
                log::debug!("button {:?} pressed", id);
            }
        }

        if self.player.carried().is_some() {
            self.drop_carried();
        } else {
            self.pick_up_nearest();
        }
    }

    fn drop_carried(&mut self) {
        let Some(id) = self.player.carried() else {
            return;
        };
        let center = self.player.center();
        if let Some(entity) = self.level.get_mut(id) {
            entity.update_carried_position(center);
            if entity.drop_carried() {
                self.rewind.record_box_interaction(id, false);
                self.events
                    .push(GameEvent::new(GameEvent::BOX_CARRY, id.0 as f32, 0.0, 0.0));
            }
        }
        self.player.set_carried(None);
    }

    fn pick_up_nearest(&mut self) {
        let center = self.player.center();
        let rewinding = self.rewind.is_rewinding();
        let candidate = self
            .level
            .boxes()
            .filter(|e| e.active && self.in_reach(e.center()))
            .filter_map(|e| {
                let carry = e.carry()?;
                let free = !carry.is_carried();
                let in_playback = rewinding && carry.rewinding && carry.carrier().is_none();
                (carry.movable && (free || in_playback))
                    .then(|| (e.id, e.center().distance_squared(center)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id);
        let Some(id) = candidate else {
            return;
        };

        if rewinding {
            self.rewind.release_box(id, &mut self.level);
        }
        let picked = self
            .level
            .get_mut(id)
            .is_some_and(|e| e.pick_up(center, Some(PLAYER_ID)));
        if picked {
            self.player.set_carried(Some(id));
            self.rewind.record_box_interaction(id, true);
            self.events
                .push(GameEvent::new(GameEvent::BOX_CARRY, id.0 as f32, 1.0, 0.0));
        }
    }

    /// Within one cell of the player center on both axes.
    fn in_reach(&self, point: Vec2) -> bool {
        let reach = self.level.cell_size() as f32;
        let d = (point - self.player.center()).abs();
        d.x <= reach && d.y <= reach
    }

    fn note_rewind_change(&mut self, before: RewindState) {
        let after = self.rewind.state();
        if after != before {
            self.events
                .push(GameEvent::new(GameEvent::REWIND_STATE, after.as_f32(), 0.0, 0.0));
        }
    }

    // -- Tick --

    fn step(&mut self) {
        self.clock.advance(self.tick);
        self.timer.update(self.tick);
        if self.timer.is_expired() {
            self.enter_game_over();
            return;
        }
        let now = self.clock.now();

        self.level.sync_doors();

        let before = self.rewind.state();
        self.rewind.update(&mut self.player, &mut self.level);
        self.note_rewind_change(before);

        self.level.update_timers(now);
        self.level.update_weighted_buttons(now);
        self.level.update(now);

        self.player.set_obstacles(self.level.player_obstacles());
        self.player.set_carried_body(self.carried_body());
        if !self.rewind.is_rewinding() {
            self.player.update(self.config.fixed_dt);
        }

        self.sync_carried();
        self.refresh_proximity();
        self.check_door_entry();
    }

    fn enter_game_over(&mut self) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.player.freeze();
        log::info!("time up on level {}", self.level.index);
        self.events.push(GameEvent::new(
            GameEvent::GAME_OVER,
            self.level.index as f32,
            0.0,
            0.0,
        ));
    }

    /// Footprint of the box the player holds, so movement can keep it out of
    /// walls and closed doors.
    fn carried_body(&self) -> Option<CarriedBody> {
        let entity = self.level.get(self.player.carried()?)?;
        Some(CarriedBody {
            offset: entity.pos - self.player.pos,
            width: entity.width,
            height: entity.height,
        })
    }

    /// Pull the held box onto the player's post-movement position.
    fn sync_carried(&mut self) {
        let Some(id) = self.player.carried() else {
            return;
        };
        let center = self.player.center();
        match self.level.get_mut(id) {
            Some(entity) if entity.carry().and_then(|c| c.carrier()) == Some(PLAYER_ID) => {
                entity.update_carried_position(center);
            }
            _ => self.player.set_carried(None),
        }
    }

    fn refresh_proximity(&mut self) {
        let near: Vec<EntityId> = self
            .level
            .iter()
            .filter(|e| e.active && (e.button().is_some() || e.is_box()))
            .filter(|e| self.in_reach(e.center()))
            .map(|e| e.id)
            .collect();
        self.highlighted = near;
    }

    /// Walking onto an open exit door loads the level it leads to.
    fn check_door_entry(&mut self) {
        let center = self.player.center();
        let reach = self.player.width as f32 / 2.0;
        let target = self
            .level
            .open_doors()
            .filter(|e| e.center().distance(center) < reach)
            .find_map(|e| e.door_id().and_then(|id| self.level.exit_for(id)));
        if let Some(next) = target {
            log::info!("exit reached on level {}, loading {}", self.level.index, next);
            self.load_level(next);
        }
    }

    fn publish(&mut self) {
        let frame = self.snapshot.begin();
        build_frame(
            frame,
            &self.player,
            &self.level,
            &self.highlighted,
            &mut self.assets,
        );
        let capacity = self.rewind.capacity();
        frame.hud = Hud {
            level: self.level.index,
            remaining_secs: self.timer.remaining_secs(),
            rewind_state: self.rewind.state().as_f32(),
            rewind_fill: if capacity == 0 {
                0.0
            } else {
                self.rewind.len() as f32 / capacity as f32
            },
            game_over: self.game_over,
            paused: self.paused,
        };
        self.snapshot.publish();
    }
}

impl<S: LevelSource> Game for PlayState<S> {
    fn config(&self) -> GameConfig {
        self.config.clone()
    }

    fn init(&mut self) {
        self.clock.reset();
        self.events.clear();
        if !self.load_level(self.config.start_level) {
            log::warn!("start level {} missing, trying level 1", self.config.start_level);
            self.load_level(1);
        }
    }

    fn update(&mut self, input: &mut InputQueue) {
        for event in input.drain() {
            match event {
                InputEvent::Pressed(key) => self.key_pressed(key),
                InputEvent::Released(key) => self.key_released(key),
            }
        }
        if !self.game_over && !self.paused {
            self.step();
        }
        self.publish();
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        draw_frame(self.snapshot.front(), renderer);
    }

    fn load_assets(&mut self, assets: AssetCache) {
        self.set_assets(assets);
        self.publish();
    }

    fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
