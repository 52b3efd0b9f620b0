use timeloop_engine::bridge::protocol::{
    HEADER_EVENT_COUNT, HEADER_FRAME_COUNTER, HEADER_INSTANCE_COUNT, HEADER_LOCK,
};
use timeloop_engine::{
    DrawInstance, FixedTimestep, Game, GameConfig, GameEvent, Hud, InputEvent, InputQueue,
    ProtocolLayout, Renderer,
};

/// Generic game runner that wires up the fixed-timestep loop.
///
/// The crate's `export_game!` macro keeps one GameRunner in a `thread_local!`
/// and exports free functions via `#[wasm_bindgen]`, because wasm-bindgen
/// cannot export generic structs directly.
pub struct GameRunner<G: Game> {
    game: G,
    input: InputQueue,
    timestep: FixedTimestep,
    config: GameConfig,
    layout: ProtocolLayout,
    /// Flat frame buffer read by the host, laid out by `layout`.
    buffer: Vec<f32>,
    /// Events raised during the current frame's ticks.
    events: Vec<GameEvent>,
    instance_count: u32,
    frame_counter: u64,
    initialized: bool,
}

/// Copies instances straight into the instance section of the frame buffer.
struct BufferWriter<'a> {
    section: &'a mut [f32],
    count: usize,
    hud: Hud,
}

impl Renderer for BufferWriter<'_> {
    fn draw(&mut self, instance: &DrawInstance) {
        let start = self.count * DrawInstance::FLOATS;
        let Some(slot) = self.section.get_mut(start..start + DrawInstance::FLOATS) else {
            return;
        };
        slot.copy_from_slice(&instance.to_floats());
        self.count += 1;
    }

    fn hud(&mut self, hud: &Hud) {
        self.hud = *hud;
    }
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Self {
        let config = game.config();
        let timestep = FixedTimestep::new(config.fixed_dt);
        let layout = ProtocolLayout::from_config(&config);
        let buffer = vec![0.0; layout.buffer_total_floats];

        Self {
            game,
            input: InputQueue::new(),
            timestep,
            layout,
            config,
            buffer,
            events: Vec::new(),
            instance_count: 0,
            frame_counter: 0,
            initialized: false,
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        self.config = self.game.config();
        self.timestep = FixedTimestep::new(self.config.fixed_dt);
        self.layout = ProtocolLayout::from_config(&self.config);
        self.buffer = vec![0.0; self.layout.buffer_total_floats];
        self.game.init();
        self.initialized = true;
        self.collect_events();
        self.write_frame();
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Push a browser key code. Unbound keys are ignored.
    pub fn push_key_code(&mut self, code: u32, pressed: bool) {
        if !self.input.push_key_code(code, pressed) {
            log::debug!("unbound key code {}", code);
        }
    }

    /// Run one host frame: as many fixed ticks as `dt` covers, then publish
    /// the last completed tick into the frame buffer.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }
        self.events.clear();

        let steps = self.timestep.accumulate(dt);
        for _ in 0..steps {
            self.game.update(&mut self.input);
            self.collect_events();
        }

        self.write_frame();
    }

    fn collect_events(&mut self) {
        let room = self.layout.max_events.saturating_sub(self.events.len());
        let mut raised = self.game.take_events();
        if raised.len() > room {
            log::warn!("dropping {} game events over capacity", raised.len() - room);
            raised.truncate(room);
        }
        self.events.extend(raised);
    }

    fn write_frame(&mut self) {
        let layout = &self.layout;
        let (head, rest) = self.buffer.split_at_mut(layout.instance_data_offset);
        let (instances, events) = rest.split_at_mut(layout.instance_data_floats);

        let mut writer = BufferWriter {
            section: instances,
            count: 0,
            hud: Hud::default(),
        };
        self.game.render(&mut writer);
        self.instance_count = writer.count as u32;
        let hud = writer.hud;

        for (slot, event) in events.chunks_exact_mut(GameEvent::FLOATS).zip(&self.events) {
            slot.copy_from_slice(&[event.kind, event.a, event.b, event.c]);
        }

        self.frame_counter += 1;
        layout.write_header(head, &self.config, &hud);
        head[HEADER_LOCK] = 0.0;
        head[HEADER_FRAME_COUNTER] = self.frame_counter as f32;
        head[HEADER_INSTANCE_COUNT] = self.instance_count as f32;
        head[HEADER_EVENT_COUNT] = self.events.len() as f32;
    }

    // ---- Pointer accessors for host reads ----

    pub fn buffer_ptr(&self) -> *const f32 {
        self.buffer.as_ptr()
    }

    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn game_events_len(&self) -> u32 {
        self.events.len() as u32
    }

    pub fn world_width(&self) -> f32 {
        self.config.screen_width as f32
    }

    pub fn world_height(&self) -> f32 {
        self.config.screen_height as f32
    }

    // ---- Capacity accessors (read by the host via wasm_bindgen exports) ----

    pub fn max_instances(&self) -> u32 {
        self.layout.max_instances as u32
    }

    pub fn max_events(&self) -> u32 {
        self.layout.max_events as u32
    }

    pub fn buffer_total_floats(&self) -> u32 {
        self.layout.buffer_total_floats as u32
    }

    pub fn instance_data_offset(&self) -> u32 {
        self.layout.instance_data_offset as u32
    }

    pub fn event_data_offset(&self) -> u32 {
        self.layout.event_data_offset as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeloop_engine::bridge::protocol::{HEADER_LEVEL, HEADER_MAX_INSTANCES};
    use timeloop_engine::{DrawKind, PlayState};

    fn runner() -> GameRunner<PlayState> {
        let mut r = GameRunner::new(PlayState::default());
        r.init();
        r
    }

    #[test]
    fn init_publishes_first_frame() {
        let r = runner();
        assert!(r.instance_count() > 0);
        assert_eq!(r.buffer()[HEADER_LEVEL], 1.0);
        assert_eq!(r.buffer()[HEADER_MAX_INSTANCES], 1024.0);
        assert_eq!(r.buffer().len(), r.buffer_total_floats() as usize);
    }

    #[test]
    fn tick_before_init_is_a_no_op() {
        let mut r = GameRunner::new(PlayState::default());
        r.tick(1.0);
        assert_eq!(r.instance_count(), 0);
        assert!(r.buffer().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn instances_are_written_in_wire_order() {
        let mut r = runner();
        r.tick(1.0 / 60.0);
        let offset = r.instance_data_offset() as usize;
        let count = r.instance_count() as usize;
        let section = &r.buffer()[offset..offset + count * DrawInstance::FLOATS];
        let player = section
            .chunks_exact(DrawInstance::FLOATS)
            .filter(|c| c[4] == DrawKind::Player as u8 as f32)
            .count();
        assert_eq!(player, 1);
    }

    #[test]
    fn level_switch_raises_event() {
        let mut r = runner();
        r.push_key_code(50, true);
        r.tick(1.0 / 60.0);
        assert_eq!(r.game_events_len(), 1);
        let at = r.event_data_offset() as usize;
        assert_eq!(r.buffer()[at], GameEvent::LEVEL_LOADED);
        assert_eq!(r.buffer()[at + 1], 2.0);
        assert_eq!(r.buffer()[HEADER_LEVEL], 2.0);
    }

    #[test]
    fn unbound_keys_are_dropped() {
        let mut r = runner();
        r.push_key_code(999, true);
        r.tick(1.0 / 60.0);
        assert_eq!(r.game_events_len(), 0);
    }
}
