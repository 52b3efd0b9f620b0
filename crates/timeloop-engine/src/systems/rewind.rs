//! Record-and-rewind.
//!
//! While recording, the manager samples the player (and full-tracking boxes)
//! once per tick into bounded FIFO buffers, and logs pickups and drops of
//! carry-only boxes against the sample timeline. Rewinding pops one sample
//! per tick, newest first, writing it straight onto the live entities.
//!
//! Carry events are stamped with the index of the next sample. A frame
//! handles input before it records, so an event stamped `t` happened with
//! the player exactly at sample `t`. Playback undoes it while the player is
//! still there, before stepping back to `t - 1`.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::entity::{Entity, Obstacle};
use crate::components::player::Player;
use crate::core::level::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewindState {
    #[default]
    Idle,
    Recording,
    Rewinding,
}

impl RewindState {
    pub fn as_f32(self) -> f32 {
        match self {
            RewindState::Idle => 0.0,
            RewindState::Recording => 1.0,
            RewindState::Rewinding => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxEventKind {
    PickedUp,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxEvent {
    pub kind: BoxEventKind,
    /// Index of the sample recorded right after the event.
    pub tick: u64,
}

#[derive(Debug, Clone, Default)]
struct BoxTrack {
    full: bool,
    samples: VecDeque<Vec2>,
    events: VecDeque<BoxEvent>,
}

impl BoxTrack {
    fn clear(&mut self) {
        self.samples.clear();
        self.events.clear();
    }
}

#[derive(Debug, Clone)]
pub struct RewindManager {
    state: RewindState,
    capacity: usize,
    player: VecDeque<Vec2>,
    /// Tick index of `player[0]`.
    first_tick: u64,
    /// Tick index the next sample will get.
    next_tick: u64,
    boxes: BTreeMap<EntityId, BoxTrack>,
    /// A live pickup interrupted playback; stop on the next tick.
    pending_cancel: bool,
}

impl RewindManager {
    /// `capacity` is the number of samples kept, one per tick.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: RewindState::Idle,
            capacity,
            player: VecDeque::with_capacity(capacity),
            first_tick: 0,
            next_tick: 0,
            boxes: BTreeMap::new(),
            pending_cancel: false,
        }
    }

    pub fn state(&self) -> RewindState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RewindState::Recording
    }

    pub fn is_rewinding(&self) -> bool {
        self.state == RewindState::Rewinding
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Player samples currently buffered.
    pub fn len(&self) -> usize {
        self.player.len()
    }

    pub fn is_empty(&self) -> bool {
        self.player.is_empty()
    }

    pub fn is_tracked(&self, id: EntityId) -> bool {
        self.boxes.contains_key(&id)
    }

    pub fn box_events(&self, id: EntityId) -> Option<&VecDeque<BoxEvent>> {
        self.boxes.get(&id).map(|t| &t.events)
    }

    /// Pick up the rewind-tracked boxes of a freshly loaded level.
    /// Discards any history.
    pub fn track_boxes(&mut self, level: &Level) {
        self.clear_buffers();
        self.boxes = level
            .boxes()
            .filter_map(|e| {
                let carry = e.carry()?;
                carry.rewind_tracked.then(|| {
                    (
                        e.id,
                        BoxTrack {
                            full: carry.full_rewind_tracking,
                            ..BoxTrack::default()
                        },
                    )
                })
            })
            .collect();
        log::debug!("rewind tracking {} boxes", self.boxes.len());
    }

    fn clear_buffers(&mut self) {
        self.player.clear();
        self.boxes.values_mut().for_each(BoxTrack::clear);
        self.first_tick = 0;
        self.next_tick = 0;
        self.pending_cancel = false;
    }

    fn set_state(&mut self, state: RewindState) {
        if self.state != state {
            log::info!("rewind: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    pub fn start_recording(&mut self) -> bool {
        if self.state != RewindState::Idle {
            return false;
        }
        self.clear_buffers();
        self.set_state(RewindState::Recording);
        true
    }

    /// Switch to playback. With nothing recorded this falls back to Idle and
    /// touches nothing. Tracked boxes the player is holding are dropped, and
    /// the drop is logged at the end of the timeline so playback re-attaches
    /// them first.
    pub fn start_rewind(&mut self, player: &mut Player, level: &mut Level) -> bool {
        if self.state == RewindState::Rewinding {
            return false;
        }
        if self.player.is_empty() {
            log::debug!("rewind requested with an empty buffer");
            self.set_state(RewindState::Idle);
            return false;
        }

        for (&id, track) in self.boxes.iter_mut() {
            let Some(entity) = level.get_mut(id) else {
                continue;
            };
            let live = entity.carry().and_then(|c| c.carrier()).is_some();
            if live && entity.drop_carried() {
                if player.carried() == Some(id) {
                    player.set_carried(None);
                }
                if !track.full {
                    track.events.push_back(BoxEvent {
                        kind: BoxEventKind::Dropped,
                        tick: self.next_tick,
                    });
                }
            }
            entity.set_rewinding(true);
        }

        self.pending_cancel = false;
        self.set_state(RewindState::Rewinding);
        true
    }

    /// Idle → Recording → Rewinding. No-op while rewinding.
    pub fn toggle(&mut self, player: &mut Player, level: &mut Level) {
        match self.state {
            RewindState::Idle => {
                self.start_recording();
            }
            RewindState::Recording => {
                self.start_rewind(player, level);
            }
            RewindState::Rewinding => {}
        }
    }

    /// Log a live pickup or drop of a carry-only box. Ignored unless
    /// recording, and for boxes whose positions are sampled anyway.
    pub fn record_box_interaction(&mut self, id: EntityId, picked_up: bool) {
        if self.state != RewindState::Recording {
            return;
        }
        let Some(track) = self.boxes.get_mut(&id) else {
            return;
        };
        if track.full {
            return;
        }
        let kind = if picked_up {
            BoxEventKind::PickedUp
        } else {
            BoxEventKind::Dropped
        };
        track.events.push_back(BoxEvent {
            kind,
            tick: self.next_tick,
        });
    }

    /// The player grabbed `id` during playback. The box leaves playback now;
    /// the manager stops on its next tick.
    pub fn release_box(&mut self, id: EntityId, level: &mut Level) {
        if self.state != RewindState::Rewinding || !self.boxes.contains_key(&id) {
            return;
        }
        if let Some(entity) = level.get_mut(id) {
            if entity.carry().is_some_and(|c| c.is_carried() && c.carrier().is_none()) {
                entity.drop_carried();
            }
            entity.set_rewinding(false);
        }
        self.pending_cancel = true;
        log::debug!("box {:?} taken out of rewind", id);
    }

    /// Abandon everything: back to Idle, history discarded, held boxes dropped.
    pub fn reset(&mut self, level: &mut Level) {
        for &id in self.boxes.keys() {
            if let Some(entity) = level.get_mut(id) {
                entity.handle_recording_end();
                entity.set_rewinding(false);
            }
        }
        self.clear_buffers();
        self.set_state(RewindState::Idle);
    }

    /// One tick: record in Recording, play back in Rewinding.
    pub fn update(&mut self, player: &mut Player, level: &mut Level) {
        match self.state {
            RewindState::Idle => {}
            RewindState::Recording => self.record(player, level),
            RewindState::Rewinding => {
                if self.pending_cancel {
                    self.finish(level);
                    return;
                }
                self.play_back(player, level);
                if self.player.is_empty() {
                    self.finish(level);
                }
            }
        }
    }

    fn record(&mut self, player: &Player, level: &Level) {
        if self.capacity == 0 {
            return;
        }
        self.player.push_back(player.pos);
        for (&id, track) in self.boxes.iter_mut().filter(|(_, t)| t.full) {
            let pos = level.get(id).map_or(Vec2::ZERO, |e| e.pos);
            track.samples.push_back(pos);
        }
        self.next_tick += 1;

        while self.player.len() > self.capacity {
            self.player.pop_front();
            self.first_tick += 1;
            let oldest = self.first_tick;
            for track in self.boxes.values_mut() {
                if track.full {
                    track.samples.pop_front();
                }
                while track.events.front().is_some_and(|e| e.tick <= oldest) {
                    track.events.pop_front();
                }
            }
        }
    }

    fn play_back(&mut self, player: &mut Player, level: &mut Level) {
        let Some(sample) = self.player.pop_back() else {
            return;
        };
        self.next_tick = self.next_tick.saturating_sub(1);
        let tick = self.next_tick;
        let walls = level.solid_obstacles();

        for (&id, track) in self.boxes.iter_mut() {
            let Some(entity) = level.get_mut(id) else {
                continue;
            };
            if !entity.carry().is_some_and(|c| c.rewinding) {
                continue;
            }
            if track.full {
                if let Some(pos) = track.samples.pop_back() {
                    replay_sample(entity, track, pos, &walls);
                }
                continue;
            }
            while track.events.back().is_some_and(|e| e.tick > tick) {
                if let Some(event) = track.events.pop_back() {
                    undo(entity, event.kind, player.center());
                }
            }
        }

        player.place_at(sample);

        let center = player.center();
        for &id in self.boxes.keys() {
            if let Some(entity) = level.get_mut(id) {
                if entity.carry().is_some_and(|c| c.rewinding && c.is_carried()) {
                    entity.update_carried_position(center);
                }
            }
        }
    }

    fn finish(&mut self, level: &mut Level) {
        for &id in self.boxes.keys() {
            if let Some(entity) = level.get_mut(id) {
                if entity.carry().is_some_and(|c| c.rewinding) {
                    entity.handle_recording_end();
                }
                entity.set_rewinding(false);
            }
        }
        self.clear_buffers();
        self.set_state(RewindState::Idle);
    }
}

/// Move a full-tracking box to its next older sample. A sample inside a wall
/// or closed door ends the box's playback for this rewind: every older sample
/// lies beyond the obstruction, so the box stays on this side of it.
fn replay_sample(entity: &mut Entity, track: &mut BoxTrack, pos: Vec2, walls: &[Obstacle]) {
    let from = entity.pos;
    if !entity.set_pos(pos) {
        return;
    }
    if entity.collides_with_any(walls) {
        entity.pos = from;
        entity.set_rewinding(false);
        track.samples.clear();
        log::debug!("box {:?}: rewind path blocked at {:?}", entity.id, pos);
    }
}

fn undo(entity: &mut Entity, kind: BoxEventKind, carrier_center: Vec2) {
    match kind {
        BoxEventKind::Dropped => {
            entity.pick_up(carrier_center, None);
        }
        BoxEventKind::PickedUp => {
            entity.drop_carried();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::game::GameConfig;
    use crate::components::carry::CarryComponent;
    use crate::components::door::Door;
    use crate::components::player::PLAYER_ID;

    fn setup() -> (Player, Level) {
        let config = GameConfig::default();
        let level = Level::new(1, &config);
        let player = Player::new(32, 32, 0.0, Vec2::new(1024.0, 768.0));
        (player, level)
    }

    #[test]
    fn empty_buffer_goes_idle_without_moving_anything() {
        let (mut player, mut level) = setup();
        player.place_at(Vec2::new(50.0, 60.0));
        let mut rm = RewindManager::new(600);

        assert!(!rm.start_rewind(&mut player, &mut level));
        assert_eq!(rm.state(), RewindState::Idle);

        rm.start_recording();
        assert!(!rm.start_rewind(&mut player, &mut level));
        assert_eq!(rm.state(), RewindState::Idle);

        rm.update(&mut player, &mut level);
        assert_eq!(player.pos, Vec2::new(50.0, 60.0));
    }

    #[test]
    fn thirty_ticks_rewind_to_start() {
        let (mut player, mut level) = setup();
        let mut rm = RewindManager::new(600);
        rm.toggle(&mut player, &mut level);
        assert!(rm.is_recording());

        for i in 0..30 {
            player.place_at(Vec2::new(100.0 + i as f32 * (100.0 / 29.0), 100.0));
            rm.update(&mut player, &mut level);
        }
        assert_eq!(rm.len(), 30);

        rm.toggle(&mut player, &mut level);
        for _ in 0..29 {
            rm.update(&mut player, &mut level);
            assert!(rm.is_rewinding());
        }
        rm.update(&mut player, &mut level);
        assert_eq!(player.pos, Vec2::new(100.0, 100.0));
        assert_eq!(rm.state(), RewindState::Idle);
    }

    #[test]
    fn toggle_during_rewind_is_ignored() {
        let (mut player, mut level) = setup();
        let mut rm = RewindManager::new(10);
        rm.start_recording();
        rm.update(&mut player, &mut level);
        rm.update(&mut player, &mut level);
        rm.start_rewind(&mut player, &mut level);
        rm.toggle(&mut player, &mut level);
        assert!(rm.is_rewinding());
        assert!(!rm.start_recording());
    }

    #[test]
    fn buffer_is_fifo_bounded() {
        let (mut player, mut level) = setup();
        let mut rm = RewindManager::new(5);
        rm.start_recording();
        for i in 0..8 {
            player.place_at(Vec2::new(i as f32, 0.0));
            rm.update(&mut player, &mut level);
        }
        assert_eq!(rm.len(), 5);

        rm.start_rewind(&mut player, &mut level);
        while rm.is_rewinding() {
            rm.update(&mut player, &mut level);
        }
        assert_eq!(player.pos, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn full_tracking_box_stops_at_a_wall() {
        let (mut player, mut level) = setup();
        level.add_block(5, 5);
        let id = level
            .add_box(2, 2, CarryComponent::new(true, true).with_full_rewind_tracking(true))
            .unwrap();
        let mut rm = RewindManager::new(100);
        rm.track_boxes(&level);
        rm.start_recording();

        // Sample 0 in the open, sample 1 inside the wall cell.
        rm.update(&mut player, &mut level);
        level.get_mut(id).unwrap().pos = Vec2::new(160.0, 160.0);
        rm.update(&mut player, &mut level);
        level.get_mut(id).unwrap().pos = Vec2::new(300.0, 300.0);

        rm.start_rewind(&mut player, &mut level);
        rm.update(&mut player, &mut level);
        let b = level.get(id).unwrap();
        assert_eq!(b.pos, Vec2::new(300.0, 300.0));
        assert!(!b.carry().unwrap().rewinding);

        rm.update(&mut player, &mut level);
        assert_eq!(level.get(id).unwrap().pos, Vec2::new(300.0, 300.0));
        assert_eq!(rm.state(), RewindState::Idle);
    }

    #[test]
    fn full_tracking_box_cannot_cross_a_closed_door() {
        let (mut player, mut level) = setup();
        level.add_door(Door::new("d"), 5, 2);
        level.doors.open_door("d");
        let id = level
            .add_box(2, 2, CarryComponent::new(true, true).with_full_rewind_tracking(true))
            .unwrap();
        let mut rm = RewindManager::new(200);
        rm.track_boxes(&level);
        rm.start_recording();

        // Slide right through the open door, 2 px per tick.
        for i in 0..=98 {
            level.get_mut(id).unwrap().pos = Vec2::new(64.0 + 2.0 * i as f32, 64.0);
            rm.update(&mut player, &mut level);
        }
        assert_eq!(level.get(id).unwrap().pos, Vec2::new(260.0, 64.0));

        level.doors.close_door("d");
        rm.start_rewind(&mut player, &mut level);
        while rm.is_rewinding() {
            rm.update(&mut player, &mut level);
        }

        // The door's collision box spans x 162..190, so the last free sample
        // on the far side is x = 188.
        let b = level.get(id).unwrap();
        assert_eq!(b.pos, Vec2::new(188.0, 64.0));
        assert!(!b.carry().unwrap().rewinding);
    }

    /// One frame in the order the game runs it: input, record, movement.
    fn frame(
        rm: &mut RewindManager,
        player: &mut Player,
        level: &mut Level,
        interact: Option<bool>,
        box_id: EntityId,
        dx: f32,
    ) {
        match interact {
            Some(true) => {
                let center = player.center();
                assert!(level.get_mut(box_id).unwrap().pick_up(center, Some(PLAYER_ID)));
                player.set_carried(Some(box_id));
                rm.record_box_interaction(box_id, true);
            }
            Some(false) => {
                assert!(level.get_mut(box_id).unwrap().drop_carried());
                player.set_carried(None);
                rm.record_box_interaction(box_id, false);
            }
            None => {}
        }
        rm.update(player, level);
        player.pos.x += dx;
        let center = player.center();
        level.get_mut(box_id).unwrap().update_carried_position(center);
    }

    #[test]
    fn carry_events_replay_in_reverse() {
        let (mut player, mut level) = setup();
        let id = level.add_box(4, 4, CarryComponent::new(true, true)).unwrap();
        player.place_at(Vec2::new(96.0, 128.0));
        let mut rm = RewindManager::new(100);
        rm.track_boxes(&level);
        rm.start_recording();

        frame(&mut rm, &mut player, &mut level, None, id, 0.0);
        frame(&mut rm, &mut player, &mut level, Some(true), id, 10.0);
        frame(&mut rm, &mut player, &mut level, None, id, 10.0);
        frame(&mut rm, &mut player, &mut level, None, id, 10.0);
        frame(&mut rm, &mut player, &mut level, Some(false), id, 0.0);
        assert_eq!(level.get(id).unwrap().pos, Vec2::new(158.0, 128.0));
        assert_eq!(rm.box_events(id).unwrap().len(), 2);

        rm.start_rewind(&mut player, &mut level);
        rm.update(&mut player, &mut level);
        assert!(!level.get(id).unwrap().is_carried());

        rm.update(&mut player, &mut level);
        let b = level.get(id).unwrap();
        assert!(b.is_carried());
        assert_eq!(b.carry().unwrap().carrier(), None);
        assert_eq!(b.pos, Vec2::new(148.0, 128.0));

        rm.update(&mut player, &mut level);
        rm.update(&mut player, &mut level);
        assert_eq!(level.get(id).unwrap().pos, Vec2::new(128.0, 128.0));
        rm.update(&mut player, &mut level);

        let b = level.get(id).unwrap();
        assert!(!b.is_carried());
        assert_eq!(b.pos, Vec2::new(128.0, 128.0));
        assert_eq!(player.pos, Vec2::new(96.0, 128.0));
        assert_eq!(rm.state(), RewindState::Idle);
    }

    #[test]
    fn held_box_is_dropped_then_reattached() {
        let (mut player, mut level) = setup();
        let id = level.add_box(4, 4, CarryComponent::new(true, true)).unwrap();
        player.place_at(Vec2::new(96.0, 128.0));
        let mut rm = RewindManager::new(100);
        rm.track_boxes(&level);
        rm.start_recording();

        frame(&mut rm, &mut player, &mut level, Some(true), id, 0.0);
        frame(&mut rm, &mut player, &mut level, None, id, 0.0);

        rm.start_rewind(&mut player, &mut level);
        assert!(!level.get(id).unwrap().is_carried());
        assert_eq!(player.carried(), None);

        rm.update(&mut player, &mut level);
        assert!(level.get(id).unwrap().is_carried());
    }

    #[test]
    fn live_pickup_cancels_on_next_tick() {
        let (mut player, mut level) = setup();
        let id = level.add_box(4, 4, CarryComponent::new(true, true)).unwrap();
        player.place_at(Vec2::new(96.0, 128.0));
        let mut rm = RewindManager::new(100);
        rm.track_boxes(&level);
        rm.start_recording();
        for _ in 0..5 {
            frame(&mut rm, &mut player, &mut level, None, id, 1.0);
        }
        rm.start_rewind(&mut player, &mut level);
        rm.update(&mut player, &mut level);
        let pos = player.pos;

        rm.release_box(id, &mut level);
        let center = player.center();
        assert!(level.get_mut(id).unwrap().pick_up(center, Some(PLAYER_ID)));
        assert!(rm.is_rewinding());

        rm.update(&mut player, &mut level);
        assert_eq!(rm.state(), RewindState::Idle);
        assert_eq!(player.pos, pos);
        let b = level.get(id).unwrap();
        assert_eq!(b.carry().unwrap().carrier(), Some(PLAYER_ID));
        assert!(!b.carry().unwrap().rewinding);
    }

    #[test]
    fn reset_discards_history_and_drops_boxes() {
        let (mut player, mut level) = setup();
        let id = level.add_box(4, 4, CarryComponent::new(true, true)).unwrap();
        let mut rm = RewindManager::new(100);
        rm.track_boxes(&level);
        rm.start_recording();
        frame(&mut rm, &mut player, &mut level, Some(true), id, 0.0);

        rm.reset(&mut level);
        assert_eq!(rm.state(), RewindState::Idle);
        assert!(rm.is_empty());
        assert!(!level.get(id).unwrap().is_carried());
        assert!(rm.box_events(id).unwrap().is_empty());
    }

    #[test]
    fn old_events_are_evicted_with_their_samples() {
        let (mut player, mut level) = setup();
        let id = level.add_box(4, 4, CarryComponent::new(true, true)).unwrap();
        player.place_at(Vec2::new(96.0, 128.0));
        let mut rm = RewindManager::new(3);
        rm.track_boxes(&level);
        rm.start_recording();

        frame(&mut rm, &mut player, &mut level, Some(true), id, 0.0);
        frame(&mut rm, &mut player, &mut level, None, id, 0.0);
        frame(&mut rm, &mut player, &mut level, None, id, 0.0);
        assert_eq!(rm.box_events(id).unwrap().len(), 1);
        frame(&mut rm, &mut player, &mut level, None, id, 0.0);
        assert!(rm.box_events(id).unwrap().is_empty());
    }

    #[test]
    fn untracked_boxes_are_ignored() {
        let (_, mut level) = setup();
        let id = level.add_box(4, 4, CarryComponent::new(false, true)).unwrap();
        let mut rm = RewindManager::new(10);
        rm.track_boxes(&level);
        assert!(!rm.is_tracked(id));
        rm.start_recording();
        rm.record_box_interaction(id, true);
        assert!(rm.box_events(id).is_none());
    }
}
