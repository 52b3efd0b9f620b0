//! Button → door wiring.
//!
//! Buttons and timers never call doors directly. They emit [`Action`] values
//! and the [`TriggerGraph`] dispatches them, including every action those
//! produce in turn, before `fire` returns.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use crate::components::door::DoorController;

/// Upper bound on actions processed by one `fire` call. Guards against
/// wiring loops such as a timer whose activate action re-triggers itself.
const MAX_CASCADE: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OpenDoor(String),
    CloseDoor(String),
    ToggleDoor(String),
    OpenDoorPermanently(String),
    /// Report one button's state to a [`MultiButtonAction`] group.
    SetButtonState {
        group: String,
        button: String,
        pressed: bool,
    },
    /// (Re)start a [`TimedAction`].
    TriggerTimed(String),
    Batch(Vec<Action>),
}

impl Action {
    pub fn set_button(group: &str, button: &str, pressed: bool) -> Self {
        Action::SetButtonState {
            group: group.to_string(),
            button: button.to_string(),
            pressed,
        }
    }

    /// Apply only the door-opening parts of this action.
    fn reassert_open(&self, doors: &mut DoorController) {
        match self {
            Action::OpenDoor(id) => doors.open_door(id),
            Action::OpenDoorPermanently(id) => doors.open_door_permanently(id),
            Action::Batch(actions) => actions.iter().for_each(|a| a.reassert_open(doors)),
            _ => {}
        }
    }
}

/// Fires its action once every required button is pressed at the same time.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiButtonAction {
    required: BTreeMap<String, bool>,
    action: Option<Action>,
    release_action: Option<Action>,
    permanent: bool,
    permanently_activated: bool,
    all_pressed: bool,
}

impl MultiButtonAction {
    pub fn new(action: Option<Action>, permanent: bool) -> Self {
        Self {
            required: BTreeMap::new(),
            action,
            release_action: None,
            permanent,
            permanently_activated: false,
            all_pressed: false,
        }
    }

    /// Fired when the group leaves the all-pressed state. Ignored for
    /// permanent groups.
    pub fn with_release(mut self, action: Action) -> Self {
        self.release_action = Some(action);
        self
    }

    pub fn with_button(mut self, id: impl Into<String>) -> Self {
        self.add_required_button(id);
        self
    }

    pub fn add_required_button(&mut self, id: impl Into<String>) {
        self.required.insert(id.into(), false);
        self.all_pressed = false;
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    pub fn is_permanently_activated(&self) -> bool {
        self.permanently_activated
    }

    /// Latched, or every required button currently pressed.
    pub fn is_activated(&self) -> bool {
        self.permanently_activated || self.all_pressed
    }

    pub fn button_state(&self, id: &str) -> Option<bool> {
        self.required.get(id).copied()
    }

    /// Record one button's state. Unknown ids are ignored. Transition
    /// actions are pushed to `fired`. Returns whether every required button
    /// is pressed right now.
    pub fn update_button_state(&mut self, id: &str, pressed: bool, fired: &mut Vec<Action>) -> bool {
        match self.required.get_mut(id) {
            Some(state) => *state = pressed,
            None => return self.all_pressed,
        }

        let was = self.all_pressed;
        self.all_pressed = !self.required.is_empty() && self.required.values().all(|v| *v);

        if self.permanent {
            if self.all_pressed && !self.permanently_activated {
                self.permanently_activated = true;
                log::info!("button group latched");
                fired.extend(self.action.clone());
            }
        } else if self.all_pressed && !was {
            fired.extend(self.action.clone());
        } else if !self.all_pressed && was {
            fired.extend(self.release_action.clone());
        }
        self.all_pressed
    }
}

/// Runs `activate` now and `deactivate` once `duration` has passed since the
/// most recent trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedAction {
    activate: Option<Action>,
    deactivate: Option<Action>,
    duration: Duration,
    started_at: Option<Duration>,
}

impl TimedAction {
    pub fn new(activate: Option<Action>, deactivate: Option<Action>, duration: Duration) -> Self {
        Self {
            activate,
            deactivate,
            duration,
            started_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Start, or restart, the window. The activate action fires every time.
    pub fn trigger(&mut self, now: Duration, fired: &mut Vec<Action>) {
        self.started_at = Some(now);
        fired.extend(self.activate.clone());
    }

    /// Poll for expiry. Yields the deactivate action exactly once per window.
    pub fn update(&mut self, now: Duration) -> Option<Action> {
        let started = self.started_at?;
        if now.saturating_sub(started) < self.duration {
            return None;
        }
        self.started_at = None;
        self.deactivate.clone()
    }

    pub fn reset(&mut self) {
        self.started_at = None;
    }
}

/// Dispatcher for every [`Action`] in a level. Owns the button groups and
/// timers that actions can address by id.
#[derive(Debug, Clone, Default)]
pub struct TriggerGraph {
    groups: BTreeMap<String, MultiButtonAction>,
    timers: BTreeMap<String, TimedAction>,
}

impl TriggerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, id: impl Into<String>, group: MultiButtonAction) {
        self.groups.insert(id.into(), group);
    }

    pub fn add_timer(&mut self, id: impl Into<String>, timer: TimedAction) {
        self.timers.insert(id.into(), timer);
    }

    pub fn group(&self, id: &str) -> Option<&MultiButtonAction> {
        self.groups.get(id)
    }

    pub fn timer(&self, id: &str) -> Option<&TimedAction> {
        self.timers.get(id)
    }

    /// Process `action` and everything it produces, FIFO, before returning.
    pub fn fire(&mut self, action: Action, doors: &mut DoorController, now: Duration) {
        let mut queue = VecDeque::from([action]);
        let mut produced = Vec::new();
        let mut processed = 0;

        while let Some(action) = queue.pop_front() {
            processed += 1;
            if processed > MAX_CASCADE {
                log::warn!("action cascade exceeded {} steps, dropping the rest", MAX_CASCADE);
                return;
            }

            match action {
                Action::OpenDoor(id) => doors.open_door(&id),
                Action::CloseDoor(id) => doors.close_door(&id),
                Action::ToggleDoor(id) => doors.toggle_door(&id),
                Action::OpenDoorPermanently(id) => doors.open_door_permanently(&id),
                Action::SetButtonState {
                    group,
                    button,
                    pressed,
                } => match self.groups.get_mut(&group) {
                    Some(g) => {
                        g.update_button_state(&button, pressed, &mut produced);
                    }
                    None => log::debug!("no button group {}", group),
                },
                Action::TriggerTimed(id) => match self.timers.get_mut(&id) {
                    Some(t) => t.trigger(now, &mut produced),
                    None => log::debug!("no timer {}", id),
                },
                Action::Batch(actions) => queue.extend(actions),
            }
            queue.extend(produced.drain(..));
        }
    }

    pub fn fire_all(&mut self, actions: Vec<Action>, doors: &mut DoorController, now: Duration) {
        for action in actions {
            self.fire(action, doors, now);
        }
    }

    /// Expire timers and dispatch their deactivate actions.
    pub fn update(&mut self, doors: &mut DoorController, now: Duration) {
        let expired: Vec<Action> = self
            .timers
            .values_mut()
            .filter_map(|t| t.update(now))
            .collect();
        self.fire_all(expired, doors, now);
    }

    /// Re-open every door targeted by a latched permanent group, so a
    /// latched door is never observed closed.
    pub fn sync_doors(&self, doors: &mut DoorController) {
        for group in self.groups.values() {
            if !group.is_permanently_activated() {
                continue;
            }
            if let Some(action) = group.action() {
                action.reassert_open(doors);
            }
        }
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::door::Door;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn doors(ids: &[&str]) -> DoorController {
        let mut c = DoorController::new();
        for id in ids {
            c.register(Door::new(*id));
        }
        c
    }

    fn pair(permanent: bool) -> TriggerGraph {
        let mut g = TriggerGraph::new();
        let mut group = MultiButtonAction::new(Some(Action::OpenDoor("d".into())), permanent)
            .with_button("a")
            .with_button("b");
        if !permanent {
            group = group.with_release(Action::CloseDoor("d".into()));
        }
        g.add_group("pair", group);
        g
    }

    #[test]
    fn non_permanent_group_follows_buttons() {
        let mut g = pair(false);
        let mut d = doors(&["d"]);

        g.fire(Action::set_button("pair", "a", true), &mut d, ms(0));
        assert!(!d.is_open("d"));

        g.fire(Action::set_button("pair", "b", true), &mut d, ms(0));
        assert!(d.is_open("d"));

        g.fire(Action::set_button("pair", "a", false), &mut d, ms(0));
        assert!(!d.is_open("d"));
        assert!(!g.group("pair").unwrap().is_activated());
    }

    #[test]
    fn permanent_group_stays_open() {
        let mut g = pair(true);
        let mut d = doors(&["d"]);

        g.fire(Action::set_button("pair", "a", true), &mut d, ms(0));
        g.fire(Action::set_button("pair", "b", true), &mut d, ms(0));
        assert!(d.is_open("d"));

        g.fire(Action::set_button("pair", "a", false), &mut d, ms(0));
        g.fire(Action::set_button("pair", "b", false), &mut d, ms(0));
        let group = g.group("pair").unwrap();
        assert!(group.is_permanently_activated());
        assert!(group.is_activated());
        assert!(d.is_open("d"));
    }

    #[test]
    fn group_fires_once_per_transition() {
        let mut group = MultiButtonAction::new(Some(Action::OpenDoor("d".into())), false)
            .with_button("a")
            .with_release(Action::CloseDoor("d".into()));
        let mut fired = Vec::new();

        assert!(group.update_button_state("a", true, &mut fired));
        assert!(group.update_button_state("a", true, &mut fired));
        assert_eq!(fired, vec![Action::OpenDoor("d".into())]);

        assert!(!group.update_button_state("a", false, &mut fired));
        assert!(!group.update_button_state("a", false, &mut fired));
        assert_eq!(fired.len(), 2);
    }

    #[test]
    fn permanent_group_fires_once_total() {
        let mut group = MultiButtonAction::new(Some(Action::OpenDoor("d".into())), true)
            .with_button("a")
            .with_release(Action::CloseDoor("d".into()));
        let mut fired = Vec::new();
        for _ in 0..3 {
            group.update_button_state("a", true, &mut fired);
            group.update_button_state("a", false, &mut fired);
        }
        assert_eq!(fired, vec![Action::OpenDoor("d".into())]);
    }

    #[test]
    fn unknown_button_is_ignored() {
        let mut group = MultiButtonAction::new(None, false).with_button("a");
        let mut fired = Vec::new();
        assert!(!group.update_button_state("zzz", true, &mut fired));
        assert_eq!(group.button_state("zzz"), None);
        assert_eq!(group.button_state("a"), Some(false));
    }

    #[test]
    fn timed_action_expires_after_latest_trigger() {
        let mut t = TimedAction::new(
            Some(Action::OpenDoor("d".into())),
            Some(Action::CloseDoor("d".into())),
            ms(1000),
        );
        let mut fired = Vec::new();
        t.trigger(ms(0), &mut fired);
        assert_eq!(t.update(ms(600)), None);

        // Re-trigger restarts the window and re-fires.
        t.trigger(ms(600), &mut fired);
        assert_eq!(fired.len(), 2);
        assert_eq!(t.update(ms(1500)), None);
        assert_eq!(t.update(ms(1600)), Some(Action::CloseDoor("d".into())));
        assert!(!t.is_active());
        assert_eq!(t.update(ms(5000)), None);
    }

    #[test]
    fn timed_buttons_feed_permanent_group() {
        let mut g = pair(true);
        for b in ["a", "b"] {
            g.add_timer(
                b,
                TimedAction::new(
                    Some(Action::set_button("pair", b, true)),
                    Some(Action::set_button("pair", b, false)),
                    ms(1000),
                ),
            );
        }
        let mut d = doors(&["d"]);

        g.fire(Action::TriggerTimed("a".into()), &mut d, ms(0));
        g.update(&mut d, ms(1000));
        g.fire(Action::TriggerTimed("b".into()), &mut d, ms(1000));
        assert!(!d.is_open("d"), "a expired before b was pressed");

        g.fire(Action::TriggerTimed("a".into()), &mut d, ms(1500));
        assert!(d.is_open("d"));

        g.update(&mut d, ms(3000));
        assert!(d.is_open("d"));
    }

    #[test]
    fn sync_reopens_latched_doors() {
        let mut g = pair(true);
        let mut d = doors(&["d"]);
        g.fire(Action::set_button("pair", "a", true), &mut d, ms(0));
        g.fire(Action::set_button("pair", "b", true), &mut d, ms(0));

        d.close_door("d");
        assert!(!d.is_open("d"));
        g.sync_doors(&mut d);
        assert!(d.is_open("d"));
    }

    #[test]
    fn batch_and_toggle_dispatch_in_order() {
        let mut g = TriggerGraph::new();
        let mut d = doors(&["x", "y"]);
        g.fire(
            Action::Batch(vec![
                Action::ToggleDoor("x".into()),
                Action::OpenDoorPermanently("y".into()),
                Action::CloseDoor("y".into()),
                Action::OpenDoor("missing".into()),
            ]),
            &mut d,
            ms(0),
        );
        assert!(d.is_open("x"));
        assert!(d.get("y").unwrap().is_permanently_open());
    }

    #[test]
    fn self_triggering_timer_terminates() {
        let mut g = TriggerGraph::new();
        g.add_timer(
            "loop",
            TimedAction::new(Some(Action::TriggerTimed("loop".into())), None, ms(10)),
        );
        let mut d = doors(&[]);
        g.fire(Action::TriggerTimed("loop".into()), &mut d, ms(0));
        assert!(g.timer("loop").unwrap().is_active());
    }
}
