//! The three hand-built levels.
//!
//! Layouts are expressed in grid cells relative to the grid size, so they
//! scale with `GameConfig::screen_*` and `cell_size`.

use std::ops::Range;
use std::time::Duration;

use crate::api::game::GameConfig;
use crate::components::button::ButtonComponent;
use crate::components::carry::CarryComponent;
use crate::components::door::Door;
use crate::core::level::Level;
use crate::levels::LevelSource;
use crate::systems::triggers::{Action, MultiButtonAction, TimedAction};

const RED: [u8; 3] = [200, 80, 80];
const BLUE: [u8; 3] = [80, 80, 200];
const CRIMSON: [u8; 3] = [220, 20, 20];

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLevels;

impl LevelSource for BuiltinLevels {
    fn build(&self, index: u32, config: &GameConfig) -> Option<Level> {
        let mut level = Level::new(index, config);
        match index {
            1 => level_one(&mut level, config),
            2 => level_two(&mut level, config),
            3 => level_three(&mut level, config),
            _ => return None,
        }
        log::info!("built level {} with {} entities", index, level.len());
        Some(level)
    }

    fn count(&self) -> u32 {
        3
    }
}

fn cooldown(config: &GameConfig) -> Duration {
    Duration::from_millis(config.button_cooldown_ms)
}

fn wall_row(level: &mut Level, y: i32, xs: Range<i32>, gaps: &[i32]) {
    for x in xs.filter(|x| !gaps.contains(x)) {
        level.add_block(x, y);
    }
}

fn wall_col(level: &mut Level, x: i32, ys: Range<i32>, gaps: &[i32]) {
    for y in ys.filter(|y| !gaps.contains(y)) {
        level.add_block(x, y);
    }
}

fn doors_action(ids: &[&str], open: bool) -> Action {
    Action::Batch(
        ids.iter()
            .map(|id| {
                if open {
                    Action::OpenDoor(id.to_string())
                } else {
                    Action::CloseDoor(id.to_string())
                }
            })
            .collect(),
    )
}

/// Press both buttons within the timed window to latch the exit open.
fn level_one(level: &mut Level, config: &GameConfig) {
    let (w, h) = (level.grid().horizontal_cells(), level.grid().vertical_cells());
    level.add_border();

    level.add_door(Door::new("exit"), w - 2, h / 2);
    level.add_exit("exit", 2);

    level.triggers.add_group(
        "exit",
        MultiButtonAction::new(Some(Action::OpenDoor("exit".into())), true)
            .with_button("top")
            .with_button("bottom"),
    );

    let window = Duration::from_millis(config.timed_button_ms);
    for (name, y, tint) in [("top", 2, RED), ("bottom", h - 3, BLUE)] {
        level.triggers.add_timer(
            name,
            TimedAction::new(
                Some(Action::set_button("exit", name, true)),
                Some(Action::set_button("exit", name, false)),
                window,
            ),
        );
        level.add_button(
            name,
            w / 2,
            y,
            ButtonComponent::pressable(Some(Action::TriggerTimed(name.into())))
                .with_cooldown(cooldown(config))
                .with_tint(tint),
        );
    }

    level.set_spawn(2, h / 2);
}

/// Three weighted buttons above a wall, each toggling a door below it.
fn level_two(level: &mut Level, config: &GameConfig) {
    let (w, h) = (level.grid().horizontal_cells(), level.grid().vertical_cells());
    let columns = [w / 3, (w * 2) / 3, w - 2];
    let door_row = 9;
    level.add_border();

    // Doors first so the walls leave their cells free.
    for (i, &x) in columns.iter().enumerate() {
        level.add_door(Door::new(format!("door{}", i + 1)), x, door_row);
    }
    wall_row(level, 6, columns[0]..w - 1, &[]);
    wall_col(level, columns[0], 6..h - 1, &[door_row]);
    wall_col(level, columns[1], 6..h - 1, &[door_row]);

    for (i, &x) in columns.iter().enumerate() {
        let door = format!("door{}", i + 1);
        level.add_button(
            &format!("weight{}", i + 1),
            x,
            2,
            ButtonComponent::weighted(Some(Action::ToggleDoor(door)), None)
                .with_cooldown(cooldown(config)),
        );
    }
    level.add_exit("door3", 3);

    level.add_box(
        2,
        h - 3,
        CarryComponent::new(true, true).with_full_rewind_tracking(true),
    );
    level.add_box(4, h - 3, CarryComponent::new(true, true));

    level.set_spawn(2, h / 2);
}

/// Three rooms behind triple doors. Two crimson plates together latch the
/// bottom-left room; single plates hold the other rooms open; two blue plates
/// together latch the end door.
fn level_three(level: &mut Level, config: &GameConfig) {
    let (w, h) = (level.grid().horizontal_cells(), level.grid().vertical_cells());
    level.add_border();

    level.add_door(Door::new("end_door"), w - 2, h / 2);
    level.add_exit("end_door", 1);

    // Top-right room, doors on its left wall.
    let (rx, ry) = (w - 6, 1);
    let room_doors = ["room_door_upper", "room_door", "room_door_lower"];
    for (i, id) in room_doors.iter().enumerate() {
        level.add_door(Door::new(*id), rx, ry + 2 + i as i32);
    }
    wall_row(level, ry, rx..rx + 6, &[]);
    wall_row(level, ry + 5, rx..rx + 6, &[]);
    wall_col(level, rx, ry..ry + 6, &[ry + 2, ry + 3, ry + 4]);
    wall_col(level, rx + 5, ry..ry + 6, &[]);

    // Two bottom rooms sharing a wall, doors in their top walls.
    let (lx, ly) = (1, h - 8);
    let left_doors = ["left_room_door_left", "left_room_door", "left_room_door_right"];
    let right_doors = ["right_room_door_left", "right_room_door", "right_room_door_right"];
    for (start, ids) in [(lx, left_doors), (lx + 6, right_doors)] {
        for (i, id) in ids.iter().enumerate() {
            level.add_door(Door::new(*id), start + 2 + i as i32, ly);
        }
        wall_row(level, ly, start..start + 6, &[start + 2, start + 3, start + 4]);
        wall_row(level, ly + 6, start..start + 6, &[]);
    }
    wall_col(level, lx, ly..ly + 7, &[]);
    wall_col(level, lx + 6, ly..ly + 7, &[]);
    wall_col(level, lx + 12, ly..ly + 7, &[]);

    let cd = cooldown(config);
    let plate = |action: Action, release: Action| {
        ButtonComponent::weighted(Some(action), Some(release)).with_cooldown(cd)
    };

    level.triggers.add_group(
        "left_room",
        MultiButtonAction::new(Some(doors_action(&left_doors, true)), true)
            .with_button("crimson1")
            .with_button("crimson2"),
    );
    level.triggers.add_group(
        "end",
        MultiButtonAction::new(Some(Action::OpenDoor("end_door".into())), true)
            .with_button("blue1")
            .with_button("blue2"),
    );

    let group_plates = [
        ("crimson1", "left_room", 3, 3, CRIMSON),
        ("crimson2", "left_room", rx + 1, ry + 1, CRIMSON),
        ("blue1", "end", rx + 4, ry + 1, BLUE),
        ("blue2", "end", lx + 3, ly + 3, BLUE),
    ];
    for (name, group, x, y, tint) in group_plates {
        level.add_button(
            name,
            x,
            y,
            plate(
                Action::set_button(group, name, true),
                Action::set_button(group, name, false),
            )
            .with_tint(tint),
        );
    }

    level.add_button(
        "right_room_plate",
        8,
        3,
        plate(doors_action(&right_doors, true), doors_action(&right_doors, false)),
    );
    level.add_button(
        "room_plate",
        w - 4,
        h - 4,
        plate(doors_action(&room_doors, true), doors_action(&room_doors, false)),
    );

    let full = CarryComponent::new(true, true).with_full_rewind_tracking(true);
    level.add_box(w / 2, h / 2, full.clone());
    level.add_box(lx + 9, ly + 3, full);

    level.set_spawn(2, h / 2);
}
