use crate::api::types::EntityId;
use crate::assets::registry::AssetCache;
use crate::components::button::ButtonKind;
use crate::components::entity::{Capability, Entity};
use crate::components::layer::RenderLayer;
use crate::components::player::Player;
use crate::core::level::Level;
use crate::renderer::instance::{flags, DrawInstance, DrawKind, Frame};

const PLAYER_RGB: [u8; 3] = [40, 160, 255];
const BLOCK_RGB: [u8; 3] = [50, 100, 150];
const BOX_RGB: [u8; 3] = [139, 69, 19];
const BOX_ACTIVE_RGB: [u8; 3] = [205, 133, 63];
const BUTTON_UP_RGB: [u8; 3] = [220, 0, 0];
const BUTTON_DOWN_RGB: [u8; 3] = [100, 0, 0];
const WEIGHTED_RGB: [u8; 3] = [150, 75, 0];
const WEIGHTED_ACTIVE_RGB: [u8; 3] = [200, 100, 0];
const DOOR_RGB: [u8; 3] = [139, 69, 19];

/// How one thing looks: logical sprite name plus the flat colour drawn when
/// that sprite is missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub kind: DrawKind,
    pub sprite: &'static str,
    pub rgba: [f32; 4],
    pub layer: RenderLayer,
    pub flags: u32,
}

fn rgb(c: [u8; 3]) -> [f32; 4] {
    rgba(c, 255)
}

fn rgba(c: [u8; 3], a: u8) -> [f32; 4] {
    [
        c[0] as f32 / 255.0,
        c[1] as f32 / 255.0,
        c[2] as f32 / 255.0,
        a as f32 / 255.0,
    ]
}

/// Brighten a tint for the pressed state.
fn lift(c: [u8; 3]) -> [u8; 3] {
    c.map(|v| v.saturating_add(40))
}

pub fn player_appearance(player: &Player) -> Appearance {
    let mut f = 0;
    if player.carried().is_some() {
        f |= flags::CARRIED;
    }
    Appearance {
        kind: DrawKind::Player,
        sprite: "player",
        rgba: rgb(PLAYER_RGB),
        layer: RenderLayer::Actors,
        flags: f,
    }
}

pub fn entity_appearance(entity: &Entity, level: &Level) -> Appearance {
    match &entity.capability {
        Capability::Static => Appearance {
            kind: DrawKind::Block,
            sprite: "block",
            rgba: rgb(BLOCK_RGB),
            layer: RenderLayer::Terrain,
            flags: 0,
        },
        Capability::Openable { door_id } => {
            let door = level.doors.get(door_id);
            let open = door.is_some_and(|d| d.is_open());
            let permanent = door.is_some_and(|d| d.is_permanently_open());
            let (sprite, color, f) = match (open, permanent) {
                (_, true) => (
                    "door_open",
                    rgba([255, 215, 0], 160),
                    flags::OPEN | flags::PERMANENT,
                ),
                (true, false) => ("door_open", rgba([0, 255, 0], 128), flags::OPEN),
                (false, _) => ("door", rgb(DOOR_RGB), 0),
            };
            Appearance {
                kind: DrawKind::Door,
                sprite,
                rgba: color,
                layer: RenderLayer::Terrain,
                flags: f,
            }
        }
        Capability::Triggerable(button) => {
            let pressed = button.is_pressed();
            let (kind, sprite, up, down) = match button.kind {
                ButtonKind::Pressable => (
                    DrawKind::Button,
                    "button",
                    BUTTON_UP_RGB,
                    BUTTON_DOWN_RGB,
                ),
                ButtonKind::Weighted => (
                    DrawKind::WeightedButton,
                    "weighted_button",
                    WEIGHTED_RGB,
                    WEIGHTED_ACTIVE_RGB,
                ),
            };
            let color = match (button.tint, pressed) {
                (Some(t), true) => lift(t),
                (Some(t), false) => t,
                (None, true) => down,
                (None, false) => up,
            };
            Appearance {
                kind,
                sprite,
                rgba: rgb(color),
                layer: RenderLayer::Objects,
                flags: if pressed { flags::PRESSED } else { 0 },
            }
        }
        Capability::Carryable(carry) => {
            let mut f = 0;
            if carry.is_carried() {
                f |= flags::CARRIED;
            }
            if carry.rewinding {
                f |= flags::REWINDING;
            }
            Appearance {
                kind: DrawKind::Box,
                sprite: "box",
                rgba: rgb(if carry.is_carried() { BOX_ACTIVE_RGB } else { BOX_RGB }),
                layer: RenderLayer::Boxes,
                flags: f,
            }
        }
    }
}

fn instance(
    pos: glam::Vec2,
    width: u32,
    height: u32,
    look: Appearance,
    extra_flags: u32,
    assets: &mut AssetCache,
) -> DrawInstance {
    let asset = assets
        .resolve(look.sprite)
        .map_or(-1.0, |h| h.0 as f32);
    DrawInstance {
        x: pos.x,
        y: pos.y,
        width: width as f32,
        height: height as f32,
        kind: look.kind as u8 as f32,
        flags: (look.flags | extra_flags) as f32,
        asset,
        r: look.rgba[0],
        g: look.rgba[1],
        b: look.rgba[2],
        a: look.rgba[3],
        layer: look.layer.as_u8() as f32,
    }
}

/// Fill `frame` with one instance per active entity plus the player, sorted
/// back-to-front by layer. `highlighted` entities get the HIGHLIGHT flag.
pub fn build_frame(
    frame: &mut Frame,
    player: &Player,
    level: &Level,
    highlighted: &[EntityId],
    assets: &mut AssetCache,
) {
    for entity in level.iter().filter(|e| e.active) {
        let look = entity_appearance(entity, level);
        let extra = if highlighted.contains(&entity.id) {
            flags::HIGHLIGHT
        } else {
            0
        };
        frame.push(instance(entity.pos, entity.width, entity.height, look, extra, assets));
    }
    frame.push(instance(
        player.pos,
        player.width,
        player.height,
        player_appearance(player),
        0,
        assets,
    ));
    frame
        .instances
        .sort_by(|a, b| a.layer.total_cmp(&b.layer));
}
