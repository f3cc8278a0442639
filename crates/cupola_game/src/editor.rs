//! Level editor overlays: hint text and the dumps printed for copy-paste.
//!
//! Edits live only in memory. The printed text is what a designer pastes
//! back into the level file.

use crate::trigger::TriggerZone;
use crate::walls::WallRegistry;

pub fn wall_hint(walls: &WallRegistry) -> String {
    match (walls.selected(), walls.selected_wall()) {
        (Some(index), Some(wall)) => format!(
            "Sel {}/{}  x={:.3} z={:.3} w={:.3} h={:.3}",
            index + 1,
            walls.len(),
            wall.center_x,
            wall.center_z,
            wall.width,
            wall.height
        ),
        _ => "WALL EDITOR (F8 to exit)\n\
              N=new  Tab/Shift+Tab=select  Delete=remove\n\
              Arrows=move  [ ]=width  ; '=height  Enter=print WALLS"
            .to_string(),
    }
}

/// `WALLS = [ (x, z, w, h), ... ]` with three decimals per value.
pub fn walls_constant(walls: &WallRegistry) -> String {
    let items: Vec<String> = walls
        .walls()
        .iter()
        .map(|w| {
            format!(
                "({:.3}, {:.3}, {:.3}, {:.3})",
                w.center_x, w.center_z, w.width, w.height
            )
        })
        .collect();
    format!("WALLS = [\n    {}\n]", items.join(",\n    "))
}

pub fn bed_hint(trigger: &TriggerZone) -> String {
    format!(
        "BED EDITOR (F9 to exit)  |  Arrows=move  [ ]=width  ; '=height  |  B=print constants\n\
         center=({:.3}, {:.3})  size=({:.3}, {:.3})",
        trigger.center_x, trigger.center_z, trigger.width, trigger.height
    )
}

pub fn bed_constants(trigger: &TriggerZone) -> String {
    format!(
        "SLEEP_TRIGGER_CENTER = ({:.3}, {:.3})\nSLEEP_TRIGGER_SIZE   = ({:.3}, {:.3})",
        trigger.center_x, trigger.center_z, trigger.width, trigger.height
    )
}

pub fn player_position(x: f32, z: f32) -> String {
    format!("[POS] Player x={x:.3}, z={z:.3}")
}

pub fn nudge_bed(trigger: &mut TriggerZone, dx: f32, dz: f32) {
    trigger.set_center(trigger.center_x + dx, trigger.center_z + dz);
}

pub fn resize_bed(trigger: &mut TriggerZone, dw: f32, dh: f32) {
    trigger.set_size(trigger.width + dw, trigger.height + dh);
}
