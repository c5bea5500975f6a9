//! Ships command handler for listing jump-capable hulls.

use evenav_lib::ship::{effective_range, MAX_SKILL_LEVEL};
use evenav_lib::JumpShipType;

/// Handle the ships subcommand.
pub fn handle_list_ships() {
    println!("Jump-capable ships ({}):", JumpShipType::ALL.len());
    println!(
        "{:<16} {:<13} {:>8} {:>10} {:>8} {:>12}",
        "Name", "Class", "Base LY", "Per Level", "Max LY", "Range at L5"
    );
    for ship in JumpShipType::ALL {
        let spec = ship.range_spec();
        println!(
            "{:<16} {:<13} {:>8.1} {:>10.1} {:>8.1} {:>12.1}",
            ship.name(),
            ship.hull_class().name(),
            spec.base_ly,
            spec.per_level_ly,
            spec.max_ly,
            effective_range(ship, i32::from(MAX_SKILL_LEVEL))
        );
    }
}
