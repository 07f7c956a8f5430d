//! Species display-name table.
//!
//! Maps the remote service's numeric species identifiers to names for log
//! output. Unknown identifiers are expected; callers fall back to the raw
//! number.

/// Species names, keyed by numeric identifier.
pub const SPECIES_NAMES: &[(u16, &str)] = &[
    (1, "Sproutling"),
    (2, "Sproutwood"),
    (3, "Sproutarbor"),
    (4, "Cinderpup"),
    (5, "Cinderhound"),
    (6, "Cinderwyrm"),
    (7, "Dewfin"),
    (8, "Tidefin"),
    (9, "Galefin"),
    (10, "Silkgrub"),
    (11, "Silkhusk"),
    (12, "Silkwing"),
    (13, "Thornlarva"),
    (14, "Thorncase"),
    (15, "Thorndrone"),
    (16, "Flitfinch"),
    (17, "Flitjay"),
    (18, "Flitraptor"),
    (19, "Scurrat"),
    (20, "Scurking"),
    (21, "Peckling"),
    (22, "Peckbeak"),
    (23, "Coilserp"),
    (24, "Coilking"),
    (25, "Sparkmouse"),
    (26, "Sparkrodent"),
    (27, "Duneball"),
    (28, "Dunespine"),
    (29, "Mossdoe"),
    (30, "Mossqueen"),
    (31, "Mossregent"),
    (32, "Barbbuck"),
    (33, "Barbstag"),
    (34, "Barbmonarch"),
    (35, "Glowpixie"),
    (36, "Glowsylph"),
    (37, "Emberfox"),
    (38, "Embervixen"),
    (39, "Puffball"),
    (40, "Puffdrift"),
];

/// Look up a species name by identifier.
pub fn species_name(id: u16) -> Option<&'static str> {
    SPECIES_NAMES
        .iter()
        .find(|(species, _)| *species == id)
        .map(|(_, name)| *name)
}
