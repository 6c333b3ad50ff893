// Keyboard bindings shared by every section.
use bevy::prelude::KeyCode;

pub const CONFIRM: KeyCode = KeyCode::KeyZ;
pub const CANCEL: KeyCode = KeyCode::KeyX;
/// Second judge button; only counts in rhythm battles.
pub const RHYTHM: KeyCode = KeyCode::Space;
pub const DEBUG_BATTLE: KeyCode = KeyCode::KeyC;
