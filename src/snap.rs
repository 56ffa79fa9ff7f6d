use crate::Position;
use serde::{Deserialize, Serialize};

/// Keyboard key as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Shift,
    Control,
    Alt,
    Meta,
    Other(String),
}

impl Key {
    /// Map a DOM-style key name (`"Shift"`, `"Control"`, ...) to a key
    pub fn from_name(name: &str) -> Self {
        match name {
            "Shift" => Key::Shift,
            "Control" => Key::Control,
            "Alt" => Key::Alt,
            "Meta" => Key::Meta,
            other => Key::Other(other.to_string()),
        }
    }
}

/// Round `value` to the nearest multiple of `grid`; halves round up
pub fn snap_to_grid(value: f64, grid: f64) -> f64 {
    (value / grid + 0.5).floor() * grid
}

/// Grid snapping for node drags, active while the modifier key is held
#[derive(Debug, Clone)]
pub struct GridSnap {
    grid_size: f64,
    modifier: Key,
    modifier_held: bool,
}

impl GridSnap {
    pub fn new(grid_size: f64, modifier: Key) -> Self {
        Self {
            grid_size,
            modifier,
            modifier_held: false,
        }
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    /// Observe a key press; keys other than the modifier are ignored
    pub fn key_down(&mut self, key: &Key) {
        if *key == self.modifier {
            self.modifier_held = true;
        }
    }

    /// Observe a key release
    pub fn key_up(&mut self, key: &Key) {
        if *key == self.modifier {
            self.modifier_held = false;
        }
    }

    pub fn is_active(&self) -> bool {
        self.modifier_held
    }

    /// Position to store for a drag update
    pub fn apply(&self, raw: Position) -> Position {
        if !self.modifier_held || self.grid_size <= 0.0 {
            return raw;
        }
        Position::new(
            snap_to_grid(raw.x, self.grid_size),
            snap_to_grid(raw.y, self.grid_size),
        )
    }
}
