//! Input domain: synthetic mouse and keyboard events.

use serde::Serialize;

/// Mouse button for dispatched events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// No button.
    None,
    /// Left button.
    #[default]
    Left,
    /// Middle button.
    Middle,
    /// Right button.
    Right,
    /// Back button.
    Back,
    /// Forward button.
    Forward,
}

/// Mouse event type for Input.dispatchMouseEvent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseEventType {
    /// Button pressed.
    MousePressed,
    /// Button released.
    MouseReleased,
    /// Pointer moved.
    MouseMoved,
    /// Wheel scrolled.
    MouseWheel,
}

/// Parameters for Input.dispatchMouseEvent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchMouseEventParams {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: MouseEventType,
    /// X coordinate relative to the viewport (CSS pixels).
    pub x: f64,
    /// Y coordinate relative to the viewport (CSS pixels).
    pub y: f64,
    /// Button being pressed or released.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,
    /// Number of times the button was clicked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_count: Option<i32>,
    /// X delta for wheel events (CSS pixels).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_x: Option<f64>,
    /// Y delta for wheel events (CSS pixels).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_y: Option<f64>,
}

impl DispatchMouseEventParams {
    /// A mouse move to the given position.
    #[must_use]
    pub fn mouse_move(x: f64, y: f64) -> Self {
        Self {
            event_type: MouseEventType::MouseMoved,
            x,
            y,
            button: None,
            click_count: None,
            delta_x: None,
            delta_y: None,
        }
    }

    /// A button press at the given position.
    #[must_use]
    pub fn mouse_down(x: f64, y: f64, button: MouseButton, click_count: i32) -> Self {
        Self {
            event_type: MouseEventType::MousePressed,
            x,
            y,
            button: Some(button),
            click_count: Some(click_count),
            delta_x: None,
            delta_y: None,
        }
    }

    /// A button release at the given position.
    #[must_use]
    pub fn mouse_up(x: f64, y: f64, button: MouseButton, click_count: i32) -> Self {
        Self {
            event_type: MouseEventType::MouseReleased,
            x,
            y,
            button: Some(button),
            click_count: Some(click_count),
            delta_x: None,
            delta_y: None,
        }
    }

    /// A wheel scroll at the given position.
    #[must_use]
    pub fn wheel(x: f64, y: f64, delta_x: f64, delta_y: f64) -> Self {
        Self {
            event_type: MouseEventType::MouseWheel,
            x,
            y,
            button: None,
            click_count: None,
            delta_x: Some(delta_x),
            delta_y: Some(delta_y),
        }
    }
}

/// Key event type for Input.dispatchKeyEvent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyEventType {
    /// Key pressed.
    KeyDown,
    /// Key pressed, no character produced.
    RawKeyDown,
    /// Key released.
    KeyUp,
    /// Character generated.
    Char,
}

/// Parameters for Input.dispatchKeyEvent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchKeyEventParams {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: KeyEventType,
    /// DOM key value, e.g. "Enter", "a".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Physical key code, e.g. "Enter", "KeyA".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Text generated by the key, for Char events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Windows virtual key code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows_virtual_key_code: Option<i32>,
    /// Native virtual key code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_virtual_key_code: Option<i32>,
}

/// Parameters for Input.insertText.
#[derive(Debug, Clone, Serialize)]
pub struct InsertTextParams {
    /// Text to insert at the current selection.
    pub text: String,
}
