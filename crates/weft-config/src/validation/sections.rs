//! Per-section validation.

use weft_common::Color;

use crate::schema::{ControlFlowMode, WeftConfig};

use super::helpers::{validate_non_empty, validate_range};

const MAX_WINDOW_EDGE: u64 = 16_384;

pub(crate) fn validate_event_loop(errors: &mut Vec<String>, config: &WeftConfig) {
    if config.event_loop.control_flow == ControlFlowMode::WaitUntil {
        validate_range(
            errors,
            "event_loop.wait_until_ms",
            config.event_loop.wait_until_ms,
            1,
            60_000,
        );
    }
}

pub(crate) fn validate_window(errors: &mut Vec<String>, config: &WeftConfig) {
    validate_range(
        errors,
        "window.width",
        config.window.width.into(),
        1,
        MAX_WINDOW_EDGE,
    );
    validate_range(
        errors,
        "window.height",
        config.window.height.into(),
        1,
        MAX_WINDOW_EDGE,
    );
}

pub(crate) fn validate_webview(errors: &mut Vec<String>, config: &WeftConfig) {
    validate_non_empty(errors, "webview.channel", &config.webview.channel);
    if let Some(ua) = &config.webview.user_agent {
        validate_non_empty(errors, "webview.user_agent", ua);
    }
}

pub(crate) fn validate_ipc(errors: &mut Vec<String>, config: &WeftConfig) {
    validate_range(
        errors,
        "ipc.max_pending_messages",
        config.ipc.max_pending_messages as u64,
        1,
        1_000_000,
    );
    validate_range(
        errors,
        "ipc.max_message_bytes",
        config.ipc.max_message_bytes as u64,
        1,
        256 * 1024 * 1024,
    );
}

pub(crate) fn validate_render(errors: &mut Vec<String>, config: &WeftConfig) {
    if Color::from_hex(&config.render.background_color).is_none() {
        errors.push(format!(
            "render.background_color = {:?} is not a #rrggbb or #rrggbbaa colour",
            config.render.background_color
        ));
    }
}
