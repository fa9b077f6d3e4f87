/// Default config file content. Every value is commented out so the file
/// documents the defaults without pinning them.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# weft configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[event_loop]
# control_flow = "wait"           # poll, wait, wait_until
# wait_until_ms = 16              # 1-60000, used by wait_until
# exit_on_last_window_closed = true

[window]
# title = "weft"
# width = 800                     # 1-16384
# height = 600                    # 1-16384
# resizable = true
# decorated = true
# visible = true
# theme = "dark"                  # light, dark; unset follows the system

[webview]
# channel = "main"
# devtools = false
# transparent = false
# user_agent = "weft/0.1"

[ipc]
# max_pending_messages = 10000    # per handle and direction
# max_message_bytes = 10485760

[render]
# scale_mode = "fit"              # fit, fill, stretch, integer, none
# background_color = "#000000"

[logging]
# level = "info"                  # trace, debug, info, warn, error
"##
}
