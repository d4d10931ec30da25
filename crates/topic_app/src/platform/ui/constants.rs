use std::time::Duration;

/// Render coalescing interval.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

pub const PROGRESS_BAR_WIDTH: usize = 20;
pub const RULE_WIDTH: usize = 72;

pub const HELP_LINES: [&str; 10] = [
    "screen <preprocess|modeling|visualization|settings>   switch screen",
    "input <slot> <path>                                  choose the input file",
    "set <slot> <field> <value>                           edit a form field",
    "config <key> <value>                                 change a setting",
    "submit <slot>                                        validate and start a job",
    "cancel <slot>                                        request cancellation",
    "show                                                 print the current screen",
    "help                                                 this list",
    "quit                                                 cancel running jobs and leave",
    "slots: preprocess (pre), modeling (model), visualization (viz)",
];
