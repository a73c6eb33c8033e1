//! User-facing reply texts.

use rand::seq::SliceRandom;

pub const START_GENERATION: &str = "Please wait, the image is being generated...";

pub const WAIT_TEXTS: [&str; 3] = [
    "Just a little longer...",
    "Almost there...",
    "One moment, please...",
];

pub const HELP: &str = "The bot asks the Kandinsky neural network to generate an image \
from your prompt. To enter a prompt use the /input command or the matching button on the \
keyboard.\nDifferent image styles are supported too. To choose a style use the /style \
command or the matching button on the keyboard.";

pub const BUTTON_STYLE: &str = "Choose image style";
pub const BUTTON_PROMPT: &str = "Enter prompt";
pub const BUTTON_HELP: &str = "Help";

pub const STOPPED: &str = "Stopped.";
pub const STYLE_SET: &str = "Style set.";
pub const INVALID_STYLE: &str = "Invalid style.";
pub const WRITE_PROMPT: &str = "Write a prompt.";
pub const CHOOSE_STYLE: &str = "Choose image style.";
pub const GREETING: &str = "Hello!";
pub const TIMEOUT: &str = "Maximum generation wait time exceeded.";
pub const GENERATION_FAILED: &str = "Failed to generate the image.";
pub const WRONG_PARAMETERS: &str = "The prompt must not be empty. Please try again.";
pub const INTERNAL_FAULT: &str = "The bot is misconfigured. Please contact the administrator.";
pub const STYLES_UNAVAILABLE: &str = "Could not load image styles. Please try again later.";

pub fn generating_with_style(style_title: &str) -> String {
    format!("Image is being generated with style {}.", style_title)
}

/// Progress text for poll attempt `attempt` (zero based).
pub fn wait_text(attempt: u32) -> &'static str {
    if attempt == 0 {
        return START_GENERATION;
    }
    WAIT_TEXTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(START_GENERATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_wait_text_announces_generation() {
        assert_eq!(wait_text(0), START_GENERATION);
    }

    #[test]
    fn test_later_wait_texts_come_from_pool() {
        for attempt in [1, 2, 5] {
            assert!(WAIT_TEXTS.contains(&wait_text(attempt)));
        }
    }

    #[test]
    fn test_help_is_descriptive() {
        assert!(HELP.len() > 100);
        assert!(HELP.contains("/input"));
        assert!(HELP.contains("/style"));
    }

    #[test]
    fn test_generating_with_style() {
        assert_eq!(
            generating_with_style("DEFAULT"),
            "Image is being generated with style DEFAULT."
        );
    }
}
