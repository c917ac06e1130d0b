const BRAILLE_FRAMES: [char; crate::app::SPINNER_FRAME_COUNT] =
    ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Frame for a tick counter; any index is valid.
pub fn frame(idx: usize) -> char {
    BRAILLE_FRAMES[idx % BRAILLE_FRAMES.len()]
}
