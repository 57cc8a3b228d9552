use common::{Signal, SignalText};

/// Map model output to a direction.
///
/// Case-insensitive substring match. `"long"` is tested before `"short"`, so
/// text that mentions both is read as Long.
pub fn interpret(text: &SignalText) -> Signal {
    let lowered = text.as_str().to_lowercase();
    if lowered.contains("long") {
        Signal::Long
    } else if lowered.contains("short") {
        Signal::Short
    } else {
        Signal::Unclear
    }
}
