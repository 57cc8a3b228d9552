/// Drop every non-ASCII character from `text`.
///
/// Characters are removed, never replaced, so already-ASCII input comes back
/// unchanged and applying this twice is the same as applying it once.
pub fn sanitize_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}
