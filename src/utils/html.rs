use ammonia;

/// Sanitizes instructor-authored rich text (course descriptions, lesson bodies).
///
/// Whitelist based: formatting tags survive, `<script>`, `<iframe>` and event
/// handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
