/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe inline tags (like <b>, <i>) survive, while <script>,
/// <iframe> and event-handler attributes are removed. Generated question text
/// goes through this before it is stored, since clients render it.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
