/// Characters kept ahead of a located match.
const PREFIX_CHARS: usize = 60;
/// Characters kept past the end of a located match. Wider than the prefix on
/// purpose: the text after the match carries more context for the reader.
const SUFFIX_CHARS: usize = 100;
/// Length of the fallback lead excerpt when the query is not locatable.
const LEAD_CHARS: usize = 160;

const ELLIPSIS: &str = "...";

/// Builds a bounded excerpt of `body` centered on the first case-insensitive
/// occurrence of `query`. When the query cannot be located, falls back to a
/// lead excerpt. Ellipses mark every side the window was clamped on.
pub fn build_snippet(body: &str, query: &str) -> String {
	let chars: Vec<char> = body.chars().collect();
	let trimmed = query.trim();

	if !trimmed.is_empty()
		&& let Some(match_start) = locate(body, trimmed)
	{
		let query_len = trimmed.chars().count();
		let from = match_start.saturating_sub(PREFIX_CHARS);
		let to = (match_start + query_len + SUFFIX_CHARS).min(chars.len());
		let mut out = String::new();

		if from > 0 {
			out.push_str(ELLIPSIS);
		}

		out.extend(&chars[from.min(chars.len())..to]);

		if to < chars.len() {
			out.push_str(ELLIPSIS);
		}

		return out;
	}

	let mut out: String = chars.iter().take(LEAD_CHARS).collect();

	if chars.len() > LEAD_CHARS {
		out.push_str(ELLIPSIS);
	}

	out
}

/// Char offset of the first case-insensitive occurrence of `query` in `body`.
fn locate(body: &str, query: &str) -> Option<usize> {
	let lower_body = body.to_lowercase();
	let lower_query = query.to_lowercase();
	let byte_pos = lower_body.find(&lower_query)?;

	Some(lower_body[..byte_pos].chars().count())
}
