/// Containers whose content is dropped along with the tags themselves.
const SKIPPED_CONTAINERS: [&str; 2] = ["style", "script"];

/// Reduces rich markup to plain, embeddable text: `<style>`/`<script>` blocks
/// are removed with their content, remaining tags are stripped, a handful of
/// common entities are decoded, and whitespace runs collapse to single spaces.
///
/// Total over arbitrary input. Malformed markup degrades to partial stripping.
pub fn strip_markup(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	let mut rest = input;

	while let Some(open) = rest.find('<') {
		out.push_str(&rest[..open]);
		// Tags separate words in rendered output, so they strip to a space.
		out.push(' ');

		let after = &rest[open + 1..];
		let container = SKIPPED_CONTAINERS
			.iter()
			.find_map(|name| skip_container(after, name));

		if let Some(remaining) = container {
			rest = remaining;

			continue;
		}

		match after.find('>') {
			Some(close) => rest = &after[close + 1..],
			// Unterminated tag. Drop the remainder.
			None => rest = "",
		}
	}

	out.push_str(rest);

	collapse_whitespace(&decode_entities(&out))
}

/// If `after` (the text just past a `<`) opens the named container, returns
/// the text past its closing tag. A missing closing tag swallows the rest.
fn skip_container<'a>(after: &'a str, name: &str) -> Option<&'a str> {
	if after.len() < name.len() || !after.as_bytes()[..name.len()].eq_ignore_ascii_case(name.as_bytes())
	{
		return None;
	}
	if !matches!(after[name.len()..].chars().next(), Some('>' | '/' | ' ' | '\t' | '\r' | '\n')) {
		return None;
	}

	let closing = format!("</{name}");
	let Some(close_start) = find_ignore_ascii_case(after, &closing) else {
		return Some("");
	};
	let past_closing = &after[close_start..];

	match past_closing.find('>') {
		Some(end) => Some(&past_closing[end + 1..]),
		None => Some(""),
	}
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
	let hay = haystack.as_bytes();
	let pat = needle.as_bytes();

	if pat.is_empty() || hay.len() < pat.len() {
		return None;
	}

	(0..=hay.len() - pat.len()).find(|&i| hay[i..i + pat.len()].eq_ignore_ascii_case(pat))
}

fn decode_entities(input: &str) -> String {
	input
		.replace("&nbsp;", " ")
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&amp;", "&")
}

fn collapse_whitespace(input: &str) -> String {
	input.split_whitespace().collect::<Vec<_>>().join(" ")
}
