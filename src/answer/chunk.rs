/// Size limits for one answer, in characters. `first` applies to the opening
/// message, `subsequent` to every message after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    pub first: usize,
    pub subsequent: usize,
}

impl Default for ChunkLimits {
    fn default() -> Self {
        Self {
            first: 500,
            subsequent: 1900,
        }
    }
}

/// Accumulates lines into chunks. The active limit is `first` until a chunk
/// has been emitted, then `subsequent` for the rest of the message.
struct ChunkBuilder {
    limits: ChunkLimits,
    chunks: Vec<String>,
    current: String,
    current_len: usize,
}

impl ChunkBuilder {
    fn new(limits: ChunkLimits) -> Self {
        Self {
            limits,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
        }
    }

    fn limit(&self) -> usize {
        if self.chunks.is_empty() {
            self.limits.first
        } else {
            self.limits.subsequent
        }
    }

    fn fits(&self, piece_len: usize) -> bool {
        self.current_len + piece_len + 1 <= self.limit()
    }

    fn push(&mut self, piece: &str, piece_len: usize, terminator: char) {
        self.current.push_str(piece);
        self.current.push(terminator);
        self.current_len += piece_len + 1;
    }

    fn flush(&mut self) {
        let chunk = self.current.trim_end();
        if !chunk.is_empty() {
            self.chunks.push(chunk.to_string());
        }
        self.current.clear();
        self.current_len = 0;
    }

    fn push_words(&mut self, line: &str) {
        for word in line.split(' ') {
            let word_len = char_len(word);
            if !self.fits(word_len) {
                self.flush();
            }
            self.push(word, word_len, ' ');
        }
        // the trailing space stands in for the line's newline
        if self.current.ends_with(' ') {
            self.current.pop();
            self.current.push('\n');
        }
    }

    fn finish(mut self, text: &str) -> Vec<String> {
        self.flush();
        if self.chunks.is_empty() {
            self.chunks.push(text.to_string());
        }
        self.chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` into Discord-sized chunks, keeping line and word boundaries.
///
/// Text that fits in `limits.first` comes back as a single chunk, untouched.
/// Otherwise lines are packed greedily; a line too long for the active limit
/// is broken on spaces. A single word longer than the limit is emitted as-is.
pub fn split_message(text: &str, limits: ChunkLimits) -> Vec<String> {
    if char_len(text) <= limits.first {
        return vec![text.to_string()];
    }

    let mut builder = ChunkBuilder::new(limits);
    for line in text.split('\n') {
        let line_len = char_len(line);
        if builder.fits(line_len) {
            builder.push(line, line_len, '\n');
        } else if line_len > builder.limit() {
            builder.push_words(line);
        } else {
            builder.flush();
            // the flush may have switched to a smaller limit
            if line_len > builder.limit() {
                builder.push_words(line);
            } else {
                builder.push(line, line_len, '\n');
            }
        }
    }

    builder.finish(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(first: usize, subsequent: usize) -> ChunkLimits {
        ChunkLimits { first, subsequent }
    }

    fn normalized(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let text = "  keep   this\nexactly as is \n";
        assert_eq!(split_message(text, ChunkLimits::default()), vec![text]);
    }

    #[test]
    fn test_text_at_first_limit_is_single_chunk() {
        let text = "a".repeat(500);
        assert_eq!(split_message(&text, ChunkLimits::default()), vec![text]);
    }

    #[test]
    fn test_long_answer_respects_limits() {
        let line = "- Apply early action where it is offered, it signals interest.";
        let text = std::iter::repeat(line)
            .take(50)
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.len() >= 3000);

        let chunks = split_message(&text, ChunkLimits::default());
        assert!(chunks.len() >= 2);
        assert!(chunks[0].chars().count() <= 500);
        for chunk in &chunks[1..] {
            assert!(chunk.chars().count() <= 1900);
        }
    }

    #[test]
    fn test_limit_switches_after_first_chunk() {
        let text = (0..12)
            .map(|i| format!("line {:02} xxxxxxxxxx", i))
            .collect::<Vec<_>>()
            .join("\n");

        let chunks = split_message(&text, limits(40, 100));
        assert_eq!(chunks[0], "line 00 xxxxxxxxxx\nline 01 xxxxxxxxxx");
        assert!(chunks[1].chars().count() > 40);
        assert!(chunks[1].chars().count() <= 100);
    }

    #[test]
    fn test_content_and_order_preserved() {
        let text = (0..200)
            .map(|i| format!("point {} about essays and deadlines", i))
            .collect::<Vec<_>>()
            .join("\n");

        let chunks = split_message(&text, ChunkLimits::default());
        assert_eq!(normalized(&chunks.join("\n")), normalized(&text));

        let rejoined_lines: Vec<&str> = chunks.iter().flat_map(|c| c.lines()).collect();
        let original_lines: Vec<&str> = text.lines().collect();
        assert_eq!(rejoined_lines, original_lines);
    }

    #[test]
    fn test_oversized_line_split_on_words() {
        let line = (0..60).map(|i| format!("w{:03}", i)).collect::<Vec<_>>().join(" ");
        let text = format!("intro\n{}\noutro", line);

        let chunks = split_message(&text, limits(50, 80));
        assert!(chunks.len() > 3);
        assert!(chunks[0].chars().count() <= 50);
        assert!(chunks[0].starts_with("intro\nw000"));
        for chunk in &chunks[1..] {
            assert!(chunk.chars().count() <= 80, "{:?}", chunk);
        }
        assert_eq!(normalized(&chunks.join(" ")), normalized(&text));
        assert!(chunks.last().unwrap().ends_with("outro"));
    }

    #[test]
    fn test_unsplittable_word_emitted_alone() {
        let url = format!("https://example.com/{}", "x".repeat(120));
        let text = format!("see\n{}\nthanks", url);

        let chunks = split_message(&text, limits(30, 60));
        assert!(chunks.contains(&url));
        for chunk in chunks.iter().filter(|c| **c != url) {
            assert!(chunk.chars().count() <= 60);
        }
    }

    #[test]
    fn test_line_exactly_at_limit() {
        let first = "a".repeat(10);
        let text = format!("{}\n{}", first, "b".repeat(10));

        let chunks = split_message(&text, limits(10, 10));
        assert_eq!(chunks, vec![first, "b".repeat(10)]);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let text = "é".repeat(30);
        let chunks = split_message(&text, limits(40, 40));
        assert_eq!(chunks, vec![text]);

        let multi = format!("{}\n{}", "ü".repeat(20), "ü".repeat(20));
        let chunks = split_message(&multi, limits(30, 30));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "ü".repeat(20));
    }

    #[test]
    fn test_blank_input_never_empty_sequence() {
        let text = "\n".repeat(30);
        let chunks = split_message(&text, limits(10, 10));
        assert_eq!(chunks, vec![text]);
    }

    #[test]
    fn test_smaller_subsequent_limit_splits_fitting_line() {
        let text = format!("{}\naaaa a aaaa  a", "b".repeat(25));

        let chunks = split_message(&text, limits(31, 4));
        assert_eq!(chunks[0], "b".repeat(25));
        for chunk in &chunks[1..] {
            assert!(chunk.chars().count() <= 4, "{:?}", chunk);
        }
        assert_eq!(normalized(&chunks.join(" ")), normalized(&text));
    }
}
